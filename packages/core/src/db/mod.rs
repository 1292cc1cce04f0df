//! Storage Layer
//!
//! Durable storage for the content tree behind the [`ContentStore`] trait:
//!
//! - [`MemoryStore`]: non-durable map-backed store (tests, embedding hosts)
//! - [`LibsqlStore`]: embedded libsql/SQLite store using the four-table
//!   relational shape (`items`, `detail_collections`, `authorized_roles`,
//!   `details`), behind the default `libsql` feature
//!
//! Mutations are expressed as [`ChangeSet`]s and applied atomically.
//! [`ContentEvent`]s describe committed changes to subscribers.

mod content_store;
mod error;
pub mod events;
#[cfg(feature = "libsql")]
mod libsql_store;
mod memory_store;
pub mod sort_order;

pub use content_store::{ChangeSet, ContentStore, StoreOperation};
pub use error::StoreError;
pub use events::ContentEvent;
#[cfg(feature = "libsql")]
pub use libsql_store::LibsqlStore;
pub use memory_store::MemoryStore;
pub use sort_order::SortOrderCalculator;
