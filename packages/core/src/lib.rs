//! Zeus Content Tree
//!
//! This crate provides the content core of the Zeus CMS: a hierarchical tree
//! of typed content nodes with dynamic properties, addressed by id and by
//! URL path, persisted through a gateway that keeps an in-process index
//! consistent with durable storage.
//!
//! # Architecture
//!
//! - **Details**: type-specific data lives in a per-node detail store, not
//!   in columns
//! - **Tree Index**: path lookups are served from a lazily filled cache that
//!   is only updated after a storage commit succeeds
//! - **libsql**: embedded SQLite-compatible storage using a four-table shape
//!   (items, detail collections, details, authorized roles)
//!
//! # Modules
//!
//! - [`models`] - Data structures (ContentNode, DetailStore, ContentType)
//! - [`services`] - Persister, tree index, path resolver, navigation
//! - [`db`] - Storage contract with in-memory and libsql backends
//! - [`config`] - JSON-loadable settings
//! - [`logging`] - `tracing` subscriber setup

pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::ContentConfig;
pub use models::*;
pub use services::*;
