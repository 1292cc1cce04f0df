//! Content Services
//!
//! This module contains the content tree's runtime behaviour:
//!
//! - `Persister` - load/save/delete/move with hooks, events and the tree index
//! - `TreeIndex` - cached `(parent, name) -> node` lookups and child order
//! - `PathResolver` - URL to node mapping with page-not-found handlers
//! - `navigation` - breadcrumbs, menu pages and branch checks
//! - `RequestContext` - per-request current node and acting user
//!
//! Services coordinate between the storage layer and callers; every
//! mutation goes through the persister so the index never drifts from
//! durable state.

pub mod context;
pub mod error;
pub mod hooks;
pub mod navigation;
pub mod path_resolver;
pub mod persister;
pub mod tree_index;

#[cfg(test)]
mod tree_index_test;

pub use context::RequestContext;
pub use error::ContentError;
pub use hooks::{ContentHook, HookDecision, HookRegistry};
pub use navigation::ChildFilter;
pub use path_resolver::{
    NotFoundPageHandler, PageNotFoundEvent, PageNotFoundHandler, PathResolver,
};
pub use persister::{Persister, DEFAULT_EVENT_CHANNEL_CAPACITY};
pub use tree_index::{Lookup, TreeIndex};
