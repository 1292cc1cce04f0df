//! Data Models
//!
//! This module contains the core data structures of the content tree:
//!
//! - `ContentNode` - Universal node model for all content types
//! - `DetailStore` / `DetailCollection` / `Detail` - typed dynamic properties
//! - `ContentType` / `ContentTypeRegistry` - capability-tagged type descriptors
//!
//! Structure (parent links, sort order, names) lives on the node itself;
//! everything type-specific lives in its detail store.

mod content_type;
mod detail;
mod detail_store;
mod node;

#[cfg(test)]
mod content_type_test;
#[cfg(test)]
mod node_test;

pub use content_type::{
    AllowAnyChild, Capability, ContentType, ContentTypeRegistry, HierarchyPolicy,
    PropertyDefinition,
};
pub use detail::{Detail, DetailKind, DetailType, DetailValue, NodeLink};
pub use detail_store::{DetailCollection, DetailStore, PersistPolicy};
pub use node::{
    ContentNode, NodeId, ValidationError, MAX_NAME_LENGTH, MAX_ZONE_NAME_LENGTH, TRANSIENT_ID,
};
