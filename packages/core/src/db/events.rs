//! Domain Events for the content tree
//!
//! The persister emits a [`ContentEvent`] on a `tokio::sync::broadcast`
//! channel after each successful commit, so caches, search indexers and
//! similar collaborators can follow structural changes without coupling to
//! the storage layer.
//!
//! # Event Flow
//!
//! 1. The persister commits a change set to the store
//! 2. The tree index is updated
//! 3. A domain event is broadcast to all subscribers
//!
//! Events are informational. Cancelable notifications (pre-save vetoes) go
//! through `services::ContentHook` instead.

use serde::Serialize;

use crate::models::{ContentNode, NodeId};

/// Domain events emitted by the persister
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentEvent {
    /// A transient node was saved for the first time
    NodeCreated(ContentNode),

    /// A persisted node was saved
    NodeUpdated(ContentNode),

    /// A node was attached under a different parent
    #[serde(rename_all = "camelCase")]
    NodeMoved {
        id: NodeId,
        old_parent_id: Option<NodeId>,
        new_parent_id: NodeId,
    },

    /// A node and its subtree were deleted; `removed` lists every id gone
    #[serde(rename_all = "camelCase")]
    NodeDeleted { id: NodeId, removed: Vec<NodeId> },

    /// The child order under `parent_id` changed
    #[serde(rename_all = "camelCase")]
    SiblingsReordered { parent_id: NodeId, order: Vec<NodeId> },
}

impl ContentEvent {
    /// String form of the event type, for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            ContentEvent::NodeCreated(_) => "node:created",
            ContentEvent::NodeUpdated(_) => "node:updated",
            ContentEvent::NodeMoved { .. } => "node:moved",
            ContentEvent::NodeDeleted { .. } => "node:deleted",
            ContentEvent::SiblingsReordered { .. } => "siblings:reordered",
        }
    }

    /// Id of the node the event is about
    pub fn node_id(&self) -> NodeId {
        match self {
            ContentEvent::NodeCreated(node) | ContentEvent::NodeUpdated(node) => node.id,
            ContentEvent::NodeMoved { id, .. } | ContentEvent::NodeDeleted { id, .. } => *id,
            ContentEvent::SiblingsReordered { parent_id, .. } => *parent_id,
        }
    }
}
