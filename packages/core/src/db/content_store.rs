//! ContentStore Trait - Storage Abstraction Layer
//!
//! The persistence gateway talks to durable storage only through
//! [`ContentStore`]. Backends load nodes (with their details, collections
//! and authorized roles) and apply [`ChangeSet`]s atomically.
//!
//! # Design Decisions
//!
//! 1. **Async-first**: every method is async so embedded (libsql) and
//!    in-memory backends share one contract
//! 2. **Atomic change sets**: a save, move or delete is expressed as one
//!    `ChangeSet`; the backend applies all of it or none of it
//! 3. **Structural cascade**: deleting an item removes its descendants and
//!    everything they own, and clears `version_of_id` references to them
//!
//! # Examples
//!
//! ```rust
//! use zeus_core::db::{ChangeSet, ContentStore, MemoryStore};
//! use zeus_core::models::ContentNode;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//!
//! let mut changes = ChangeSet::new();
//! changes.insert(ContentNode::new("root", "", "Home"));
//! let ids = store.commit(changes).await?;
//!
//! let root = store.load_root().await?.expect("root was inserted");
//! assert_eq!(root.id, ids[0]);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use super::error::StoreError;
use crate::models::{ContentNode, NodeId};

/// A single storage mutation
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOperation {
    /// Insert a transient node; the backend assigns its id
    Insert(ContentNode),

    /// Rewrite a persisted node including details, collections and roles
    Update(ContentNode),

    /// Change only the sibling position of a node
    Reorder { id: NodeId, sort_order: i32 },

    /// Attach a node under a new parent at the given position
    Reparent {
        id: NodeId,
        parent_id: NodeId,
        sort_order: i32,
    },

    /// Delete a node and its whole subtree
    Delete(NodeId),
}

/// Ordered list of operations committed as one unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    operations: Vec<StoreOperation>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: ContentNode) -> &mut Self {
        self.operations.push(StoreOperation::Insert(node));
        self
    }

    pub fn update(&mut self, node: ContentNode) -> &mut Self {
        self.operations.push(StoreOperation::Update(node));
        self
    }

    pub fn reorder(&mut self, id: NodeId, sort_order: i32) -> &mut Self {
        self.operations
            .push(StoreOperation::Reorder { id, sort_order });
        self
    }

    pub fn reparent(&mut self, id: NodeId, parent_id: NodeId, sort_order: i32) -> &mut Self {
        self.operations.push(StoreOperation::Reparent {
            id,
            parent_id,
            sort_order,
        });
        self
    }

    pub fn delete(&mut self, id: NodeId) -> &mut Self {
        self.operations.push(StoreOperation::Delete(id));
        self
    }

    pub fn operations(&self) -> &[StoreOperation] {
        &self.operations
    }

    pub fn into_operations(self) -> Vec<StoreOperation> {
        self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Durable storage for the content tree
///
/// Implementations must be `Send + Sync`; the persister shares one store
/// across request handlers behind an `Arc`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Load one node with its details, collections and roles
    async fn load_node(&self, id: NodeId) -> Result<Option<ContentNode>, StoreError>;

    /// Load the node without a parent, if the tree has one
    async fn load_root(&self) -> Result<Option<ContentNode>, StoreError>;

    /// Load the direct children of `parent_id` ordered by `(sort_order, id)`
    async fn load_children(&self, parent_id: NodeId) -> Result<Vec<ContentNode>, StoreError>;

    /// Apply every operation of `changes` atomically
    ///
    /// Returns the ids assigned to `Insert` operations, in order.
    ///
    /// # Errors
    ///
    /// On any failure nothing is applied and the error is returned.
    async fn commit(&self, changes: ChangeSet) -> Result<Vec<NodeId>, StoreError>;

    /// Number of items held by the store
    async fn count(&self) -> Result<u64, StoreError>;
}
