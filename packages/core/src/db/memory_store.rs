//! In-memory ContentStore
//!
//! Keeps every item in a mutex-guarded map. A commit applies its change set
//! to a copy of the state and swaps the copy in only when every operation
//! succeeded, which gives the same all-or-nothing behaviour as a SQL
//! transaction. Used by tests and by hosts that do not need durability.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use super::content_store::{ChangeSet, ContentStore, StoreOperation};
use super::error::StoreError;
use crate::models::{ContentNode, NodeId};

#[derive(Debug, Clone)]
struct MemoryState {
    items: BTreeMap<NodeId, ContentNode>,
    next_id: NodeId,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl MemoryState {
    fn require(&self, id: NodeId) -> Result<(), StoreError> {
        if self.items.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::MissingItem(id))
        }
    }

    fn require_parent(&self, parent_id: Option<NodeId>) -> Result<(), StoreError> {
        match parent_id {
            Some(parent_id) => self.require(parent_id),
            None => Ok(()),
        }
    }

    fn apply(&mut self, operation: StoreOperation) -> Result<Option<NodeId>, StoreError> {
        match operation {
            StoreOperation::Insert(mut node) => {
                if !node.is_transient() {
                    return Err(StoreError::constraint(format!(
                        "cannot insert item {} that already has an id",
                        node.id
                    )));
                }
                self.require_parent(node.parent_id)?;

                let id = self.next_id;
                self.next_id += 1;
                node.id = id;
                node.details.mark_clean();
                self.items.insert(id, node);
                Ok(Some(id))
            }
            StoreOperation::Update(mut node) => {
                self.require(node.id)?;
                self.require_parent(node.parent_id)?;
                if node.parent_id == Some(node.id) {
                    return Err(StoreError::constraint(format!(
                        "item {} cannot be its own parent",
                        node.id
                    )));
                }
                node.details.mark_clean();
                self.items.insert(node.id, node);
                Ok(None)
            }
            StoreOperation::Reorder { id, sort_order } => {
                let node = self
                    .items
                    .get_mut(&id)
                    .ok_or(StoreError::MissingItem(id))?;
                node.sort_order = Some(sort_order);
                Ok(None)
            }
            StoreOperation::Reparent {
                id,
                parent_id,
                sort_order,
            } => {
                self.require(parent_id)?;
                let node = self
                    .items
                    .get_mut(&id)
                    .ok_or(StoreError::MissingItem(id))?;
                node.parent_id = Some(parent_id);
                node.sort_order = Some(sort_order);
                Ok(None)
            }
            StoreOperation::Delete(id) => {
                self.require(id)?;
                let doomed = self.subtree(id);
                for doomed_id in &doomed {
                    self.items.remove(doomed_id);
                }
                // Versions outlive their master
                for node in self.items.values_mut() {
                    if node.version_of_id.is_some_and(|v| doomed.contains(&v)) {
                        node.version_of_id = None;
                    }
                }
                Ok(None)
            }
        }
    }

    fn subtree(&self, id: NodeId) -> HashSet<NodeId> {
        let mut doomed = HashSet::from([id]);
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for node in self.items.values() {
                if node.parent_id == Some(current) && doomed.insert(node.id) {
                    frontier.push(node.id);
                }
            }
        }
        doomed
    }
}

/// Non-durable [`ContentStore`] backed by a `BTreeMap`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> Result<T, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;
        Ok(f(&state))
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn load_node(&self, id: NodeId) -> Result<Option<ContentNode>, StoreError> {
        self.with_state(|state| state.items.get(&id).cloned())
    }

    async fn load_root(&self) -> Result<Option<ContentNode>, StoreError> {
        self.with_state(|state| {
            state
                .items
                .values()
                .find(|node| node.parent_id.is_none())
                .cloned()
        })
    }

    async fn load_children(&self, parent_id: NodeId) -> Result<Vec<ContentNode>, StoreError> {
        self.with_state(|state| {
            let mut children: Vec<ContentNode> = state
                .items
                .values()
                .filter(|node| node.parent_id == Some(parent_id))
                .cloned()
                .collect();
            children.sort_by_key(ContentNode::sibling_key);
            children
        })
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Vec<NodeId>, StoreError> {
        let mut state = self.state.lock().map_err(|_| StoreError::LockPoisoned)?;

        let mut working = state.clone();
        let mut assigned = Vec::new();
        for operation in changes.into_operations() {
            if let Some(id) = working.apply(operation)? {
                assigned.push(id);
            }
        }

        *state = working;
        Ok(assigned)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.with_state(|state| state.items.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn child(parent_id: NodeId, name: &str, sort_order: i32) -> ContentNode {
        let mut node = ContentNode::new("page", name, name);
        node.parent_id = Some(parent_id);
        node.sort_order = Some(sort_order);
        node
    }

    #[test]
    fn test_commit_is_all_or_nothing() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let mut changes = ChangeSet::new();
            changes.insert(ContentNode::new("root", "", "Home"));
            assert_eq!(store.commit(changes).await.unwrap(), vec![1]);

            let mut changes = ChangeSet::new();
            changes.insert(child(1, "a", 0)).reorder(42, 0);
            let err = store.commit(changes).await.unwrap_err();

            assert!(matches!(err, StoreError::MissingItem(42)));
            assert_eq!(store.count().await.unwrap(), 1);

            // Ids consumed by the failed commit are not burned
            let mut changes = ChangeSet::new();
            changes.insert(child(1, "a", 0));
            assert_eq!(store.commit(changes).await.unwrap(), vec![2]);
        });
    }

    #[test]
    fn test_insert_rejects_unknown_parent_and_persisted_nodes() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();

            let mut changes = ChangeSet::new();
            changes.insert(child(7, "orphan", 0));
            assert!(matches!(
                store.commit(changes).await.unwrap_err(),
                StoreError::MissingItem(7)
            ));

            let mut persisted = ContentNode::new("root", "", "Home");
            persisted.id = 3;
            let mut changes = ChangeSet::new();
            changes.insert(persisted);
            assert!(matches!(
                store.commit(changes).await.unwrap_err(),
                StoreError::Constraint(_)
            ));
        });
    }

    #[test]
    fn test_delete_removes_subtree_and_clears_versions() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let mut changes = ChangeSet::new();
            changes
                .insert(ContentNode::new("root", "", "Home"))
                .insert(child(1, "a", 0))
                .insert(child(2, "b", 0));
            let mut version = child(1, "a-v1", 1);
            version.version_of_id = Some(2);
            changes.insert(version);
            assert_eq!(store.commit(changes).await.unwrap(), vec![1, 2, 3, 4]);

            let mut changes = ChangeSet::new();
            changes.delete(2);
            store.commit(changes).await.unwrap();

            assert!(store.load_node(2).await.unwrap().is_none());
            assert!(store.load_node(3).await.unwrap().is_none());
            let version = store.load_node(4).await.unwrap().unwrap();
            assert_eq!(version.version_of_id, None);
            assert_eq!(store.count().await.unwrap(), 2);
        });
    }

    #[test]
    fn test_children_sorted_by_sort_order_then_id() {
        tokio_test::block_on(async {
            let store = MemoryStore::new();
            let mut changes = ChangeSet::new();
            changes
                .insert(ContentNode::new("root", "", "Home"))
                .insert(child(1, "c", 2))
                .insert(child(1, "b", 1))
                .insert(child(1, "a", 1));
            store.commit(changes).await.unwrap();

            let ids: Vec<NodeId> = store
                .load_children(1)
                .await
                .unwrap()
                .iter()
                .map(|n| n.id)
                .collect();
            assert_eq!(ids, vec![3, 4, 2]);
            assert_eq!(store.load_root().await.unwrap().map(|r| r.id), Some(1));
        });
    }
}
