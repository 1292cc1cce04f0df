//! Tree Index
//!
//! In-process cache over the persisted tree that answers "which child of
//! `parent` is called `name`" without a storage round trip per path segment.
//!
//! # Architecture
//!
//! - `nodes`: every cached node by id
//! - `children`: ordered child ids per parent; presence of an entry means
//!   that parent's child list was loaded completely
//! - `segments`: `(parent, name) -> id`, derived from `children` and only
//!   present for loaded parents, so a miss there is authoritative
//!
//! The index is a plain data structure. Lazy loading from storage and
//! locking are done by the persister, which holds the index behind a
//! single `tokio::sync::RwLock` and applies updates only after a storage
//! commit has succeeded.

use std::collections::{HashMap, HashSet};

use crate::models::{ContentNode, NodeId};

/// Outcome of resolving path segments against cached state
#[derive(Debug, PartialEq)]
pub enum Lookup<'a> {
    /// Every segment matched
    Found(&'a ContentNode),
    /// Children of `parent_id` must be loaded before resolution can continue
    Unloaded { parent_id: NodeId },
    /// The root node is not cached yet
    RootUnloaded,
    /// A segment has no matching child
    Missing,
}

#[derive(Debug, Default)]
pub struct TreeIndex {
    nodes: HashMap<NodeId, ContentNode>,
    children: HashMap<NodeId, Vec<NodeId>>,
    segments: HashMap<NodeId, HashMap<String, NodeId>>,
    root_id: Option<NodeId>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&ContentNode> {
        self.nodes.get(&id)
    }

    pub fn root(&self) -> Option<&ContentNode> {
        self.root_id.and_then(|id| self.nodes.get(&id))
    }

    pub fn children_loaded(&self, parent_id: NodeId) -> bool {
        self.children.contains_key(&parent_id)
    }

    /// Ordered children of a loaded parent
    pub fn children(&self, parent_id: NodeId) -> Option<Vec<&ContentNode>> {
        self.children
            .get(&parent_id)
            .map(|ids| ids.iter().filter_map(|id| self.nodes.get(id)).collect())
    }

    pub fn child_ids(&self, parent_id: NodeId) -> Option<&[NodeId]> {
        self.children.get(&parent_id).map(Vec::as_slice)
    }

    /// Exact, case-sensitive child lookup; `None` also when not loaded
    pub fn child(&self, parent_id: NodeId, name: &str) -> Option<&ContentNode> {
        self.segments
            .get(&parent_id)?
            .get(name)
            .and_then(|id| self.nodes.get(id))
    }

    /// Number of cached nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Walk `segments` from the root using cached state only
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Lookup<'_> {
        let Some(mut current) = self.root() else {
            return Lookup::RootUnloaded;
        };

        for segment in segments {
            let Some(names) = self.segments.get(&current.id) else {
                return Lookup::Unloaded {
                    parent_id: current.id,
                };
            };
            match names.get(segment.as_ref()).and_then(|id| self.nodes.get(id)) {
                Some(child) => current = child,
                None => return Lookup::Missing,
            }
        }

        Lookup::Found(current)
    }

    /// Record the complete, freshly loaded child list of `parent_id`
    pub fn load_children(&mut self, parent_id: NodeId, children: Vec<ContentNode>) {
        tracing::debug!(parent_id, count = children.len(), "Caching child list");

        let ids = children.iter().map(|c| c.id).collect();
        for child in children {
            self.nodes.insert(child.id, child);
        }
        self.children.insert(parent_id, ids);
        self.sort_children(parent_id);
    }

    /// Insert or replace a node, keeping parent child lists consistent
    pub fn upsert(&mut self, node: ContentNode) {
        let id = node.id;
        let new_parent = node.parent_id;
        let old_parent = self.nodes.insert(id, node).and_then(|old| old.parent_id);

        if old_parent != new_parent {
            if let Some(old_parent) = old_parent {
                self.detach(old_parent, id);
            }
        }

        match new_parent {
            Some(parent_id) => {
                if let Some(ids) = self.children.get_mut(&parent_id) {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                    self.sort_children(parent_id);
                }
            }
            None => {
                if self.root_id.is_some_and(|root| root != id) {
                    tracing::warn!(
                        root_id = ?self.root_id,
                        id,
                        "Second parentless node cached; replacing root"
                    );
                }
                self.root_id = Some(id);
            }
        }
    }

    /// Apply new sort orders to cached siblings under `parent_id`
    pub fn set_sort_orders(&mut self, parent_id: NodeId, orders: &[(NodeId, i32)]) {
        for &(id, sort_order) in orders {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.sort_order = Some(sort_order);
            }
        }
        if self.children.contains_key(&parent_id) {
            self.sort_children(parent_id);
        }
    }

    /// Drop a node and every cached descendant
    ///
    /// Cached nodes whose `version_of_id` pointed into the removed subtree
    /// have that reference cleared. Returns the removed ids, sorted.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<NodeId> {
        let parent_id = self.nodes.get(&id).and_then(|n| n.parent_id);

        let mut doomed = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for node in self.nodes.values() {
                if node.parent_id.is_some_and(|p| doomed.contains(&p)) {
                    doomed.insert(node.id);
                }
            }
            for (parent, ids) in &self.children {
                if doomed.contains(parent) {
                    doomed.extend(ids.iter().copied());
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        for doomed_id in &doomed {
            self.nodes.remove(doomed_id);
            self.children.remove(doomed_id);
            self.segments.remove(doomed_id);
        }
        if let Some(parent_id) = parent_id {
            self.detach(parent_id, id);
        }
        if self.root_id.is_some_and(|root| doomed.contains(&root)) {
            self.root_id = None;
        }

        for node in self.nodes.values_mut() {
            if node.version_of_id.is_some_and(|v| doomed.contains(&v)) {
                node.version_of_id = None;
            }
        }

        let mut removed: Vec<NodeId> = doomed.into_iter().collect();
        removed.sort_unstable();
        removed
    }

    /// Forget everything; state is repopulated lazily
    pub fn invalidate(&mut self) {
        tracing::debug!(cached = self.nodes.len(), "Invalidating tree index");
        self.nodes.clear();
        self.children.clear();
        self.segments.clear();
        self.root_id = None;
    }

    fn detach(&mut self, parent_id: NodeId, id: NodeId) {
        if let Some(ids) = self.children.get_mut(&parent_id) {
            ids.retain(|&child| child != id);
            self.rebuild_segments(parent_id);
        }
    }

    fn sort_children(&mut self, parent_id: NodeId) {
        let Some(mut ids) = self.children.remove(&parent_id) else {
            return;
        };
        ids.retain(|id| self.nodes.contains_key(id));
        ids.sort_by_key(|id| self.nodes[id].sibling_key());
        self.children.insert(parent_id, ids);
        self.rebuild_segments(parent_id);
    }

    fn rebuild_segments(&mut self, parent_id: NodeId) {
        let Some(ids) = self.children.get(&parent_id) else {
            return;
        };

        let mut names: HashMap<String, NodeId> = HashMap::with_capacity(ids.len());
        for id in ids {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            // First by sort order wins
            if let Some(&kept) = names.get(&node.name) {
                tracing::warn!(
                    parent_id,
                    name = %node.name,
                    kept,
                    ignored = node.id,
                    "Duplicate sibling name in content tree"
                );
                continue;
            }
            names.insert(node.name.clone(), node.id);
        }
        self.segments.insert(parent_id, names);
    }
}
