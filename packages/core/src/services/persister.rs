//! Persistence Gateway
//!
//! [`Persister`] is the single entry point for reading and mutating the
//! content tree. It owns the [`TreeIndex`] cache, consults the hierarchy
//! policy, runs hooks, commits change sets to the [`ContentStore`] and
//! broadcasts [`ContentEvent`]s.
//!
//! # Consistency
//!
//! Every mutation holds the index write lock from the first read of the
//! affected nodes until the index has been updated, and the index is only
//! touched after `ContentStore::commit` succeeded. Readers therefore never
//! observe a half-applied move, and a failed commit leaves the cache as it
//! was.
//!
//! Pre-save hooks run on a working copy of the node before any lock is
//! taken. A veto returns `SaveCancelled` and leaves the caller's node, the
//! store and the index untouched.
//!
//! # Sibling order
//!
//! Siblings are ordered by `(sort_order, id)` and renumbered densely
//! (`0..n`) within the affected sibling sets on every structural change.
//! Only rows whose position actually changed are written.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use zeus_core::db::MemoryStore;
//! use zeus_core::models::ContentNode;
//! use zeus_core::services::Persister;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let persister = Persister::new(Arc::new(MemoryStore::new()));
//!
//! let mut root = ContentNode::new("root", "", "Home");
//! let root_id = persister.save(&mut root).await?;
//!
//! let mut about = ContentNode::new("page", "about", "About");
//! persister.add_to(&mut about, root_id).await?;
//!
//! assert_eq!(persister.path(&about).await?, "/about");
//! assert_eq!(persister.resolve(&["about"]).await?.id, about.id);
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use super::error::ContentError;
use super::hooks::{ContentHook, HookRegistry};
use super::tree_index::{Lookup, TreeIndex};
use crate::config::ContentConfig;
use crate::db::{ChangeSet, ContentEvent, ContentStore, SortOrderCalculator, StoreError};
use crate::models::{AllowAnyChild, ContentNode, ContentTypeRegistry, HierarchyPolicy, NodeId};

/// Default capacity of the domain event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 128;

/// New sort orders for one sibling set
type SiblingUpdate = (NodeId, Vec<(NodeId, i32)>);

/// A commit that hit a vanished row means the caller held a stale node
fn stale_on_missing(error: StoreError) -> ContentError {
    match error {
        StoreError::MissingItem(id) => ContentError::stale_reference(id),
        other => ContentError::Store(other),
    }
}

fn sort_state(siblings: &[ContentNode], skip: NodeId) -> Vec<(NodeId, Option<i32>)> {
    siblings
        .iter()
        .filter(|s| s.id != skip)
        .map(|s| (s.id, s.sort_order))
        .collect()
}

/// Gateway between callers, the tree index and durable storage
#[derive(Clone)]
pub struct Persister {
    store: Arc<dyn ContentStore>,

    index: Arc<RwLock<TreeIndex>>,

    /// Consulted on every attach and move
    policy: Arc<dyn HierarchyPolicy>,

    /// Property validation for registered content types
    registry: Option<Arc<ContentTypeRegistry>>,

    hooks: HookRegistry,

    event_tx: broadcast::Sender<ContentEvent>,
}

impl Persister {
    /// Create a persister that accepts any placement and has no hooks
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self::with_event_capacity(store, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_event_capacity(store: Arc<dyn ContentStore>, capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            store,
            index: Arc::new(RwLock::new(TreeIndex::new())),
            policy: Arc::new(AllowAnyChild),
            registry: None,
            hooks: HookRegistry::new(),
            event_tx,
        }
    }

    /// Create a persister sized by `config.event_channel_capacity`
    pub fn from_config(store: Arc<dyn ContentStore>, config: &ContentConfig) -> Self {
        Self::with_event_capacity(store, config.event_channel_capacity)
    }

    /// Validate properties and restrict children using a type registry
    pub fn with_registry(mut self, registry: Arc<ContentTypeRegistry>) -> Self {
        self.policy = registry.clone();
        self.registry = Some(registry);
        self
    }

    /// Replace the hierarchy policy (after `with_registry`, if both are used)
    pub fn with_policy(mut self, policy: Arc<dyn HierarchyPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Append a hook; hooks run in registration order
    pub fn with_hook(mut self, hook: Arc<dyn ContentHook>) -> Self {
        self.hooks.register(hook);
        self
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn registry(&self) -> Option<&Arc<ContentTypeRegistry>> {
        self.registry.as_ref()
    }

    /// Subscribe to domain events emitted after each successful commit
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<ContentEvent> {
        self.event_tx.subscribe()
    }

    /// Ignores send errors; having no subscribers is normal
    fn emit_event(&self, event: ContentEvent) {
        tracing::debug!(event = event.event_type(), id = event.node_id(), "Emitting content event");
        let _ = self.event_tx.send(event);
    }

    fn reorder_events(&self, index: &TreeIndex, updates: &[SiblingUpdate]) -> Vec<ContentEvent> {
        updates
            .iter()
            .filter(|(_, orders)| !orders.is_empty())
            .map(|(parent_id, _)| ContentEvent::SiblingsReordered {
                parent_id: *parent_id,
                order: index.child_ids(*parent_id).unwrap_or_default().to_vec(),
            })
            .collect()
    }

    //
    // CACHE ACCESS (callers hold the index write lock)
    //

    async fn fetch(&self, index: &mut TreeIndex, id: NodeId) -> Result<ContentNode, ContentError> {
        if let Some(node) = index.get(id) {
            return Ok(node.clone());
        }
        match self.store.load_node(id).await? {
            Some(node) => {
                index.upsert(node.clone());
                Ok(node)
            }
            None => Err(ContentError::not_found(id)),
        }
    }

    /// Like `fetch`, for a node the caller already holds
    async fn fetch_persisted(
        &self,
        index: &mut TreeIndex,
        node: &ContentNode,
    ) -> Result<ContentNode, ContentError> {
        self.fetch(index, node.id).await.map_err(|e| match e {
            ContentError::NotFound { id } => ContentError::stale_reference(id),
            other => other,
        })
    }

    async fn ensure_root(&self, index: &mut TreeIndex) -> Result<ContentNode, ContentError> {
        if let Some(root) = index.root() {
            return Ok(root.clone());
        }
        match self.store.load_root().await? {
            Some(root) => {
                index.upsert(root.clone());
                Ok(root)
            }
            None => Err(ContentError::NoRoot),
        }
    }

    async fn load_children_into(
        &self,
        index: &mut TreeIndex,
        parent_id: NodeId,
    ) -> Result<Vec<ContentNode>, ContentError> {
        if !index.children_loaded(parent_id) {
            let children = self.store.load_children(parent_id).await?;
            index.load_children(parent_id, children);
        }
        Ok(index
            .children(parent_id)
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect())
    }

    /// Ancestors starting at `start`, nearest first
    async fn ancestors_in(
        &self,
        index: &mut TreeIndex,
        start: Option<NodeId>,
    ) -> Result<Vec<ContentNode>, ContentError> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::new();
        let mut next = start;

        while let Some(id) = next {
            if !seen.insert(id) {
                return Err(ContentError::invalid_hierarchy(format!(
                    "stored ancestry of node {} contains a cycle",
                    id
                )));
            }
            let node = self.fetch(index, id).await?;
            next = node.parent_id;
            ancestors.push(node);
        }

        Ok(ancestors)
    }

    /// Cycle and type restriction checks for placing `node` under `parent`
    async fn check_placement(
        &self,
        index: &mut TreeIndex,
        node: &ContentNode,
        parent: &ContentNode,
    ) -> Result<(), ContentError> {
        if !node.is_transient() {
            if parent.id == node.id {
                return Err(ContentError::invalid_hierarchy(format!(
                    "node {} cannot be its own parent",
                    node.id
                )));
            }
            let ancestors = self.ancestors_in(index, parent.parent_id).await?;
            if ancestors.iter().any(|a| a.id == node.id) {
                return Err(ContentError::invalid_hierarchy(format!(
                    "cannot move node {} under its descendant {}",
                    node.id, parent.id
                )));
            }
        }

        if !self.policy.allows_child(parent, node) {
            return Err(ContentError::invalid_hierarchy(format!(
                "type '{}' is not allowed under '{}' ({})",
                node.type_tag, parent.type_tag, parent.id
            )));
        }

        Ok(())
    }

    fn check_unique_name(
        siblings: &[ContentNode],
        node: &ContentNode,
        parent_id: NodeId,
    ) -> Result<(), ContentError> {
        match siblings
            .iter()
            .find(|s| s.id != node.id && s.name == node.name)
        {
            Some(existing) => Err(ContentError::invalid_hierarchy(format!(
                "node {} under {} is already named '{}'",
                existing.id, parent_id, node.name
            ))),
            None => Ok(()),
        }
    }

    //
    // READS
    //

    /// Load a node by id
    ///
    /// # Errors
    ///
    /// `NotFound` if no node has this id.
    pub async fn get(&self, id: NodeId) -> Result<ContentNode, ContentError> {
        if let Some(node) = self.index.read().await.get(id) {
            return Ok(node.clone());
        }
        let mut index = self.index.write().await;
        self.fetch(&mut index, id).await
    }

    /// The root node, or `NoRoot` for an empty tree
    pub async fn root(&self) -> Result<ContentNode, ContentError> {
        if let Some(root) = self.index.read().await.root() {
            return Ok(root.clone());
        }
        let mut index = self.index.write().await;
        self.ensure_root(&mut index).await
    }

    /// Direct children of `parent_id` ordered by `(sort_order, id)`
    ///
    /// Each call reflects the live child list at call time.
    pub async fn children(&self, parent_id: NodeId) -> Result<Vec<ContentNode>, ContentError> {
        if let Some(children) = self.index.read().await.children(parent_id) {
            return Ok(children.into_iter().cloned().collect());
        }
        let mut index = self.index.write().await;
        self.fetch(&mut index, parent_id).await?;
        self.load_children_into(&mut index, parent_id).await
    }

    /// Exact, case-sensitive lookup of a direct child by name
    pub async fn get_child(
        &self,
        parent_id: NodeId,
        name: &str,
    ) -> Result<Option<ContentNode>, ContentError> {
        {
            let index = self.index.read().await;
            if index.children_loaded(parent_id) {
                return Ok(index.child(parent_id, name).cloned());
            }
        }
        let mut index = self.index.write().await;
        self.fetch(&mut index, parent_id).await?;
        self.load_children_into(&mut index, parent_id).await?;
        Ok(index.child(parent_id, name).cloned())
    }

    /// Ancestors of `node`, nearest first, ending at the root
    ///
    /// # Errors
    ///
    /// `StaleReference` if `node` is persisted but no longer stored.
    pub async fn ancestors(&self, node: &ContentNode) -> Result<Vec<ContentNode>, ContentError> {
        let mut index = self.index.write().await;
        if !node.is_transient() {
            self.fetch_persisted(&mut index, node).await?;
        }
        self.ancestors_in(&mut index, node.parent_id).await
    }

    /// Root-relative path of `node`, computed from its ancestor chain
    ///
    /// The root's path is empty; every other node's path is its parent's
    /// path followed by `/` and its name. A transient node without a parent
    /// is not in the tree yet and its path is its bare name.
    pub async fn path(&self, node: &ContentNode) -> Result<String, ContentError> {
        if node.is_transient() && node.parent_id.is_none() {
            return Ok(node.name.clone());
        }
        let ancestors = self.ancestors(node).await?;
        if node.is_root() {
            return Ok(String::new());
        }

        let mut path = String::new();
        for ancestor in ancestors.iter().rev().skip(1) {
            path.push('/');
            path.push_str(&ancestor.name);
        }
        path.push('/');
        path.push_str(&node.name);
        Ok(path)
    }

    /// Resolve path segments from the root through the tree index
    ///
    /// Child lists missing from the index are loaded from storage once
    /// before a segment is declared missing.
    ///
    /// # Errors
    ///
    /// `PathNotFound` when a segment has no match, `NoRoot` for an empty tree.
    pub async fn resolve<S>(&self, segments: &[S]) -> Result<ContentNode, ContentError>
    where
        S: AsRef<str> + Sync,
    {
        loop {
            let pending = {
                let index = self.index.read().await;
                match index.resolve(segments) {
                    Lookup::Found(node) => return Ok(node.clone()),
                    Lookup::Missing => {
                        let path: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
                        return Err(ContentError::path_not_found(format!("/{}", path.join("/"))));
                    }
                    Lookup::RootUnloaded => None,
                    Lookup::Unloaded { parent_id } => Some(parent_id),
                }
            };

            let mut index = self.index.write().await;
            match pending {
                None => {
                    self.ensure_root(&mut index).await?;
                }
                Some(parent_id) => {
                    self.load_children_into(&mut index, parent_id).await?;
                }
            }
        }
    }

    /// Number of items in durable storage
    pub async fn count(&self) -> Result<u64, ContentError> {
        Ok(self.store.count().await?)
    }

    /// Number of nodes currently cached by the tree index
    pub async fn cached_count(&self) -> usize {
        self.index.read().await.len()
    }

    /// Drop every cached entry, e.g. after writes that bypassed the persister
    pub async fn invalidate(&self) {
        self.index.write().await.invalidate();
    }

    //
    // MUTATIONS
    //

    /// Attach `node` under `parent_id` and persist it
    ///
    /// A transient node is inserted after the parent's existing children,
    /// or at its explicit `sort_order`. A persisted node moving to another
    /// parent goes after that parent's children. Either way the node is
    /// saved, so `resolve(path(node))` finds it as soon as this returns.
    /// On error `node` is left as it was.
    ///
    /// # Errors
    ///
    /// Everything [`save`](Self::save) returns, in particular:
    ///
    /// - `NotFound` if the parent does not exist
    /// - `StaleReference` if `node` is persisted but no longer stored
    /// - `InvalidHierarchy` on a cycle or when the policy rejects the child
    pub async fn add_to(
        &self,
        node: &mut ContentNode,
        parent_id: NodeId,
    ) -> Result<NodeId, ContentError> {
        let mut attached = node.clone();
        if attached.parent_id != Some(parent_id) {
            attached.parent_id = Some(parent_id);
            if !attached.is_transient() {
                attached.sort_order = None;
            }
        }

        self.save(&mut attached).await?;
        *node = attached;
        Ok(node.id)
    }

    /// Persist `node`, assigning an id when it is transient
    ///
    /// Sets `updated` (and `created` on first save), runs pre-save hooks,
    /// validates, checks sibling-name uniqueness and the hierarchy, then
    /// commits the node together with the renumbered sibling set. On
    /// success `node` is replaced by the saved state and post-save hooks run.
    ///
    /// For an inserted or reparented node `sort_order` is taken as the
    /// 0-based position among its new siblings (clamped); `None` appends.
    /// A node staying under its parent keeps its stored position whatever
    /// `sort_order` it carries; use
    /// [`update_sort_order`](Self::update_sort_order) to reposition it.
    ///
    /// # Errors
    ///
    /// - `SaveCancelled` if a hook vetoed; nothing was changed
    /// - `Validation` for invalid fields or properties
    /// - `InvalidHierarchy` for duplicate names, cycles, rejected types or a
    ///   second root
    /// - `StaleReference` if a persisted node no longer exists
    pub async fn save(&self, node: &mut ContentNode) -> Result<NodeId, ContentError> {
        let mut working = node.clone();
        let now = Utc::now();
        if working.is_transient() {
            working.created = now;
        }
        working.updated = now;

        self.hooks.run_saving(&mut working)?;

        working.validate()?;
        if let Some(registry) = &self.registry {
            registry.validate(&working)?;
        }

        let mut index = self.index.write().await;

        let previous = if working.is_transient() {
            None
        } else {
            Some(self.fetch_persisted(&mut index, &working).await?)
        };
        let created = previous.is_none();
        let old_parent_id = previous.as_ref().and_then(|p| p.parent_id);
        let reparented = created || old_parent_id != working.parent_id;
        let retyped = previous
            .as_ref()
            .is_some_and(|p| p.type_tag != working.type_tag);

        let mut updates: Vec<SiblingUpdate> = Vec::new();

        match working.parent_id {
            None => {
                match self.ensure_root(&mut index).await {
                    Ok(root) if root.id != working.id => {
                        return Err(ContentError::invalid_hierarchy(format!(
                            "the tree already has root node {}",
                            root.id
                        )));
                    }
                    Ok(_) | Err(ContentError::NoRoot) => {}
                    Err(e) => return Err(e),
                }
                working.sort_order = Some(working.sort_order.unwrap_or(0));
            }
            Some(parent_id) => {
                let parent = self.fetch(&mut index, parent_id).await?;
                if reparented || retyped {
                    self.check_placement(&mut index, &working, &parent).await?;
                }

                let siblings = self.load_children_into(&mut index, parent_id).await?;
                Self::check_unique_name(&siblings, &working, parent_id)?;

                let mut ordered = sort_state(&siblings, working.id);
                let position = if reparented {
                    working
                        .sort_order
                        .map(|order| usize::try_from(order).unwrap_or(0))
                        .unwrap_or(ordered.len())
                } else {
                    siblings
                        .iter()
                        .position(|s| s.id == working.id)
                        .unwrap_or(ordered.len())
                }
                .min(ordered.len());
                ordered.insert(position, (working.id, working.sort_order));
                working.sort_order = Some(SortOrderCalculator::append_position(position));

                let changed = SortOrderCalculator::changed_positions(&ordered)
                    .into_iter()
                    .filter(|&(id, _)| id != working.id)
                    .collect();
                updates.push((parent_id, changed));
            }
        }

        if !created && reparented {
            if let Some(old_parent_id) = old_parent_id {
                let old_siblings = self.load_children_into(&mut index, old_parent_id).await?;
                let remaining = sort_state(&old_siblings, working.id);
                updates.push((
                    old_parent_id,
                    SortOrderCalculator::changed_positions(&remaining),
                ));
            }
        }

        let mut changes = ChangeSet::new();
        if created {
            changes.insert(working.clone());
        } else {
            changes.update(working.clone());
        }
        for (_, orders) in &updates {
            for &(id, sort_order) in orders {
                changes.reorder(id, sort_order);
            }
        }

        let assigned = self.store.commit(changes).await.map_err(stale_on_missing)?;
        if created {
            working.id = *assigned
                .first()
                .ok_or_else(|| StoreError::constraint("store assigned no id to inserted item"))?;
        }
        working.details.mark_clean();

        for (parent_id, orders) in &updates {
            index.set_sort_orders(*parent_id, orders);
        }
        index.upsert(working.clone());
        let reorder_events = self.reorder_events(&index, &updates);
        drop(index);

        *node = working;
        tracing::info!(id = node.id, name = %node.name, created, "Saved content node");
        self.hooks.run_saved(node);

        if created {
            self.emit_event(ContentEvent::NodeCreated(node.clone()));
        } else {
            self.emit_event(ContentEvent::NodeUpdated(node.clone()));
            if reparented {
                if let Some(new_parent_id) = node.parent_id {
                    self.emit_event(ContentEvent::NodeMoved {
                        id: node.id,
                        old_parent_id,
                        new_parent_id,
                    });
                }
            }
        }
        for event in reorder_events {
            self.emit_event(event);
        }

        Ok(node.id)
    }

    /// Delete a node with its whole subtree and everything they own
    ///
    /// Versions of deleted nodes keep existing with `version_of_id` cleared.
    /// Remaining siblings are renumbered. Returns every removed id, sorted.
    ///
    /// # Errors
    ///
    /// `NotFound` if the node does not exist.
    pub async fn delete(&self, id: NodeId) -> Result<Vec<NodeId>, ContentError> {
        let node = self.get(id).await?;
        self.hooks.run_deleting(&node);

        let mut index = self.index.write().await;
        let node = self.fetch_persisted(&mut index, &node).await?;

        let mut removed = vec![id];
        let mut seen = HashSet::from([id]);
        let mut frontier = vec![id];
        while let Some(current) = frontier.pop() {
            for child in self.load_children_into(&mut index, current).await? {
                if seen.insert(child.id) {
                    removed.push(child.id);
                    frontier.push(child.id);
                }
            }
        }
        removed.sort_unstable();

        let mut changes = ChangeSet::new();
        changes.delete(id);

        let mut updates: Vec<SiblingUpdate> = Vec::new();
        if let Some(parent_id) = node.parent_id {
            let siblings = self.load_children_into(&mut index, parent_id).await?;
            let changed = SortOrderCalculator::changed_positions(&sort_state(&siblings, id));
            for &(sibling, sort_order) in &changed {
                changes.reorder(sibling, sort_order);
            }
            updates.push((parent_id, changed));
        }

        self.store.commit(changes).await.map_err(stale_on_missing)?;

        index.remove_subtree(id);
        for (parent_id, orders) in &updates {
            index.set_sort_orders(*parent_id, orders);
        }
        let reorder_events = self.reorder_events(&index, &updates);
        drop(index);

        tracing::info!(id, removed = removed.len(), "Deleted content subtree");
        self.hooks.run_deleted(&node);

        self.emit_event(ContentEvent::NodeDeleted {
            id,
            removed: removed.clone(),
        });
        for event in reorder_events {
            self.emit_event(event);
        }

        Ok(removed)
    }

    /// Move a node under `new_parent_id`, after its existing children
    ///
    /// Both the old and the new sibling sets are renumbered. Returns the
    /// moved node.
    ///
    /// # Errors
    ///
    /// - `NotFound` if either node does not exist
    /// - `InvalidHierarchy` when moving the root, moving a node under
    ///   itself or a descendant, on a name clash, or when the policy rejects
    ///   the placement; the tree is unchanged
    pub async fn move_to(&self, id: NodeId, new_parent_id: NodeId) -> Result<ContentNode, ContentError> {
        let mut index = self.index.write().await;

        let mut node = self.fetch(&mut index, id).await?;
        let parent = self.fetch(&mut index, new_parent_id).await?;

        let Some(old_parent_id) = node.parent_id else {
            return Err(ContentError::invalid_hierarchy("the root node cannot be moved"));
        };
        self.check_placement(&mut index, &node, &parent).await?;

        let new_siblings = self.load_children_into(&mut index, new_parent_id).await?;
        Self::check_unique_name(&new_siblings, &node, new_parent_id)?;

        let others = sort_state(&new_siblings, id);
        let position = SortOrderCalculator::append_position(others.len());
        let mut updates: Vec<SiblingUpdate> = vec![(
            new_parent_id,
            SortOrderCalculator::changed_positions(&others),
        )];

        if old_parent_id != new_parent_id {
            let old_siblings = self.load_children_into(&mut index, old_parent_id).await?;
            updates.push((
                old_parent_id,
                SortOrderCalculator::changed_positions(&sort_state(&old_siblings, id)),
            ));
        }

        let mut changes = ChangeSet::new();
        changes.reparent(id, new_parent_id, position);
        for (_, orders) in &updates {
            for &(sibling, sort_order) in orders {
                changes.reorder(sibling, sort_order);
            }
        }

        self.store.commit(changes).await.map_err(stale_on_missing)?;

        node.parent_id = Some(new_parent_id);
        node.sort_order = Some(position);
        for (parent_id, orders) in &updates {
            index.set_sort_orders(*parent_id, orders);
        }
        index.upsert(node.clone());
        let reorder_events = self.reorder_events(&index, &updates);
        drop(index);

        tracing::info!(id, old_parent_id, new_parent_id, "Moved content node");
        self.emit_event(ContentEvent::NodeMoved {
            id,
            old_parent_id: Some(old_parent_id),
            new_parent_id,
        });
        for event in reorder_events {
            self.emit_event(event);
        }

        Ok(node)
    }

    /// Place a node at 0-based `position` among its siblings
    ///
    /// The position is clamped to the last index; all other siblings keep
    /// their relative order. A root node has no siblings and is left as is.
    pub async fn update_sort_order(&self, id: NodeId, position: usize) -> Result<(), ContentError> {
        let mut index = self.index.write().await;

        let node = self.fetch(&mut index, id).await?;
        let Some(parent_id) = node.parent_id else {
            return Ok(());
        };

        let siblings = self.load_children_into(&mut index, parent_id).await?;
        let current: HashMap<NodeId, Option<i32>> =
            siblings.iter().map(|s| (s.id, s.sort_order)).collect();
        let ids: Vec<NodeId> = siblings.iter().map(|s| s.id).collect();
        let position = SortOrderCalculator::clamp_position(position, ids.len());

        let order = SortOrderCalculator::move_to_position(&ids, id, position);
        let state: Vec<(NodeId, Option<i32>)> = order
            .iter()
            .map(|sibling| (*sibling, current.get(sibling).copied().flatten()))
            .collect();
        let changed = SortOrderCalculator::changed_positions(&state);
        if changed.is_empty() {
            return Ok(());
        }

        let mut changes = ChangeSet::new();
        for &(sibling, sort_order) in &changed {
            changes.reorder(sibling, sort_order);
        }
        self.store.commit(changes).await.map_err(stale_on_missing)?;

        index.set_sort_orders(parent_id, &changed);
        drop(index);

        tracing::info!(id, parent_id, position, "Updated sort order");
        self.emit_event(ContentEvent::SiblingsReordered { parent_id, order });
        Ok(())
    }
}

impl std::fmt::Debug for Persister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persister")
            .field("hooks", &self.hooks)
            .field("registry", &self.registry.is_some())
            .finish_non_exhaustive()
    }
}
