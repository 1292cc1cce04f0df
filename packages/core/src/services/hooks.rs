//! Save and delete hooks
//!
//! Hooks are the in-process collaborators that react to persistence: a blog
//! module categorising posts before they are saved, a search indexer
//! reacting after. They run synchronously in registration order.
//!
//! Only `on_saving` can veto. A veto aborts the save before anything is
//! written, and the caller receives `ContentError::SaveCancelled`.

use std::sync::Arc;

use super::error::ContentError;
use crate::models::ContentNode;

/// Result of a pre-save hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    Continue,
    Cancel(String),
}

/// Observer of node persistence
///
/// All methods have no-op defaults; implement the ones you need. Hooks must
/// not call back into the persister from `on_saving` or `on_deleting`.
pub trait ContentHook: Send + Sync {
    /// Name used in logs and in `SaveCancelled` errors
    fn name(&self) -> &str;

    /// Called with the node about to be saved; may adjust it or veto
    fn on_saving(&self, _node: &mut ContentNode) -> HookDecision {
        HookDecision::Continue
    }

    fn on_saved(&self, _node: &ContentNode) {}

    fn on_deleting(&self, _node: &ContentNode) {}

    fn on_deleted(&self, _node: &ContentNode) {}
}

/// Ordered list of hooks invoked by the persister
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<Arc<dyn ContentHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, hook: Arc<dyn ContentHook>) {
        tracing::debug!(hook = hook.name(), "Registered content hook");
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run pre-save hooks in order, stopping at the first veto
    pub fn run_saving(&self, node: &mut ContentNode) -> Result<(), ContentError> {
        for hook in &self.hooks {
            if let HookDecision::Cancel(reason) = hook.on_saving(node) {
                tracing::warn!(
                    hook = hook.name(),
                    node_id = node.id,
                    name = %node.name,
                    "Save cancelled: {}",
                    reason
                );
                return Err(ContentError::save_cancelled(hook.name(), reason));
            }
        }
        Ok(())
    }

    pub fn run_saved(&self, node: &ContentNode) {
        for hook in &self.hooks {
            hook.on_saved(node);
        }
    }

    pub fn run_deleting(&self, node: &ContentNode) {
        for hook in &self.hooks {
            hook.on_deleting(node);
        }
    }

    pub fn run_deleted(&self, node: &ContentNode) {
        for hook in &self.hooks {
            hook.on_deleted(node);
        }
    }
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.name()))
            .finish()
    }
}
