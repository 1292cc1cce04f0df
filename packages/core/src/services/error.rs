//! Service Layer Error Types
//!
//! Errors returned by the persister, tree index and path resolver. Storage
//! failures and validation failures are wrapped rather than flattened so
//! callers can still match on the underlying cause.

use crate::db::StoreError;
use crate::models::{NodeId, ValidationError};
use thiserror::Error;

/// Content service errors
#[derive(Error, Debug)]
pub enum ContentError {
    /// No node with this id exists
    #[error("Node not found: {id}")]
    NotFound { id: NodeId },

    /// No node is addressed by this path
    #[error("No node at path '{path}'")]
    PathNotFound { path: String },

    /// The tree has no root yet
    #[error("Content tree has no root node")]
    NoRoot,

    /// Cycle, type restriction, duplicate sibling name or root violation
    #[error("Invalid hierarchy: {reason}")]
    InvalidHierarchy { reason: String },

    /// A persisted node was deleted through another path
    #[error("Node {id} no longer exists in the store")]
    StaleReference { id: NodeId },

    /// A pre-save hook vetoed the save
    #[error("Save cancelled by hook '{hook}': {reason}")]
    SaveCancelled { hook: String, reason: String },

    /// Path resolution failed and no fallback was supplied
    #[error("Could not resolve '{url}'")]
    ResolutionFailed { url: String },

    /// Node or property validation failed
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Storage operation failed
    #[error("Storage operation failed: {0}")]
    Store(#[from] StoreError),
}

impl ContentError {
    pub fn not_found(id: NodeId) -> Self {
        Self::NotFound { id }
    }

    pub fn path_not_found(path: impl Into<String>) -> Self {
        Self::PathNotFound { path: path.into() }
    }

    pub fn invalid_hierarchy(reason: impl Into<String>) -> Self {
        Self::InvalidHierarchy {
            reason: reason.into(),
        }
    }

    pub fn stale_reference(id: NodeId) -> Self {
        Self::StaleReference { id }
    }

    pub fn save_cancelled(hook: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SaveCancelled {
            hook: hook.into(),
            reason: reason.into(),
        }
    }

    pub fn resolution_failed(url: impl Into<String>) -> Self {
        Self::ResolutionFailed { url: url.into() }
    }

    /// Whether the error means "nothing there" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::PathNotFound { .. } | Self::NoRoot
        )
    }
}
