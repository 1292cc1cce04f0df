//! Storage Error Types
//!
//! Backend failures surfaced by [`ContentStore`](super::ContentStore)
//! implementations. Service-level conditions (not found, hierarchy
//! violations, vetoed saves) live in `services::ContentError`.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::NodeId;

/// Storage operation errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file
    #[cfg(feature = "libsql")]
    #[error("Failed to connect to database at {path}: {source}")]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// Failed to create tables or apply pragmas
    #[error("Failed to initialize database schema: {0}")]
    InitializationFailed(String),

    /// Failed to create the database's parent directory
    #[error("Failed to create parent directory for {path}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// libsql operation error
    #[cfg(feature = "libsql")]
    #[error("Database operation failed: {0}")]
    LibsqlError(#[from] libsql::Error),

    /// SQL execution error with context
    #[error("SQL execution failed: {context}")]
    SqlExecutionError { context: String },

    /// A persisted row could not be turned back into a node
    #[error("Failed to decode row for item {id}: {reason}")]
    RowDecode { id: NodeId, reason: String },

    /// A change set referenced an item the store does not hold
    #[error("Item {0} does not exist in the store")]
    MissingItem(NodeId),

    /// A change set would violate a storage constraint
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// In-memory state is unusable after a panic while it was locked
    #[error("Failed to acquire store lock")]
    LockPoisoned,
}

impl StoreError {
    #[cfg(feature = "libsql")]
    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    pub fn initialization_failed(msg: impl Into<String>) -> Self {
        Self::InitializationFailed(msg.into())
    }

    pub fn sql_execution(context: impl Into<String>) -> Self {
        Self::SqlExecutionError {
            context: context.into(),
        }
    }

    pub fn row_decode(id: NodeId, reason: impl Into<String>) -> Self {
        Self::RowDecode {
            id,
            reason: reason.into(),
        }
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }
}
