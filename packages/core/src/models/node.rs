//! Content Node Data Structures
//!
//! This module defines [`ContentNode`], the single struct that represents every
//! item in the content tree (pages, posts, containers, widgets...).
//!
//! # Architecture
//!
//! - **Universal node**: one struct for all content types, discriminated by `type_tag`
//! - **Structural fields**: name (URL segment), sort order, visibility, timestamps
//! - **Dynamic properties**: everything type-specific lives in the [`DetailStore`]
//! - **Parent link only**: child lists are owned by the tree index and storage,
//!   never duplicated inside the node
//!
//! # Examples
//!
//! ```rust
//! use zeus_core::models::ContentNode;
//!
//! let mut page = ContentNode::new("page", "about", "About Us");
//! page.details.set("Text", "<p>Hello</p>");
//!
//! assert!(page.is_transient());
//! assert_eq!(page.details.get("Text", String::new()), "<p>Hello</p>");
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::detail_store::DetailStore;

/// Primary key of a persisted content node (0 = transient)
pub type NodeId = i64;

/// Id carried by nodes that have not been persisted yet
pub const TRANSIENT_ID: NodeId = 0;

/// Maximum length of `name` and `title`
pub const MAX_NAME_LENGTH: usize = 250;

/// Maximum length of `zone_name`
pub const MAX_ZONE_NAME_LENGTH: usize = 50;

/// Characters that would break path addressing if used in a node name
const RESERVED_NAME_CHARS: [char; 3] = ['/', '?', '#'];

/// Validation errors for content nodes and their properties
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid node name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Field '{field}' exceeds maximum length of {max} characters")]
    TooLong { field: String, max: usize },

    #[error("Unknown content type: {0}")]
    UnknownType(String),

    #[error("Property '{property}' expects {expected}, got {actual}")]
    PropertyKind {
        property: String,
        expected: String,
        actual: String,
    },

    #[error("Property '{property}' is not declared by type '{type_tag}'")]
    UndeclaredProperty { property: String, type_tag: String },

    #[error("Node {0} cannot be its own parent")]
    SelfParent(NodeId),
}

/// A node in the hierarchical content tree
///
/// # Fields
///
/// - `id`: primary key, `0` while transient
/// - `type_tag`: content type discriminator (e.g. "page", "blog-post")
/// - `name`: URL path segment, unique among siblings
/// - `title`: display string
/// - `parent_id`: `None` only for the root node
/// - `sort_order`: sibling position (ties broken by id)
/// - `version_of_id`: weak reference to the master when this node is a version
/// - `zone_name`: rendering zone under the parent (widget-like nodes)
/// - `authorized_roles`: role names allowed to read the node (empty = everyone)
/// - `details`: typed dynamic properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentNode {
    pub id: NodeId,

    pub type_tag: String,

    pub name: String,

    pub title: String,

    pub parent_id: Option<NodeId>,

    /// Position among siblings; `None` until the node is placed under a parent
    #[serde(default)]
    pub sort_order: Option<i32>,

    pub visible: bool,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,

    pub published: Option<DateTime<Utc>>,

    pub expires: Option<DateTime<Utc>>,

    pub version_of_id: Option<NodeId>,

    pub zone_name: Option<String>,

    pub saved_by: Option<String>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorized_roles: Vec<String>,

    #[serde(default)]
    pub details: DetailStore,
}

impl ContentNode {
    /// Create a transient node of the given type
    ///
    /// The node is visible, has no parent and is not yet placed among
    /// siblings. `created`/`updated` are set to now and refreshed on save.
    pub fn new(type_tag: impl Into<String>, name: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TRANSIENT_ID,
            type_tag: type_tag.into(),
            name: name.into(),
            title: title.into(),
            parent_id: None,
            sort_order: None,
            visible: true,
            created: now,
            updated: now,
            published: None,
            expires: None,
            version_of_id: None,
            zone_name: None,
            saved_by: None,
            authorized_roles: Vec::new(),
            details: DetailStore::new(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.id == TRANSIENT_ID
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Sort key among siblings: `(sort_order, id)`
    ///
    /// Unplaced nodes sort last. Transient nodes sort after persisted ones
    /// with the same sort order.
    pub fn sibling_key(&self) -> (i32, NodeId) {
        let id = if self.is_transient() { NodeId::MAX } else { self.id };
        (self.sort_order.unwrap_or(i32::MAX), id)
    }

    /// Whether the node is published at `now` and not yet expired
    pub fn is_published_at(&self, now: DateTime<Utc>) -> bool {
        let published = self.published.is_some_and(|p| p <= now);
        let expired = self.expires.is_some_and(|e| e <= now);
        published && !expired
    }

    /// Whether a principal holding `roles` may read this node
    pub fn is_authorized(&self, roles: &[&str]) -> bool {
        self.authorized_roles.is_empty()
            || self
                .authorized_roles
                .iter()
                .any(|r| roles.contains(&r.as_str()))
    }

    /// Validate structural fields
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `type_tag` is empty
    /// - a non-root node has an empty name
    /// - the name contains `/`, `?` or `#`
    /// - `name`, `title` or `zone_name` exceed their column widths
    /// - the node names itself as parent
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.type_tag.is_empty() {
            return Err(ValidationError::MissingField("type_tag".to_string()));
        }

        if self.parent_id.is_some() && self.name.is_empty() {
            return Err(ValidationError::MissingField("name".to_string()));
        }

        if let Some(c) = self.name.chars().find(|c| RESERVED_NAME_CHARS.contains(c)) {
            return Err(ValidationError::InvalidName {
                name: self.name.clone(),
                reason: format!("contains reserved character '{}'", c),
            });
        }

        if self.name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "name".to_string(),
                max: MAX_NAME_LENGTH,
            });
        }

        if self.title.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "title".to_string(),
                max: MAX_NAME_LENGTH,
            });
        }

        if let Some(zone) = &self.zone_name {
            if zone.chars().count() > MAX_ZONE_NAME_LENGTH {
                return Err(ValidationError::TooLong {
                    field: "zone_name".to_string(),
                    max: MAX_ZONE_NAME_LENGTH,
                });
            }
        }

        if !self.is_transient() && self.parent_id == Some(self.id) {
            return Err(ValidationError::SelfParent(self.id));
        }

        Ok(())
    }
}
