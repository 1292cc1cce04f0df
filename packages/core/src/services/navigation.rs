//! Navigation helpers over the content tree
//!
//! Menus, breadcrumb trails and "current branch" highlighting all reduce to
//! ancestor walks and filtered child lists; these functions provide them on
//! top of [`Persister`].

use chrono::{DateTime, Utc};

use super::error::ContentError;
use super::persister::Persister;
use crate::models::{Capability, ContentNode, NodeId};

/// Predicate applied to child lists
#[derive(Debug, Clone, PartialEq)]
pub enum ChildFilter {
    /// `visible` is set
    Visible,
    /// The node's type is a page; every node counts when no registry is set
    Pages,
    /// Published and not expired at the given instant
    PublishedAt(DateTime<Utc>),
    /// Readable by a principal holding these roles
    AuthorizedFor(Vec<String>),
}

impl ChildFilter {
    fn accepts(&self, persister: &Persister, node: &ContentNode) -> bool {
        match self {
            ChildFilter::Visible => node.visible,
            ChildFilter::Pages => is_page(persister, node),
            ChildFilter::PublishedAt(now) => node.is_published_at(*now),
            ChildFilter::AuthorizedFor(roles) => {
                let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                node.is_authorized(&roles)
            }
        }
    }
}

fn is_page(persister: &Persister, node: &ContentNode) -> bool {
    persister
        .registry()
        .map_or(true, |registry| registry.node_has(node, Capability::Page))
}

/// Children of `parent_id` that pass every filter, in sibling order
pub async fn filtered_children(
    persister: &Persister,
    parent_id: NodeId,
    filters: &[ChildFilter],
) -> Result<Vec<ContentNode>, ContentError> {
    let children = persister.children(parent_id).await?;
    Ok(children
        .into_iter()
        .filter(|child| filters.iter().all(|f| f.accepts(persister, child)))
        .collect())
}

/// Pages shown in a menu under `parent_id`: visible, published pages
pub async fn navigation_pages(
    persister: &Persister,
    parent_id: NodeId,
) -> Result<Vec<ContentNode>, ContentError> {
    filtered_children(
        persister,
        parent_id,
        &[
            ChildFilter::Visible,
            ChildFilter::Pages,
            ChildFilter::PublishedAt(Utc::now()),
        ],
    )
    .await
}

/// Pages from the root down to `node` inclusive
///
/// Non-page ancestors (containers, widgets) are left out of the trail.
pub async fn breadcrumbs(
    persister: &Persister,
    node: &ContentNode,
) -> Result<Vec<ContentNode>, ContentError> {
    let mut trail = persister.ancestors(node).await?;
    trail.reverse();
    trail.push(node.clone());
    trail.retain(|n| is_page(persister, n));
    Ok(trail)
}

/// Whether `node` is `ancestor` itself or lies below it
pub async fn is_child_or_self(
    persister: &Persister,
    node: &ContentNode,
    ancestor: &ContentNode,
) -> Result<bool, ContentError> {
    if node.id == ancestor.id && !node.is_transient() {
        return Ok(true);
    }
    let ancestors = persister.ancestors(node).await?;
    Ok(ancestors.iter().any(|a| a.id == ancestor.id))
}

/// Whether `node` is on the branch leading to `current`
///
/// Used to highlight the menu entry containing the current page.
pub async fn is_current_branch(
    persister: &Persister,
    node: &ContentNode,
    current: &ContentNode,
) -> Result<bool, ContentError> {
    is_child_or_self(persister, current, node).await
}

/// Depth below the root; the root is at level 0
pub async fn level(persister: &Persister, node: &ContentNode) -> Result<usize, ContentError> {
    Ok(persister.ancestors(node).await?.len())
}
