//! Request-scoped access to the content tree
//!
//! A [`RequestContext`] is built per request by the host. It carries the
//! shared persister and resolver, the node the request resolved to and the
//! acting user, which is stamped into `saved_by` on every save.

use super::error::ContentError;
use super::path_resolver::PathResolver;
use super::persister::Persister;
use crate::models::{ContentNode, NodeId};

#[derive(Debug, Clone)]
pub struct RequestContext {
    resolver: PathResolver,
    current: Option<ContentNode>,
    user: Option<String>,
}

impl RequestContext {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            current: None,
            user: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn persister(&self) -> &Persister {
        self.resolver.persister()
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Node the request resolved to, if any
    pub fn current(&self) -> Option<&ContentNode> {
        self.current.as_ref()
    }

    pub fn set_current(&mut self, node: ContentNode) {
        self.current = Some(node);
    }

    /// Resolve `url` and make the result the current node
    pub async fn resolve(&mut self, url: &str) -> Result<&ContentNode, ContentError> {
        let node = self.resolver.resolve(url).await?;
        Ok(self.current.insert(node))
    }

    /// Save `node` on behalf of the acting user
    pub async fn save(&self, node: &mut ContentNode) -> Result<NodeId, ContentError> {
        if let Some(user) = &self.user {
            node.saved_by = Some(user.clone());
        }
        self.persister().save(node).await
    }

    /// The root node
    pub async fn start_page(&self) -> Result<ContentNode, ContentError> {
        self.persister().root().await
    }
}
