//! Path Resolver
//!
//! Maps request URLs onto content nodes. A URL is reduced to path segments
//! by dropping the query and fragment, stripping a configured template
//! extension and discarding empty segments; the segments are then resolved
//! through the persister's tree index.
//!
//! When nothing matches, every registered [`PageNotFoundHandler`] sees a
//! [`PageNotFoundEvent`] in registration order and may supply a fallback
//! node. Without a fallback the result is `ResolutionFailed`.

use async_trait::async_trait;
use std::sync::Arc;

use super::error::ContentError;
use super::persister::Persister;
use crate::config::ContentConfig;
use crate::models::{Capability, ContentNode, NodeId};

/// Raised when a URL does not resolve to a node
#[derive(Debug, Clone)]
pub struct PageNotFoundEvent {
    /// URL as requested
    pub url: String,
    pub segments: Vec<String>,
    /// Fallback node chosen by a handler
    pub affected: Option<ContentNode>,
}

impl PageNotFoundEvent {
    pub fn new(url: impl Into<String>, segments: Vec<String>) -> Self {
        Self {
            url: url.into(),
            segments,
            affected: None,
        }
    }

    pub fn is_handled(&self) -> bool {
        self.affected.is_some()
    }
}

/// Observer of unresolved URLs
#[async_trait]
pub trait PageNotFoundHandler: Send + Sync {
    /// Inspect the event and optionally set `event.affected`
    ///
    /// Errors abort resolution and are returned to the caller.
    async fn on_page_not_found(
        &self,
        persister: &Persister,
        event: &mut PageNotFoundEvent,
    ) -> Result<(), ContentError>;
}

/// Serves a configured "page not found" node for unresolved public URLs
///
/// URLs below the admin path are left alone so administrative 404s stay
/// visible. A fallback that has itself been deleted is logged and ignored.
#[derive(Debug, Clone)]
pub struct NotFoundPageHandler {
    admin_path: String,
    fallback_id: NodeId,
}

impl NotFoundPageHandler {
    pub fn new(admin_path: impl Into<String>, fallback_id: NodeId) -> Self {
        Self {
            admin_path: admin_path.into().trim_end_matches('/').to_string(),
            fallback_id,
        }
    }

    fn is_admin_url(&self, url: &str) -> bool {
        let len = self.admin_path.len();
        url.get(..len)
            .is_some_and(|head| head.eq_ignore_ascii_case(&self.admin_path))
            && url.as_bytes().get(len) == Some(&b'/')
    }
}

#[async_trait]
impl PageNotFoundHandler for NotFoundPageHandler {
    async fn on_page_not_found(
        &self,
        persister: &Persister,
        event: &mut PageNotFoundEvent,
    ) -> Result<(), ContentError> {
        if event.is_handled() || self.is_admin_url(&event.url) {
            return Ok(());
        }

        match persister.get(self.fallback_id).await {
            Ok(node) => {
                tracing::debug!(url = %event.url, fallback = node.id, "Serving not-found page");
                event.affected = Some(node);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    fallback_id = self.fallback_id,
                    "Configured not-found page does not exist"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// URL to node mapping over a [`Persister`]
#[derive(Clone)]
pub struct PathResolver {
    persister: Persister,
    extensions: Vec<String>,
    handlers: Vec<Arc<dyn PageNotFoundHandler>>,
}

impl PathResolver {
    pub fn new(persister: Persister) -> Self {
        Self {
            persister,
            extensions: vec![".aspx".to_string()],
            handlers: Vec::new(),
        }
    }

    /// Build a resolver with the configured extensions, registering a
    /// [`NotFoundPageHandler`] when a fallback node is configured
    pub fn from_config(persister: Persister, config: &ContentConfig) -> Self {
        let mut resolver =
            Self::new(persister).with_extensions(config.template_extensions.iter().cloned());
        if let Some(fallback_id) = config.not_found_node_id {
            resolver = resolver.with_handler(Arc::new(NotFoundPageHandler::new(
                config.admin_path.clone(),
                fallback_id,
            )));
        }
        resolver
    }

    /// Replace the recognised template extensions; the first is preferred
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn PageNotFoundHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn persister(&self) -> &Persister {
        &self.persister
    }

    /// Split a URL into path segments
    ///
    /// `"/news/latest.aspx?page=2"` gives `["news", "latest"]`.
    pub fn segments(&self, url: &str) -> Vec<String> {
        let path = match url.find(|c| c == '?' || c == '#') {
            Some(end) => &url[..end],
            None => url,
        };
        let path = self.strip_extension(path);

        path.split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn strip_extension<'a>(&self, path: &'a str) -> &'a str {
        for extension in &self.extensions {
            let Some(cut) = path.len().checked_sub(extension.len()) else {
                continue;
            };
            if path.is_char_boundary(cut) && path[cut..].eq_ignore_ascii_case(extension) {
                return &path[..cut];
            }
        }
        path
    }

    /// Resolve a URL to a node, consulting not-found handlers on a miss
    ///
    /// # Errors
    ///
    /// `ResolutionFailed` when no node matches and no handler supplied one;
    /// storage errors are passed through.
    pub async fn resolve(&self, url: &str) -> Result<ContentNode, ContentError> {
        let segments = self.segments(url);

        match self.persister.resolve(&segments).await {
            Ok(node) => Ok(node),
            Err(e) if e.is_not_found() => {
                tracing::debug!(url, "Path did not resolve: {}", e);
                let mut event = PageNotFoundEvent::new(url, segments);
                for handler in &self.handlers {
                    handler.on_page_not_found(&self.persister, &mut event).await?;
                }
                event
                    .affected
                    .ok_or_else(|| ContentError::resolution_failed(url))
            }
            Err(e) => Err(e),
        }
    }

    /// Public URL of `node`
    ///
    /// The root maps to `/`. Pages get the preferred template extension;
    /// without a type registry every node is treated as a page.
    pub async fn url_for(&self, node: &ContentNode) -> Result<String, ContentError> {
        let path = self.persister.path(node).await?;
        if path.is_empty() {
            return Ok("/".to_string());
        }

        let is_page = self
            .persister
            .registry()
            .map_or(true, |registry| registry.node_has(node, Capability::Page));

        match self.extensions.first() {
            Some(extension) if is_page => Ok(format!("{}{}", path, extension)),
            _ => Ok(path),
        }
    }
}

impl std::fmt::Debug for PathResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathResolver")
            .field("extensions", &self.extensions)
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
