//! Content configuration
//!
//! Settings the hosting layer supplies when wiring the content tree:
//! URL conventions for the path resolver, the not-found fallback page, the
//! database location, the event channel size and the default log filter.
//! Loaded from JSON; every field has a default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::NodeId;
use crate::services::DEFAULT_EVENT_CHANNEL_CAPACITY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentConfig {
    /// Template extensions stripped from request paths; the first one is
    /// appended by `url_for`
    pub template_extensions: Vec<String>,

    /// URLs below this path never receive the not-found fallback page
    pub admin_path: String,

    /// Node shown when a path does not resolve
    pub not_found_node_id: Option<NodeId>,

    /// libsql database file
    pub database_path: PathBuf,

    /// Capacity of the domain event broadcast channel
    pub event_channel_capacity: usize,

    /// Filter used when `RUST_LOG` is not set
    pub log_filter: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            template_extensions: vec![".aspx".to_string()],
            admin_path: "/admin".to_string(),
            not_found_node_id: None,
            database_path: PathBuf::from("./data/zeus.db"),
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            log_filter: "info".to_string(),
        }
    }
}

impl ContentConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse content configuration")?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid content configuration: {}", e))?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// The extension `url_for` appends, if any
    pub fn preferred_extension(&self) -> Option<&str> {
        self.template_extensions.first().map(String::as_str)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(ext) = self
            .template_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2 || ext.contains('/'))
        {
            return Err(format!(
                "template extension '{}' must start with '.' and contain no '/'",
                ext
            ));
        }

        if !self.admin_path.starts_with('/') {
            return Err("admin_path must start with '/'".to_string());
        }

        if self.not_found_node_id.is_some_and(|id| id <= 0) {
            return Err("not_found_node_id must be a persisted node id".to_string());
        }

        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be greater than 0".to_string());
        }

        if self.log_filter.trim().is_empty() {
            return Err("log_filter cannot be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ContentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.preferred_extension(), Some(".aspx"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            ContentConfig::from_json_str(r#"{ "notFoundNodeId": 12, "adminPath": "/manage" }"#)
                .unwrap();
        assert_eq!(config.not_found_node_id, Some(12));
        assert_eq!(config.admin_path, "/manage");
        assert_eq!(config.template_extensions, vec![".aspx".to_string()]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = ContentConfig::default();
        config.template_extensions = vec!["html".to_string()];
        assert!(config.validate().is_err());

        let mut config = ContentConfig::default();
        config.event_channel_capacity = 0;
        assert!(config.validate().is_err());

        assert!(ContentConfig::from_json_str(r#"{ "adminPath": "admin" }"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("zeus.json");
        std::fs::write(&path, r#"{ "templateExtensions": [".html", ".aspx"] }"#).unwrap();

        let config = ContentConfig::from_file(&path).unwrap();
        assert_eq!(config.preferred_extension(), Some(".html"));
        assert!(ContentConfig::from_file(dir.path().join("missing.json")).is_err());
    }
}
