//! Content Types
//!
//! A content type is a static descriptor: a `type_tag`, a set of
//! [`Capability`] flags, the properties its nodes carry, and which child
//! types it accepts. Nodes refer to their type by tag only, so behaviour
//! dispatches on capability presence rather than on a class hierarchy.
//!
//! The [`ContentTypeRegistry`] doubles as the default [`HierarchyPolicy`]
//! consulted when a node is attached to, or moved under, a parent.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::detail::{DetailKind, DetailValue};
use super::detail_store::PersistPolicy;
use super::node::{ContentNode, ValidationError};

/// Behavioural flags a content type may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    /// Addressable page (appears in navigation, breadcrumbs, sitemaps)
    Page,
    /// Placed into a named zone of its parent page
    Widget,
    /// Carries an icon in administrative listings
    Icon,
    /// Holds other items without being a page itself
    Container,
}

/// A property declared by a content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    pub kind: DetailKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub policy: PersistPolicy,
    /// Value written into new instances
    #[serde(default)]
    pub default: Option<DetailValue>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, kind: DetailKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            policy: PersistPolicy::SkipDefaults,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn always_persist(mut self) -> Self {
        self.policy = PersistPolicy::Always;
        self
    }

    pub fn with_default(mut self, value: impl Into<DetailValue>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Static description of one content type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    pub type_tag: String,
    pub title: String,
    pub capabilities: BTreeSet<Capability>,
    pub properties: Vec<PropertyDefinition>,
    /// Child type tags accepted under this type; `None` accepts any type
    pub allowed_children: Option<BTreeSet<String>>,
    pub icon: Option<String>,
}

impl ContentType {
    pub fn new(type_tag: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.into(),
            title: title.into(),
            capabilities: BTreeSet::new(),
            properties: Vec::new(),
            allowed_children: None,
            icon: None,
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.retain(|p| p.name != property.name);
        self.properties.push(property);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.capabilities.insert(Capability::Icon);
        self.icon = Some(icon.into());
        self
    }

    /// Restrict children to the given type tags
    pub fn allow_children<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_children = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn is_page(&self) -> bool {
        self.has(Capability::Page)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn accepts_child(&self, child_type: &str) -> bool {
        match &self.allowed_children {
            None => true,
            Some(tags) => tags.contains(child_type),
        }
    }

    /// Create a transient node of this type with declared defaults applied
    pub fn create_instance(&self, name: impl Into<String>, title: impl Into<String>) -> ContentNode {
        let mut node = ContentNode::new(self.type_tag.clone(), name, title);
        for property in &self.properties {
            if let Some(default) = &property.default {
                node.details
                    .set_with_policy(property.name.clone(), default.clone(), property.policy);
            }
        }
        node
    }

    /// Set a declared property, honouring its kind and persist policy
    ///
    /// Returns `true` when the node's detail store changed.
    ///
    /// # Errors
    ///
    /// - `UndeclaredProperty` if this type does not declare `name`
    /// - `PropertyKind` if `value` is of a different kind
    pub fn set_property(
        &self,
        node: &mut ContentNode,
        name: &str,
        value: impl Into<DetailValue>,
    ) -> Result<bool, ValidationError> {
        let definition = self
            .property(name)
            .ok_or_else(|| ValidationError::UndeclaredProperty {
                property: name.to_string(),
                type_tag: self.type_tag.clone(),
            })?;

        let value = value.into();
        if value.kind() != definition.kind {
            return Err(ValidationError::PropertyKind {
                property: name.to_string(),
                expected: definition.kind.to_string(),
                actual: value.kind().to_string(),
            });
        }

        Ok(node
            .details
            .set_with_policy(name.to_string(), value, definition.policy))
    }

    /// Check required properties and kinds of declared properties
    pub fn validate(&self, node: &ContentNode) -> Result<(), ValidationError> {
        for property in &self.properties {
            match node.details.value(&property.name) {
                Some(value) if value.kind() != property.kind => {
                    return Err(ValidationError::PropertyKind {
                        property: property.name.clone(),
                        expected: property.kind.to_string(),
                        actual: value.kind().to_string(),
                    });
                }
                None if property.required => {
                    return Err(ValidationError::MissingField(property.name.clone()));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Capability query deciding whether `parent` may hold `child`
///
/// The persistence gateway consults the policy on every attach and move.
pub trait HierarchyPolicy: Send + Sync {
    fn allows_child(&self, parent: &ContentNode, child: &ContentNode) -> bool;
}

/// Policy that accepts every placement
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAnyChild;

impl HierarchyPolicy for AllowAnyChild {
    fn allows_child(&self, _parent: &ContentNode, _child: &ContentNode) -> bool {
        true
    }
}

/// Registry of content types keyed by `type_tag`
#[derive(Debug, Clone, Default)]
pub struct ContentTypeRegistry {
    types: HashMap<String, ContentType>,
}

impl ContentTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type, replacing any previous definition with the same tag
    pub fn register(&mut self, content_type: ContentType) {
        self.types
            .insert(content_type.type_tag.clone(), content_type);
    }

    pub fn get(&self, type_tag: &str) -> Option<&ContentType> {
        self.types.get(type_tag)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Tags of all registered types, sorted
    pub fn type_tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.types.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Factory for a transient node of a registered type
    pub fn create_instance(
        &self,
        type_tag: &str,
        name: impl Into<String>,
        title: impl Into<String>,
    ) -> Result<ContentNode, ValidationError> {
        self.get(type_tag)
            .map(|t| t.create_instance(name, title))
            .ok_or_else(|| ValidationError::UnknownType(type_tag.to_string()))
    }

    /// Whether the node's type declares `capability`; unknown types have none
    pub fn node_has(&self, node: &ContentNode, capability: Capability) -> bool {
        self.get(&node.type_tag)
            .is_some_and(|t| t.has(capability))
    }

    /// Validate a node against its registered type
    ///
    /// Nodes of unregistered types pass; the registry only constrains
    /// what it knows about.
    pub fn validate(&self, node: &ContentNode) -> Result<(), ValidationError> {
        match self.get(&node.type_tag) {
            Some(content_type) => content_type.validate(node),
            None => Ok(()),
        }
    }
}

impl HierarchyPolicy for ContentTypeRegistry {
    fn allows_child(&self, parent: &ContentNode, child: &ContentNode) -> bool {
        match self.get(&parent.type_tag) {
            Some(parent_type) => parent_type.accepts_child(&child.type_tag),
            None => true,
        }
    }
}
