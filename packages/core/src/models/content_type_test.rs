//! Tests for ContentType and ContentTypeRegistry

#[cfg(test)]
mod tests {
    use crate::models::{
        Capability, ContentNode, ContentType, ContentTypeRegistry, DetailKind, HierarchyPolicy,
        PropertyDefinition, ValidationError,
    };

    fn blog_registry() -> ContentTypeRegistry {
        let mut registry = ContentTypeRegistry::new();
        registry.register(
            ContentType::new("blog", "Blog")
                .with_capability(Capability::Page)
                .allow_children(["blog-post", "category-container"]),
        );
        registry.register(
            ContentType::new("blog-post", "Post")
                .with_capability(Capability::Page)
                .with_icon("page_white_text")
                .with_property(PropertyDefinition::new("Text", DetailKind::String).required())
                .with_property(
                    PropertyDefinition::new("AllowComments", DetailKind::Bool)
                        .always_persist()
                        .with_default(false),
                ),
        );
        registry.register(
            ContentType::new("widget", "Widget").with_capability(Capability::Widget),
        );
        registry
    }

    #[test]
    fn test_create_instance_applies_defaults_with_policy() {
        let registry = blog_registry();
        let post = registry.create_instance("blog-post", "hello", "Hello").unwrap();

        assert_eq!(post.type_tag, "blog-post");
        // Always-persist property keeps its empty default
        assert!(post.details.contains("AllowComments"));
        assert!(!post.details.get("AllowComments", true));
    }

    #[test]
    fn test_create_instance_unknown_type() {
        let registry = blog_registry();
        assert_eq!(
            registry.create_instance("forum", "f", "F").unwrap_err(),
            ValidationError::UnknownType("forum".to_string())
        );
    }

    #[test]
    fn test_set_property_checks_declaration_and_kind() {
        let registry = blog_registry();
        let post_type = registry.get("blog-post").unwrap();
        let mut post = post_type.create_instance("p", "P");

        assert!(post_type.set_property(&mut post, "Text", "body").unwrap());
        assert!(matches!(
            post_type.set_property(&mut post, "Text", 5i64),
            Err(ValidationError::PropertyKind { .. })
        ));
        assert!(matches!(
            post_type.set_property(&mut post, "Unknown", "x"),
            Err(ValidationError::UndeclaredProperty { .. })
        ));
    }

    #[test]
    fn test_validate_requires_required_properties() {
        let registry = blog_registry();
        let mut post = registry.create_instance("blog-post", "p", "P").unwrap();
        assert_eq!(
            registry.validate(&post),
            Err(ValidationError::MissingField("Text".to_string()))
        );

        post.details.set("Text", "body");
        assert!(registry.validate(&post).is_ok());
    }

    #[test]
    fn test_capabilities() {
        let registry = blog_registry();
        let post = registry.create_instance("blog-post", "p", "P").unwrap();
        let widget = registry.create_instance("widget", "w", "W").unwrap();
        let unknown = ContentNode::new("mystery", "m", "M");

        assert!(registry.node_has(&post, Capability::Page));
        assert!(registry.node_has(&post, Capability::Icon));
        assert!(!registry.node_has(&widget, Capability::Page));
        assert!(!registry.node_has(&unknown, Capability::Page));
    }

    #[test]
    fn test_hierarchy_policy_restricts_children() {
        let registry = blog_registry();
        let blog = registry.create_instance("blog", "blog", "Blog").unwrap();
        let post = registry.create_instance("blog-post", "p", "P").unwrap();
        let widget = registry.create_instance("widget", "w", "W").unwrap();

        assert!(registry.allows_child(&blog, &post));
        assert!(!registry.allows_child(&blog, &widget));
        // Unrestricted parent type
        assert!(registry.allows_child(&post, &widget));
    }

    #[test]
    fn test_type_tags_sorted() {
        let registry = blog_registry();
        assert_eq!(registry.type_tags(), vec!["blog", "blog-post", "widget"]);
    }
}
