//! Tests for ContentNode

#[cfg(test)]
mod tests {
    use crate::models::{ContentNode, ValidationError, MAX_NAME_LENGTH};
    use chrono::{Duration, Utc};

    #[test]
    fn test_new_node_is_transient_and_visible() {
        let node = ContentNode::new("page", "about", "About");
        assert!(node.is_transient());
        assert!(node.is_root());
        assert!(node.visible);
        assert_eq!(node.sort_order, None);
        assert!(node.details.is_empty());
        assert_eq!(node.created, node.updated);
    }

    #[test]
    fn test_validate_accepts_root_without_name() {
        let root = ContentNode::new("root", "", "Root");
        assert!(root.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_name_under_parent() {
        let mut node = ContentNode::new("page", "", "Untitled");
        node.parent_id = Some(1);
        assert_eq!(
            node.validate(),
            Err(ValidationError::MissingField("name".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_reserved_characters() {
        for bad in ["a/b", "a?b", "a#b"] {
            let node = ContentNode::new("page", bad, "Bad");
            let result = node.validate();
            assert!(
                matches!(result, Err(ValidationError::InvalidName { .. })),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_validate_enforces_column_widths() {
        let long = "x".repeat(MAX_NAME_LENGTH + 1);
        let node = ContentNode::new("page", long.clone(), "Title");
        assert!(matches!(node.validate(), Err(ValidationError::TooLong { .. })));

        let node = ContentNode::new("page", "ok", long);
        assert!(matches!(node.validate(), Err(ValidationError::TooLong { .. })));

        let mut node = ContentNode::new("widget", "w", "Widget");
        node.zone_name = Some("z".repeat(51));
        assert!(matches!(node.validate(), Err(ValidationError::TooLong { .. })));
    }

    #[test]
    fn test_validate_rejects_self_parent() {
        let mut node = ContentNode::new("page", "loop", "Loop");
        node.id = 7;
        node.parent_id = Some(7);
        assert_eq!(node.validate(), Err(ValidationError::SelfParent(7)));
    }

    #[test]
    fn test_sibling_key_orders_unplaced_last() {
        let mut placed = ContentNode::new("page", "a", "A");
        placed.id = 10;
        placed.sort_order = Some(3);

        let unplaced = ContentNode::new("page", "b", "B");
        assert!(placed.sibling_key() < unplaced.sibling_key());
    }

    #[test]
    fn test_is_published_at_respects_expiry() {
        let now = Utc::now();
        let mut node = ContentNode::new("page", "news", "News");
        assert!(!node.is_published_at(now));

        node.published = Some(now - Duration::days(1));
        assert!(node.is_published_at(now));

        node.expires = Some(now - Duration::hours(1));
        assert!(!node.is_published_at(now));
    }

    #[test]
    fn test_is_authorized_with_roles() {
        let mut node = ContentNode::new("page", "members", "Members");
        assert!(node.is_authorized(&[]));

        node.authorized_roles = vec!["Editors".to_string()];
        assert!(!node.is_authorized(&["Everyone"]));
        assert!(node.is_authorized(&["Everyone", "Editors"]));
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let mut node = ContentNode::new("page", "about", "About");
        node.parent_id = Some(1);
        node.details.set("Text", "hello");

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["typeTag"], "page");
        assert_eq!(json["parentId"], 1);
        assert!(json.get("authorizedRoles").is_none());

        let back: ContentNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
