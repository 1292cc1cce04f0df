//! Tests for the tree index cache

#[cfg(test)]
mod tests {
    use crate::models::{ContentNode, NodeId};
    use crate::services::tree_index::{Lookup, TreeIndex};

    fn node(id: NodeId, parent_id: Option<NodeId>, name: &str, sort_order: i32) -> ContentNode {
        let mut node = ContentNode::new("page", name, name);
        node.id = id;
        node.parent_id = parent_id;
        node.sort_order = Some(sort_order);
        node
    }

    /// root(1) -> [news(2) -> [latest(4)], about(3)]
    fn populated() -> TreeIndex {
        let mut index = TreeIndex::new();
        index.upsert(node(1, None, "", 0));
        index.load_children(1, vec![node(3, Some(1), "about", 1), node(2, Some(1), "news", 0)]);
        index.load_children(2, vec![node(4, Some(2), "latest", 0)]);
        index
    }

    #[test]
    fn test_empty_index_reports_unloaded_root() {
        let index = TreeIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.resolve(&["news"]), Lookup::RootUnloaded);
    }

    #[test]
    fn test_children_are_ordered_by_sort_order() {
        let index = populated();
        assert_eq!(index.child_ids(1), Some(&[2, 3][..]));
        let names: Vec<_> = index
            .children(1)
            .unwrap()
            .into_iter()
            .map(|n| n.name.clone())
            .collect();
        assert_eq!(names, vec!["news", "about"]);
    }

    #[test]
    fn test_resolve_walks_segments() {
        let index = populated();

        match index.resolve(&["news", "latest"]) {
            Lookup::Found(found) => assert_eq!(found.id, 4),
            other => panic!("expected Found, got {:?}", other),
        }
        match index.resolve::<&str>(&[]) {
            Lookup::Found(found) => assert_eq!(found.id, 1),
            other => panic!("expected root, got {:?}", other),
        }
        assert_eq!(index.resolve(&["about", "team"]), Lookup::Unloaded { parent_id: 3 });
        assert_eq!(index.resolve(&["missing"]), Lookup::Missing);
    }

    #[test]
    fn test_child_lookup_is_case_sensitive() {
        let index = populated();
        assert_eq!(index.child(1, "news").map(|n| n.id), Some(2));
        assert!(index.child(1, "News").is_none());
        assert!(index.child(3, "anything").is_none());
    }

    #[test]
    fn test_duplicate_names_first_by_sort_order_wins() {
        let mut index = TreeIndex::new();
        index.upsert(node(1, None, "", 0));
        index.load_children(1, vec![node(5, Some(1), "dup", 3), node(6, Some(1), "dup", 1)]);

        assert_eq!(index.child(1, "dup").map(|n| n.id), Some(6));
        assert_eq!(index.child_ids(1), Some(&[6, 5][..]));
    }

    #[test]
    fn test_upsert_moves_between_loaded_parents() {
        let mut index = populated();
        let mut moved = index.get(3).unwrap().clone();
        moved.parent_id = Some(2);
        moved.sort_order = Some(1);
        index.upsert(moved);

        assert_eq!(index.child_ids(1), Some(&[2][..]));
        assert_eq!(index.child_ids(2), Some(&[4, 3][..]));
        assert!(index.child(1, "about").is_none());
        assert_eq!(index.child(2, "about").map(|n| n.id), Some(3));
    }

    #[test]
    fn test_upsert_rename_updates_segments() {
        let mut index = populated();
        let mut renamed = index.get(3).unwrap().clone();
        renamed.name = "contact".to_string();
        index.upsert(renamed);

        assert!(index.child(1, "about").is_none());
        assert_eq!(index.child(1, "contact").map(|n| n.id), Some(3));
    }

    #[test]
    fn test_upsert_under_unloaded_parent_does_not_fake_a_child_list() {
        let mut index = populated();
        index.upsert(node(7, Some(3), "team", 0));

        assert!(!index.children_loaded(3));
        assert_eq!(index.get(7).map(|n| n.name.as_str()), Some("team"));
    }

    #[test]
    fn test_set_sort_orders_resorts_siblings() {
        let mut index = populated();
        index.set_sort_orders(1, &[(3, 0), (2, 1)]);

        assert_eq!(index.child_ids(1), Some(&[3, 2][..]));
        assert_eq!(index.get(2).unwrap().sort_order, Some(1));
    }

    #[test]
    fn test_remove_subtree_clears_descendants_and_version_links() {
        let mut index = populated();
        let mut version = node(8, Some(3), "about-draft", 0);
        version.version_of_id = Some(4);
        index.load_children(3, vec![version]);

        let removed = index.remove_subtree(2);

        assert_eq!(removed, vec![2, 4]);
        assert!(index.get(2).is_none());
        assert!(index.get(4).is_none());
        assert_eq!(index.child_ids(1), Some(&[3][..]));
        assert_eq!(index.get(8).unwrap().version_of_id, None);
        assert_eq!(index.resolve(&["news"]), Lookup::Missing);
    }

    #[test]
    fn test_remove_root_forgets_root() {
        let mut index = populated();
        let removed = index.remove_subtree(1);

        assert_eq!(removed, vec![1, 2, 3, 4]);
        assert!(index.root().is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_invalidate_clears_everything() {
        let mut index = populated();
        index.invalidate();

        assert!(index.is_empty());
        assert!(!index.children_loaded(1));
        assert_eq!(index.resolve(&["news"]), Lookup::RootUnloaded);
    }
}
