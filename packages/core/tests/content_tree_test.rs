//! Content Tree Integration Tests
//!
//! Structural scenarios run against both storage backends: the in-memory
//! store and a libsql database in a temporary directory. Each scenario also
//! re-reads the tree after `invalidate()` so the assertions hold for durable
//! state, not just for the tree index.

#[cfg(test)]
mod content_tree_tests {
    use anyhow::Result;
    use std::sync::Arc;
    use tempfile::TempDir;
    use zeus_core::db::{LibsqlStore, MemoryStore};
    use zeus_core::{ContentError, ContentNode, Detail, NodeId, Persister};

    fn memory_persister() -> Persister {
        Persister::new(Arc::new(MemoryStore::new()))
    }

    /// Helper to create a persister over a fresh libsql database
    async fn libsql_persister() -> Result<(Persister, TempDir)> {
        let temp_dir = TempDir::new()?;
        let store = LibsqlStore::open(temp_dir.path().join("content.db")).await?;
        Ok((Persister::new(Arc::new(store)), temp_dir))
    }

    async fn create_root(persister: &Persister) -> Result<ContentNode> {
        let mut root = ContentNode::new("root", "", "Home");
        persister.save(&mut root).await?;
        Ok(root)
    }

    async fn create_child(persister: &Persister, parent_id: NodeId, name: &str) -> Result<ContentNode> {
        let mut node = ContentNode::new("page", name, format!("Page {}", name));
        persister.add_to(&mut node, parent_id).await?;
        Ok(node)
    }

    async fn names(persister: &Persister, parent_id: NodeId) -> Result<Vec<String>> {
        Ok(persister
            .children(parent_id)
            .await?
            .into_iter()
            .map(|n| n.name)
            .collect())
    }

    //
    // SCENARIOS
    //

    async fn move_changes_resolution(persister: Persister) -> Result<()> {
        let root = create_root(&persister).await?;
        let a = create_child(&persister, root.id, "a").await?;
        let b = create_child(&persister, root.id, "b").await?;
        assert_eq!(a.sort_order, Some(0));
        assert_eq!(b.sort_order, Some(1));

        assert_eq!(persister.resolve(&["a"]).await?.id, a.id);

        let moved = persister.move_to(a.id, b.id).await?;
        assert_eq!(moved.parent_id, Some(b.id));
        assert_eq!(moved.sort_order, Some(0));

        assert_eq!(persister.resolve(&["b", "a"]).await?.id, a.id);
        let err = persister.resolve(&["a"]).await.unwrap_err();
        assert!(matches!(err, ContentError::PathNotFound { .. }));
        assert!(err.is_not_found());

        // Old siblings were renumbered
        assert_eq!(persister.get(b.id).await?.sort_order, Some(0));

        persister.invalidate().await;
        assert_eq!(persister.resolve(&["b", "a"]).await?.id, a.id);
        assert!(persister.resolve(&["a"]).await.is_err());
        assert_eq!(persister.path(&moved).await?, "/b/a");
        assert_eq!(persister.get(b.id).await?.sort_order, Some(0));
        Ok(())
    }

    async fn paths_follow_ancestry(persister: Persister) -> Result<()> {
        let root = create_root(&persister).await?;
        let news = create_child(&persister, root.id, "news").await?;
        let archive = create_child(&persister, news.id, "archive").await?;
        let post = create_child(&persister, archive.id, "2009").await?;

        assert_eq!(persister.path(&root).await?, "");
        assert_eq!(persister.path(&news).await?, "/news");
        assert_eq!(persister.path(&post).await?, "/news/archive/2009");

        for node in [&news, &archive, &post] {
            let parent = persister.get(node.parent_id.unwrap_or_default()).await?;
            assert_eq!(
                persister.path(node).await?,
                format!("{}/{}", persister.path(&parent).await?, node.name)
            );

            let path = persister.path(node).await?;
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            assert_eq!(persister.resolve(&segments).await?.id, node.id);
        }

        let ancestors: Vec<NodeId> = persister.ancestors(&post).await?.iter().map(|n| n.id).collect();
        assert_eq!(ancestors, vec![archive.id, news.id, root.id]);
        Ok(())
    }

    async fn cycles_are_rejected(persister: Persister) -> Result<()> {
        let root = create_root(&persister).await?;
        let a = create_child(&persister, root.id, "a").await?;
        let b = create_child(&persister, a.id, "b").await?;
        let c = create_child(&persister, b.id, "c").await?;

        for target in [b.id, c.id, a.id] {
            let err = persister.move_to(a.id, target).await.unwrap_err();
            assert!(
                matches!(err, ContentError::InvalidHierarchy { .. }),
                "moving under {} should fail, got {:?}",
                target,
                err
            );
        }

        persister.invalidate().await;
        assert_eq!(names(&persister, root.id).await?, vec!["a"]);
        assert_eq!(persister.path(&c).await?, "/a/b/c");
        Ok(())
    }

    async fn delete_cascades(persister: Persister) -> Result<()> {
        let root = create_root(&persister).await?;
        let a = create_child(&persister, root.id, "a").await?;
        let b = create_child(&persister, a.id, "b").await?;
        let mut c = ContentNode::new("page", "c", "C");
        c.details.set("Text", "body");
        if let Some(tags) = c.details.collection_mut("Tags", true) {
            tags.push(Detail::new("tag", "rust"));
        }
        c.authorized_roles.push("Editors".to_string());
        persister.add_to(&mut c, b.id).await?;
        let keep = create_child(&persister, root.id, "keep").await?;

        // A version of `b` stored elsewhere in the tree
        let mut draft = ContentNode::new("page", "b-draft", "Draft of b");
        draft.version_of_id = Some(b.id);
        persister.add_to(&mut draft, keep.id).await?;

        assert_eq!(persister.count().await?, 6);

        let removed = persister.delete(a.id).await?;
        assert_eq!(removed, vec![a.id, b.id, c.id]);
        assert_eq!(persister.count().await?, 3);

        for id in [a.id, b.id, c.id] {
            assert!(persister.get(id).await.unwrap_err().is_not_found());
        }
        assert_eq!(persister.get(draft.id).await?.version_of_id, None);
        assert_eq!(persister.get(keep.id).await?.sort_order, Some(0));

        persister.invalidate().await;
        assert_eq!(persister.get(draft.id).await?.version_of_id, None);
        assert_eq!(names(&persister, root.id).await?, vec!["keep"]);
        assert!(persister.get(c.id).await.unwrap_err().is_not_found());
        Ok(())
    }

    async fn sort_order_placement(persister: Persister) -> Result<()> {
        let root = create_root(&persister).await?;
        let mut ids = Vec::new();
        for name in ["one", "two", "three", "four"] {
            ids.push(create_child(&persister, root.id, name).await?.id);
        }

        persister.update_sort_order(ids[3], 1).await?;
        assert_eq!(names(&persister, root.id).await?, vec!["one", "four", "two", "three"]);

        persister.update_sort_order(ids[0], 10).await?;
        assert_eq!(names(&persister, root.id).await?, vec!["four", "two", "three", "one"]);

        persister.invalidate().await;
        let children = persister.children(root.id).await?;
        let names: Vec<&str> = children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["four", "two", "three", "one"]);
        let orders: Vec<Option<i32>> = children.iter().map(|n| n.sort_order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2), Some(3)]);
        Ok(())
    }

    async fn rename_updates_index(persister: Persister) -> Result<()> {
        let root = create_root(&persister).await?;
        let mut about = create_child(&persister, root.id, "about").await?;
        create_child(&persister, about.id, "team").await?;

        about.name = "company".to_string();
        persister.save(&mut about).await?;

        assert!(persister.resolve(&["about"]).await.is_err());
        assert_eq!(persister.resolve(&["company", "team"]).await?.name, "team");
        assert_eq!(
            persister.get_child(root.id, "company").await?.map(|n| n.id),
            Some(about.id)
        );
        assert!(persister.get_child(root.id, "Company").await?.is_none());
        Ok(())
    }

    async fn add_to_round_trips(persister: Persister) -> Result<()> {
        let root = create_root(&persister).await?;
        let mut a = create_child(&persister, root.id, "a").await?;
        let b = create_child(&persister, root.id, "b").await?;

        async fn resolve_path(persister: &Persister, node: &ContentNode) -> Result<NodeId> {
            let path = persister.path(node).await?;
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            Ok(persister.resolve(&segments).await?.id)
        }

        let mut fresh = ContentNode::new("page", "fresh", "Fresh");
        persister.add_to(&mut fresh, b.id).await?;
        assert_eq!(resolve_path(&persister, &fresh).await?, fresh.id);

        persister.add_to(&mut a, b.id).await?;
        assert_eq!(resolve_path(&persister, &a).await?, a.id);
        assert_eq!(names(&persister, b.id).await?, vec!["fresh", "a"]);

        persister.invalidate().await;
        assert_eq!(resolve_path(&persister, &a).await?, a.id);
        assert_eq!(names(&persister, root.id).await?, vec!["b"]);
        Ok(())
    }

    macro_rules! scenario_tests {
        ($($scenario:ident => $memory:ident, $libsql:ident;)*) => {
            $(
                #[tokio::test]
                async fn $memory() -> Result<()> {
                    $scenario(memory_persister()).await
                }

                #[tokio::test]
                async fn $libsql() -> Result<()> {
                    let (persister, _temp_dir) = libsql_persister().await?;
                    $scenario(persister).await
                }
            )*
        };
    }

    scenario_tests! {
        move_changes_resolution => test_move_changes_resolution_memory, test_move_changes_resolution_libsql;
        add_to_round_trips => test_add_to_round_trips_memory, test_add_to_round_trips_libsql;
        paths_follow_ancestry => test_paths_follow_ancestry_memory, test_paths_follow_ancestry_libsql;
        cycles_are_rejected => test_cycles_are_rejected_memory, test_cycles_are_rejected_libsql;
        delete_cascades => test_delete_cascades_memory, test_delete_cascades_libsql;
        sort_order_placement => test_sort_order_placement_memory, test_sort_order_placement_libsql;
        rename_updates_index => test_rename_updates_index_memory, test_rename_updates_index_libsql;
    }
}
