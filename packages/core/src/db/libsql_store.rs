//! LibsqlStore - ContentStore over an embedded libsql (SQLite) database
//!
//! # Schema
//!
//! Four tables hold the whole tree:
//!
//! - `items`: one row per content node (structural fields only)
//! - `detail_collections`: named collections owned by an item
//! - `authorized_roles`: role names allowed to read an item
//! - `details`: one row per detail, discriminated by `type`, with one
//!   nullable column per scalar kind plus a `value` blob column
//!
//! Owned rows cascade with their item through foreign keys, and
//! `items.parent_id` cascades so deleting an item removes its subtree.
//! `items.version_of_id` is `ON DELETE SET NULL`: versions outlive their
//! master.
//!
//! # Connection handling
//!
//! The store owns a single connection behind an async mutex. Every commit
//! runs inside one `BEGIN TRANSACTION`/`COMMIT` pair and is rolled back on
//! the first failing statement. A single connection also makes `:memory:`
//! databases usable, since each in-memory connection is its own database.
//!
//! # Examples
//!
//! ```rust,no_run
//! use zeus_core::db::{ContentStore, LibsqlStore};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = LibsqlStore::open("./data/zeus.db").await?;
//! println!("{} items", store.count().await?);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Builder, Connection, Database, Row};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::content_store::{ChangeSet, ContentStore, StoreOperation};
use super::error::StoreError;
use crate::models::{
    ContentNode, Detail, DetailCollection, DetailKind, DetailStore, DetailValue, NodeId,
};

const ITEM_COLUMNS: &str = "id, type, created, published, updated, expires, name, zone_name, \
     title, sort_order, visible, saved_by, version_of_id, parent_id";

/// Embedded relational [`ContentStore`]
pub struct LibsqlStore {
    // Keeps the database handle alive for the connection's lifetime
    _db: Database,
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl LibsqlStore {
    /// Open (or create) a database file and initialize the schema
    ///
    /// The parent directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the directory cannot be created, the file
    /// cannot be opened, or schema creation fails.
    pub async fn open(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| {
                    StoreError::DirectoryCreationFailed {
                        path: db_path.clone(),
                        source,
                    }
                })?;
            }
        }

        Self::build(db_path).await
    }

    /// Open the database at `config.database_path`
    pub async fn from_config(config: &crate::config::ContentConfig) -> Result<Self, StoreError> {
        Self::open(config.database_path.clone()).await
    }

    /// Open a private in-memory database
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        Self::build(PathBuf::from(":memory:")).await
    }

    async fn build(db_path: PathBuf) -> Result<Self, StoreError> {
        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| StoreError::connection_failed(db_path.clone(), e))?;
        let conn = db
            .connect()
            .map_err(|e| StoreError::connection_failed(db_path.clone(), e))?;

        initialize_schema(&conn).await?;
        tracing::debug!(path = %db_path.display(), "Opened content database");

        Ok(Self {
            _db: db,
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

/// PRAGMA statements return rows, so they go through `query()`
async fn execute_pragma(conn: &Connection, pragma: &str) -> Result<(), StoreError> {
    let mut stmt = conn.prepare(pragma).await.map_err(|e| {
        StoreError::initialization_failed(format!("Failed to execute '{}': {}", pragma, e))
    })?;
    let _ = stmt.query(()).await.map_err(|e| {
        StoreError::initialization_failed(format!("Failed to execute '{}': {}", pragma, e))
    })?;
    Ok(())
}

async fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    execute_pragma(conn, "PRAGMA journal_mode = WAL").await?;
    execute_pragma(conn, "PRAGMA busy_timeout = 5000").await?;
    execute_pragma(conn, "PRAGMA foreign_keys = ON").await?;

    let statements = [
        (
            "items",
            "CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                created TEXT NOT NULL,
                published TEXT,
                updated TEXT NOT NULL,
                expires TEXT,
                name TEXT,
                zone_name TEXT,
                title TEXT,
                sort_order INTEGER,
                visible INTEGER NOT NULL DEFAULT 1,
                saved_by TEXT,
                version_of_id INTEGER,
                parent_id INTEGER,
                -- Versions outlive their master
                FOREIGN KEY (version_of_id) REFERENCES items(id) ON DELETE SET NULL,
                -- Parent deletion cascades to the whole subtree
                FOREIGN KEY (parent_id) REFERENCES items(id) ON DELETE CASCADE
            )",
        ),
        (
            "detail_collections",
            "CREATE TABLE IF NOT EXISTS detail_collections (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
            )",
        ),
        (
            "authorized_roles",
            "CREATE TABLE IF NOT EXISTS authorized_roles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                role TEXT NOT NULL,
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
            )",
        ),
        (
            "details",
            "CREATE TABLE IF NOT EXISTS details (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL,
                item_id INTEGER NOT NULL,
                detail_collection_id INTEGER,
                name TEXT NOT NULL,
                bool_value INTEGER,
                int_value INTEGER,
                link_value INTEGER,
                double_value REAL,
                datetime_value TEXT,
                string_value TEXT,
                value BLOB,
                FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE,
                FOREIGN KEY (detail_collection_id) REFERENCES detail_collections(id) ON DELETE CASCADE
            )",
        ),
        (
            "idx_items_parent",
            "CREATE INDEX IF NOT EXISTS idx_items_parent ON items(parent_id, sort_order)",
        ),
        (
            "idx_items_version_of",
            "CREATE INDEX IF NOT EXISTS idx_items_version_of ON items(version_of_id)",
        ),
        (
            "idx_details_item",
            "CREATE INDEX IF NOT EXISTS idx_details_item ON details(item_id)",
        ),
        (
            "idx_collections_item",
            "CREATE INDEX IF NOT EXISTS idx_collections_item ON detail_collections(item_id)",
        ),
        (
            "idx_roles_item",
            "CREATE INDEX IF NOT EXISTS idx_roles_item ON authorized_roles(item_id)",
        ),
    ];

    for (name, sql) in statements {
        conn.execute(sql, ()).await.map_err(|e| {
            StoreError::initialization_failed(format!("Failed to create {}: {}", name, e))
        })?;
    }

    Ok(())
}

fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_timestamp(id: NodeId, column: &str, s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::row_decode(id, format!("bad {} '{}': {}", column, s, e)))
}

fn parse_optional_timestamp(
    id: NodeId,
    column: &str,
    s: Option<String>,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    s.map(|s| parse_timestamp(id, column, &s)).transpose()
}

/// Convert an `items` row (selected with [`ITEM_COLUMNS`]) into a node
/// without owned data
fn row_to_node(row: &Row) -> Result<ContentNode, StoreError> {
    let id: NodeId = row.get(0)?;
    let type_tag: String = row.get(1)?;
    let created: String = row.get(2)?;
    let published: Option<String> = row.get(3)?;
    let updated: String = row.get(4)?;
    let expires: Option<String> = row.get(5)?;
    let name: Option<String> = row.get(6)?;
    let zone_name: Option<String> = row.get(7)?;
    let title: Option<String> = row.get(8)?;
    let sort_order: Option<i64> = row.get(9)?;
    let visible: i64 = row.get(10)?;
    let saved_by: Option<String> = row.get(11)?;
    let version_of_id: Option<NodeId> = row.get(12)?;
    let parent_id: Option<NodeId> = row.get(13)?;

    let sort_order = sort_order
        .map(i32::try_from)
        .transpose()
        .map_err(|e| StoreError::row_decode(id, format!("sort_order out of range: {}", e)))?;

    Ok(ContentNode {
        id,
        type_tag,
        name: name.unwrap_or_default(),
        title: title.unwrap_or_default(),
        parent_id,
        sort_order,
        visible: visible != 0,
        created: parse_timestamp(id, "created", &created)?,
        updated: parse_timestamp(id, "updated", &updated)?,
        published: parse_optional_timestamp(id, "published", published)?,
        expires: parse_optional_timestamp(id, "expires", expires)?,
        version_of_id,
        zone_name,
        saved_by,
        authorized_roles: Vec::new(),
        details: DetailStore::new(),
    })
}

/// Decode a `details` row; columns are
/// `type, detail_collection_id, name, bool_value, int_value, link_value,
/// double_value, datetime_value, string_value, value`
fn row_to_detail(item_id: NodeId, row: &Row) -> Result<(Option<i64>, Detail), StoreError> {
    let kind: String = row.get(0)?;
    let collection_id: Option<i64> = row.get(1)?;
    let name: String = row.get(2)?;

    let kind = DetailKind::parse(&kind)
        .ok_or_else(|| StoreError::row_decode(item_id, format!("unknown detail type '{}'", kind)))?;

    let value = match kind {
        DetailKind::Bool => {
            let value: Option<i64> = row.get(3)?;
            DetailValue::Bool(value.unwrap_or_default() != 0)
        }
        DetailKind::Int => {
            let value: Option<i64> = row.get(4)?;
            DetailValue::Int(value.unwrap_or_default())
        }
        DetailKind::Link => {
            let value: Option<i64> = row.get(5)?;
            DetailValue::Link(value.unwrap_or_default())
        }
        DetailKind::Double => {
            let value: Option<f64> = row.get(6)?;
            DetailValue::Double(value.unwrap_or_default())
        }
        DetailKind::DateTime => {
            let value: Option<String> = row.get(7)?;
            let value = value.ok_or_else(|| {
                StoreError::row_decode(item_id, format!("detail '{}' has no datetime", name))
            })?;
            DetailValue::DateTime(parse_timestamp(item_id, "datetime_value", &value)?)
        }
        DetailKind::String => {
            let value: Option<String> = row.get(8)?;
            DetailValue::String(value.unwrap_or_default())
        }
        DetailKind::Binary => {
            let value: Option<Vec<u8>> = row.get(9)?;
            DetailValue::Binary(value.unwrap_or_default())
        }
    };

    Ok((collection_id, Detail { name, value }))
}

/// Load details, collections and roles into `node`
async fn hydrate(conn: &Connection, node: &mut ContentNode) -> Result<(), StoreError> {
    let mut stmt = conn
        .prepare("SELECT role FROM authorized_roles WHERE item_id = ? ORDER BY id")
        .await?;
    let mut rows = stmt.query([node.id]).await?;
    while let Some(row) = rows.next().await? {
        node.authorized_roles.push(row.get(0)?);
    }

    let mut collection_names: Vec<(i64, String)> = Vec::new();
    let mut stmt = conn
        .prepare("SELECT id, name FROM detail_collections WHERE item_id = ? ORDER BY id")
        .await?;
    let mut rows = stmt.query([node.id]).await?;
    while let Some(row) = rows.next().await? {
        collection_names.push((row.get(0)?, row.get(1)?));
    }

    let mut details = Vec::new();
    let mut grouped: BTreeMap<i64, Vec<Detail>> = BTreeMap::new();
    let mut stmt = conn
        .prepare(
            "SELECT type, detail_collection_id, name, bool_value, int_value, link_value,
                    double_value, datetime_value, string_value, value
             FROM details WHERE item_id = ? ORDER BY id",
        )
        .await?;
    let mut rows = stmt.query([node.id]).await?;
    while let Some(row) = rows.next().await? {
        match row_to_detail(node.id, &row)? {
            (None, detail) => details.push(detail),
            (Some(collection_id), detail) => {
                grouped.entry(collection_id).or_default().push(detail)
            }
        }
    }

    let collections = collection_names
        .into_iter()
        .map(|(id, name)| {
            DetailCollection::from_details(name, grouped.remove(&id).unwrap_or_default())
        })
        .collect();

    node.details = DetailStore::from_parts(details, collections);
    Ok(())
}

async fn query_nodes(
    conn: &Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<Vec<ContentNode>, StoreError> {
    let mut stmt = conn.prepare(sql).await?;
    let mut rows = stmt.query(params).await?;

    let mut nodes = Vec::new();
    while let Some(row) = rows.next().await? {
        nodes.push(row_to_node(&row)?);
    }
    for node in &mut nodes {
        hydrate(conn, node).await?;
    }
    Ok(nodes)
}

async fn insert_detail(
    conn: &Connection,
    item_id: NodeId,
    collection_id: Option<i64>,
    detail: &Detail,
) -> Result<(), StoreError> {
    let mut bool_value: Option<i64> = None;
    let mut int_value: Option<i64> = None;
    let mut link_value: Option<i64> = None;
    let mut double_value: Option<f64> = None;
    let mut datetime_value: Option<String> = None;
    let mut string_value: Option<&str> = None;
    let mut blob_value: Option<Vec<u8>> = None;

    match &detail.value {
        DetailValue::Bool(b) => bool_value = Some(i64::from(*b)),
        DetailValue::Int(i) => int_value = Some(*i),
        DetailValue::Link(id) => link_value = Some(*id),
        DetailValue::Double(d) => double_value = Some(*d),
        DetailValue::DateTime(dt) => datetime_value = Some(format_timestamp(dt)),
        DetailValue::String(s) => string_value = Some(s.as_str()),
        DetailValue::Binary(b) => blob_value = Some(b.clone()),
    }

    conn.execute(
        "INSERT INTO details (type, item_id, detail_collection_id, name, bool_value, int_value,
                              link_value, double_value, datetime_value, string_value, value)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            detail.kind().as_str(),
            item_id,
            collection_id,
            detail.name.as_str(),
            bool_value,
            int_value,
            link_value,
            double_value,
            datetime_value,
            string_value,
            blob_value,
        ),
    )
    .await
    .map_err(|e| {
        StoreError::sql_execution(format!(
            "Failed to insert detail '{}' of item {}: {}",
            detail.name, item_id, e
        ))
    })?;
    Ok(())
}

/// Write roles, details and collections of `node` (rows must not exist yet)
async fn insert_owned(conn: &Connection, node: &ContentNode) -> Result<(), StoreError> {
    for role in &node.authorized_roles {
        conn.execute(
            "INSERT INTO authorized_roles (item_id, role) VALUES (?, ?)",
            (node.id, role.as_str()),
        )
        .await?;
    }

    for detail in node.details.details() {
        insert_detail(conn, node.id, None, &detail).await?;
    }

    for collection in node.details.collections() {
        conn.execute(
            "INSERT INTO detail_collections (item_id, name) VALUES (?, ?)",
            (node.id, collection.name.as_str()),
        )
        .await?;
        let collection_id = conn.last_insert_rowid();
        for detail in collection.iter() {
            insert_detail(conn, node.id, Some(collection_id), detail).await?;
        }
    }

    Ok(())
}

async fn delete_owned(conn: &Connection, id: NodeId) -> Result<(), StoreError> {
    conn.execute("DELETE FROM details WHERE item_id = ?", [id])
        .await?;
    conn.execute("DELETE FROM detail_collections WHERE item_id = ?", [id])
        .await?;
    conn.execute("DELETE FROM authorized_roles WHERE item_id = ?", [id])
        .await?;
    Ok(())
}

async fn apply(conn: &Connection, operation: &StoreOperation) -> Result<Option<NodeId>, StoreError> {
    match operation {
        StoreOperation::Insert(node) => {
            if !node.is_transient() {
                return Err(StoreError::constraint(format!(
                    "cannot insert item {} that already has an id",
                    node.id
                )));
            }
            conn.execute(
                "INSERT INTO items (type, created, published, updated, expires, name, zone_name,
                                    title, sort_order, visible, saved_by, version_of_id, parent_id)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    node.type_tag.as_str(),
                    format_timestamp(&node.created),
                    node.published.as_ref().map(format_timestamp),
                    format_timestamp(&node.updated),
                    node.expires.as_ref().map(format_timestamp),
                    node.name.as_str(),
                    node.zone_name.as_deref(),
                    node.title.as_str(),
                    node.sort_order.map(i64::from),
                    i64::from(node.visible),
                    node.saved_by.as_deref(),
                    node.version_of_id,
                    node.parent_id,
                ),
            )
            .await
            .map_err(|e| {
                StoreError::sql_execution(format!("Failed to insert item '{}': {}", node.name, e))
            })?;

            let id = conn.last_insert_rowid();
            let mut stored = node.clone();
            stored.id = id;
            insert_owned(conn, &stored).await?;
            Ok(Some(id))
        }
        StoreOperation::Update(node) => {
            let affected = conn
                .execute(
                    "UPDATE items SET type = ?, created = ?, published = ?, updated = ?, expires = ?,
                                      name = ?, zone_name = ?, title = ?, sort_order = ?, visible = ?,
                                      saved_by = ?, version_of_id = ?, parent_id = ?
                     WHERE id = ?",
                    (
                        node.type_tag.as_str(),
                        format_timestamp(&node.created),
                        node.published.as_ref().map(format_timestamp),
                        format_timestamp(&node.updated),
                        node.expires.as_ref().map(format_timestamp),
                        node.name.as_str(),
                        node.zone_name.as_deref(),
                        node.title.as_str(),
                        node.sort_order.map(i64::from),
                        i64::from(node.visible),
                        node.saved_by.as_deref(),
                        node.version_of_id,
                        node.parent_id,
                        node.id,
                    ),
                )
                .await
                .map_err(|e| {
                    StoreError::sql_execution(format!("Failed to update item {}: {}", node.id, e))
                })?;
            if affected == 0 {
                return Err(StoreError::MissingItem(node.id));
            }

            delete_owned(conn, node.id).await?;
            insert_owned(conn, node).await?;
            Ok(None)
        }
        StoreOperation::Reorder { id, sort_order } => {
            let affected = conn
                .execute(
                    "UPDATE items SET sort_order = ? WHERE id = ?",
                    (i64::from(*sort_order), *id),
                )
                .await?;
            if affected == 0 {
                return Err(StoreError::MissingItem(*id));
            }
            Ok(None)
        }
        StoreOperation::Reparent {
            id,
            parent_id,
            sort_order,
        } => {
            let affected = conn
                .execute(
                    "UPDATE items SET parent_id = ?, sort_order = ? WHERE id = ?",
                    (*parent_id, i64::from(*sort_order), *id),
                )
                .await
                .map_err(|e| {
                    StoreError::sql_execution(format!(
                        "Failed to move item {} under {}: {}",
                        id, parent_id, e
                    ))
                })?;
            if affected == 0 {
                return Err(StoreError::MissingItem(*id));
            }
            Ok(None)
        }
        StoreOperation::Delete(id) => {
            let affected = conn
                .execute("DELETE FROM items WHERE id = ?", [*id])
                .await
                .map_err(|e| {
                    StoreError::sql_execution(format!("Failed to delete item {}: {}", id, e))
                })?;
            if affected == 0 {
                return Err(StoreError::MissingItem(*id));
            }
            Ok(None)
        }
    }
}

#[async_trait]
impl ContentStore for LibsqlStore {
    async fn load_node(&self, id: NodeId) -> Result<Option<ContentNode>, StoreError> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {} FROM items WHERE id = ?", ITEM_COLUMNS);
        Ok(query_nodes(&conn, &sql, [id]).await?.into_iter().next())
    }

    async fn load_root(&self) -> Result<Option<ContentNode>, StoreError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM items WHERE parent_id IS NULL ORDER BY id LIMIT 1",
            ITEM_COLUMNS
        );
        Ok(query_nodes(&conn, &sql, ()).await?.into_iter().next())
    }

    async fn load_children(&self, parent_id: NodeId) -> Result<Vec<ContentNode>, StoreError> {
        let conn = self.conn.lock().await;
        let sql = format!(
            "SELECT {} FROM items WHERE parent_id = ?
             ORDER BY sort_order IS NULL, sort_order, id",
            ITEM_COLUMNS
        );
        query_nodes(&conn, &sql, [parent_id]).await
    }

    async fn commit(&self, changes: ChangeSet) -> Result<Vec<NodeId>, StoreError> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.lock().await;

        conn.execute("BEGIN TRANSACTION", ()).await.map_err(|e| {
            StoreError::sql_execution(format!("Failed to begin transaction: {}", e))
        })?;

        let mut assigned = Vec::new();
        for operation in changes.operations() {
            match apply(&conn, operation).await {
                Ok(Some(id)) => assigned.push(id),
                Ok(None) => {}
                Err(e) => {
                    let _rollback = conn.execute("ROLLBACK", ()).await;
                    tracing::warn!("Rolled back content commit: {}", e);
                    return Err(e);
                }
            }
        }

        if let Err(e) = conn.execute("COMMIT", ()).await {
            let _rollback = conn.execute("ROLLBACK", ()).await;
            return Err(StoreError::sql_execution(format!(
                "Failed to commit transaction: {}",
                e
            )));
        }

        Ok(assigned)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM items").await?;
        let mut rows = stmt.query(()).await?;
        let count: i64 = match rows.next().await? {
            Some(row) => row.get(0)?,
            None => 0,
        };
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn count_rows(store: &LibsqlStore, table: &str) -> i64 {
        let conn = store.conn.lock().await;
        let mut stmt = conn
            .prepare(&format!("SELECT COUNT(*) FROM {}", table))
            .await
            .unwrap();
        let mut rows = stmt.query(()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        row.get(0).unwrap()
    }

    fn owning_node(name: &str, parent_id: NodeId) -> ContentNode {
        let mut node = ContentNode::new("page", name, name);
        node.parent_id = Some(parent_id);
        node.details.set("Text", format!("{} body", name));
        if let Some(tags) = node.details.collection_mut("Tags", true) {
            tags.push(Detail::new("tag", "rust"));
        }
        node.authorized_roles.push("Editors".to_string());
        node
    }

    #[tokio::test]
    async fn test_subtree_delete_leaves_no_owned_rows() {
        let store = LibsqlStore::open_in_memory().await.unwrap();

        let mut changes = ChangeSet::new();
        changes.insert(ContentNode::new("root", "", "Home"));
        let root_id = store.commit(changes).await.unwrap()[0];

        let mut changes = ChangeSet::new();
        changes.insert(owning_node("a", root_id));
        let a_id = store.commit(changes).await.unwrap()[0];

        let mut changes = ChangeSet::new();
        changes.insert(owning_node("b", a_id));
        changes.insert(owning_node("keep", root_id));
        store.commit(changes).await.unwrap();

        assert_eq!(count_rows(&store, "details").await, 6);
        assert_eq!(count_rows(&store, "detail_collections").await, 3);
        assert_eq!(count_rows(&store, "authorized_roles").await, 3);

        let mut changes = ChangeSet::new();
        changes.delete(a_id);
        store.commit(changes).await.unwrap();

        assert_eq!(count_rows(&store, "items").await, 2);
        assert_eq!(count_rows(&store, "details").await, 2);
        assert_eq!(count_rows(&store, "detail_collections").await, 1);
        assert_eq!(count_rows(&store, "authorized_roles").await, 1);
    }
}
