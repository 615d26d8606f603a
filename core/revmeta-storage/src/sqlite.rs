//! SQLite-backed store.
//!
//! Items and metadata live in two tables. Metadata rows are ordered by their
//! autoincrement id, which preserves insertion order per key. Values are
//! stored as JSON text so composites and empty strings survive unchanged.

use crate::{ContentStore, MetadataStore, StorageError, StorageResult};
use revmeta_model::{ContentItem, ItemKind};
use revmeta_types::{ItemId, MetaValue, SnapshotStamp};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        parent TEXT REFERENCES items(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        created_wall INTEGER NOT NULL,
        created_seq INTEGER NOT NULL,
        modified_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_items_parent ON items(parent, kind);

    CREATE TABLE IF NOT EXISTS meta (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner TEXT NOT NULL REFERENCES items(id) ON DELETE CASCADE,
        meta_key TEXT NOT NULL,
        meta_value TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_meta_owner_key ON meta(owner, meta_key);

    CREATE TABLE IF NOT EXISTS stamp_state (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        wall_time INTEGER NOT NULL,
        sequence INTEGER NOT NULL
    );
";

const ITEM_COLUMNS: &str = "id, kind, parent, title, body, created_wall, created_seq, modified_at";

/// Persistent store backed by a SQLite file.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        info!("opened revision store at {}", path.display());
        Self::with_connection(conn)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        match version {
            0 => {
                debug!("initializing revision store schema");
                conn.execute_batch(SCHEMA)?;
                conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
            }
            SCHEMA_VERSION => {}
            other => {
                return Err(StorageError::InvalidData(format!(
                    "unsupported schema version {other}, expected {SCHEMA_VERSION}"
                )));
            }
        }
        Ok(())
    }
}

type RawItem = (String, String, Option<String>, String, String, i64, i64, i64);

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<RawItem> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_item(raw: RawItem) -> StorageResult<ContentItem> {
    let (id, kind, parent, title, body, wall, seq, modified_at) = raw;
    let id = ItemId::parse(&id)
        .map_err(|e| StorageError::InvalidData(format!("bad item id {id}: {e}")))?;
    let kind = ItemKind::parse(&kind)
        .ok_or_else(|| StorageError::InvalidData(format!("bad item kind: {kind}")))?;
    let parent = parent
        .map(|p| {
            ItemId::parse(&p)
                .map_err(|e| StorageError::InvalidData(format!("bad parent id {p}: {e}")))
        })
        .transpose()?;
    Ok(ContentItem {
        id,
        kind,
        parent,
        title,
        body,
        created: SnapshotStamp::new(wall as u64, seq as u32),
        modified_at,
    })
}

fn require_item(conn: &Connection, id: &ItemId) -> StorageResult<()> {
    let found: Option<i64> = conn
        .query_row("SELECT 1 FROM items WHERE id = ?1", params![id.to_string()], |row| row.get(0))
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(StorageError::NotFound(id.to_string())),
    }
}

impl SqliteStore {
    fn query_items(
        &self,
        sql: &str,
        parent: &ItemId,
        kind: ItemKind,
    ) -> StorageResult<Vec<ContentItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params![parent.to_string(), kind.as_str()], item_from_row)?;
        let mut items = Vec::new();
        for row in rows {
            items.push(decode_item(row?)?);
        }
        Ok(items)
    }
}

impl ContentStore for SqliteStore {
    fn insert_item(&self, item: &ContentItem) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        if let Some(parent) = &item.parent {
            require_item(&conn, parent)?;
        }
        conn.execute(
            &format!("INSERT INTO items ({ITEM_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
            params![
                item.id.to_string(),
                item.kind.as_str(),
                item.parent.map(|p| p.to_string()),
                item.title,
                item.body,
                item.created.wall_time() as i64,
                i64::from(item.created.sequence()),
                item.modified_at,
            ],
        )?;
        Ok(())
    }

    fn update_item(&self, item: &ContentItem) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "UPDATE items SET title = ?2, body = ?3, modified_at = ?4 WHERE id = ?1",
            params![item.id.to_string(), item.title, item.body, item.modified_at],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(item.id.to_string()));
        }
        Ok(())
    }

    fn get_item(&self, id: &ItemId) -> StorageResult<Option<ContentItem>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id.to_string()],
                item_from_row,
            )
            .optional()?;
        raw.map(decode_item).transpose()
    }

    fn snapshots(&self, parent: &ItemId) -> StorageResult<Vec<ContentItem>> {
        self.query_items(
            &format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE parent = ?1 AND kind = ?2 \
                 ORDER BY created_wall DESC, created_seq DESC"
            ),
            parent,
            ItemKind::Snapshot,
        )
    }

    fn draft_for(&self, parent: &ItemId) -> StorageResult<Option<ContentItem>> {
        let drafts = self.query_items(
            &format!("SELECT {ITEM_COLUMNS} FROM items WHERE parent = ?1 AND kind = ?2 LIMIT 1"),
            parent,
            ItemKind::Draft,
        )?;
        Ok(drafts.into_iter().next())
    }

    fn delete_item(&self, id: &ItemId) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute("DELETE FROM items WHERE id = ?1", params![id.to_string()])?;
        if removed == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        debug!("deleted item {}", id);
        Ok(())
    }

    fn next_stamp(&self) -> StorageResult<SnapshotStamp> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let previous: Option<(i64, i64)> = tx
            .query_row(
                "SELECT wall_time, sequence FROM stamp_state WHERE id = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let stamp =
            SnapshotStamp::after(previous.map(|(w, s)| SnapshotStamp::new(w as u64, s as u32)));
        tx.execute(
            "INSERT OR REPLACE INTO stamp_state (id, wall_time, sequence) VALUES (1, ?1, ?2)",
            params![stamp.wall_time() as i64, i64::from(stamp.sequence())],
        )?;
        tx.commit()?;
        Ok(stamp)
    }
}

impl MetadataStore for SqliteStore {
    fn meta_keys(&self, owner: &ItemId) -> StorageResult<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT meta_key FROM meta WHERE owner = ?1 GROUP BY meta_key ORDER BY MIN(id)",
        )?;
        let keys = stmt
            .query_map(params![owner.to_string()], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    fn get_meta(&self, owner: &ItemId, key: &str) -> StorageResult<Vec<MetaValue>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT meta_value FROM meta WHERE owner = ?1 AND meta_key = ?2 ORDER BY id",
        )?;
        let raw = stmt
            .query_map(params![owner.to_string(), key], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        let mut values = Vec::with_capacity(raw.len());
        for r in raw {
            values.push(MetaValue::decode(&r)?);
        }
        Ok(values)
    }

    fn add_meta(&self, owner: &ItemId, key: &str, value: &MetaValue) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        require_item(&conn, owner)?;
        conn.execute(
            "INSERT INTO meta (owner, meta_key, meta_value) VALUES (?1, ?2, ?3)",
            params![owner.to_string(), key, value.encode()?],
        )?;
        Ok(())
    }

    fn delete_meta(&self, owner: &ItemId, key: &str) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let removed = conn.execute(
            "DELETE FROM meta WHERE owner = ?1 AND meta_key = ?2",
            params![owner.to_string(), key],
        )?;
        Ok(removed)
    }

    fn replace_meta_value(
        &self,
        owner: &ItemId,
        key: &str,
        previous: &MetaValue,
        value: &MetaValue,
    ) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        require_item(&conn, owner)?;
        let replaced = conn.execute(
            "UPDATE meta SET meta_value = ?4 WHERE owner = ?1 AND meta_key = ?2 AND meta_value = ?3",
            params![owner.to_string(), key, previous.encode()?, value.encode()?],
        )?;
        Ok(replaced)
    }
}
