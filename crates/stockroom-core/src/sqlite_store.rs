use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::thread;
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::item::{Item, ItemId};
use crate::store::{new_item_id, ItemStore, Snapshot, SnapshotHub, StoreError, Subscription};

/// How often a file-backed store checks for commits from other connections.
pub const WATCH_INTERVAL: Duration = Duration::from_millis(250);

/// SQLite-backed implementation of the ItemStore trait.
///
/// Each item is one JSON document keyed by id, mirroring the layout of the
/// hosted `items` collection. While a file-backed store has subscribers, a
/// watcher thread polls `PRAGMA data_version` so commits made by other
/// connections or processes are published too.
pub struct SqliteItemStore {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<SqliteState>,
    hub: SnapshotHub,
    watch_interval: Option<Duration>,
}

struct SqliteState {
    conn: Connection,
    version: u64,
    data_version: i64,
    watching: bool,
}

impl SqliteItemStore {
    /// Open (or create) a database at the given path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Storage(format!("create dir: {}", e)))?;
            }
        }
        let conn =
            Connection::open(path).map_err(|e| StoreError::Storage(format!("open: {}", e)))?;
        tracing::debug!(path = %path.display(), "opened item database");
        Self::init_with_connection(conn, Some(WATCH_INTERVAL))
    }

    /// Create an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::Storage(format!("open_in_memory: {}", e)))?;
        Self::init_with_connection(conn, None)
    }

    /// Poll for external commits at `interval` instead of [`WATCH_INTERVAL`].
    ///
    /// Has no effect on in-memory stores, which no other connection can see.
    pub fn with_watch_interval(self, interval: Duration) -> Self {
        match Arc::try_unwrap(self.shared) {
            Ok(shared) => Self {
                shared: Arc::new(Shared {
                    watch_interval: shared.watch_interval.map(|_| interval),
                    ..shared
                }),
            },
            Err(shared) => Self { shared },
        }
    }

    fn init_with_connection(
        conn: Connection,
        watch_interval: Option<Duration>,
    ) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;

            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                doc TEXT NOT NULL,
                created INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_items_created ON items(created);
            ",
        )
        .map_err(|e| StoreError::Storage(format!("init_schema: {}", e)))?;
        let data_version = data_version(&conn)?;

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SqliteState {
                    conn,
                    version: 0,
                    data_version,
                    watching: false,
                }),
                hub: SnapshotHub::new(),
                watch_interval,
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, SqliteState>, StoreError> {
        self.shared.lock()
    }

    /// Start the external-commit watcher unless one is running.
    ///
    /// Called with the state lock held; the watcher clears `watching` under
    /// the same lock when the last subscriber leaves.
    fn ensure_watcher(&self, state: &mut SqliteState) {
        let Some(interval) = self.shared.watch_interval else {
            return;
        };
        if state.watching {
            return;
        }
        let shared = Arc::downgrade(&self.shared);
        let spawned = thread::Builder::new()
            .name("sqlite-watch".to_string())
            .spawn(move || watch(shared, interval));
        match spawned {
            Ok(_) => state.watching = true,
            Err(e) => tracing::warn!(error = %e, "failed to start sqlite watcher"),
        }
    }

    /// Every stored document as raw JSON, keyed by id.
    pub fn raw_documents(&self) -> Result<Vec<(ItemId, serde_json::Value)>, StoreError> {
        let state = self.lock()?;
        let mut stmt = state
            .conn
            .prepare("SELECT id, doc FROM items ORDER BY created, rowid")
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| StoreError::Storage(format!("raw_documents: {}", e)))?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, doc) = row.map_err(|e| StoreError::Storage(format!("row: {}", e)))?;
            let value = serde_json::from_str(&doc)
                .map_err(|e| StoreError::Storage(format!("document {}: {}", id, e)))?;
            docs.push((id, value));
        }
        Ok(docs)
    }

    /// Overwrite existing documents verbatim in one transaction.
    ///
    /// Ids that are not present are rejected and nothing is written.
    pub fn replace_documents(
        &self,
        docs: Vec<(ItemId, serde_json::Value)>,
    ) -> Result<usize, StoreError> {
        let mut state = self.lock()?;
        let tx = state
            .conn
            .transaction()
            .map_err(|e| StoreError::Storage(format!("begin: {}", e)))?;
        for (id, doc) in &docs {
            let body =
                serde_json::to_string(doc).map_err(|e| StoreError::Storage(e.to_string()))?;
            let rows = tx
                .execute("UPDATE items SET doc = ?2 WHERE id = ?1", params![id, body])
                .map_err(|e| StoreError::Storage(format!("replace: {}", e)))?;
            if rows == 0 {
                return Err(StoreError::NotFound(id.clone()));
            }
        }
        tx.commit()
            .map_err(|e| StoreError::Storage(format!("commit: {}", e)))?;

        if !docs.is_empty() {
            Self::bump_and_publish(&mut state, &self.shared.hub);
        }
        Ok(docs.len())
    }

    fn load_all(conn: &Connection) -> Result<Vec<Item>, StoreError> {
        let mut stmt = conn
            .prepare("SELECT id, doc FROM items ORDER BY created, rowid")
            .map_err(|e| StoreError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| StoreError::Storage(format!("list: {}", e)))?;

        let mut items = Vec::new();
        for row in rows {
            let (id, doc) = row.map_err(|e| StoreError::Storage(format!("row: {}", e)))?;
            match decode(&id, &doc) {
                Ok(item) => items.push(item),
                Err(e) => tracing::warn!(item_id = %id, error = %e, "skipping undecodable item"),
            }
        }
        Ok(items)
    }

    fn bump_and_publish(state: &mut SqliteState, hub: &SnapshotHub) {
        state.version += 1;
        match Self::load_all(&state.conn) {
            Ok(items) => hub.publish(Snapshot {
                version: state.version,
                items,
            }),
            Err(e) => tracing::error!(error = %e, "failed to build snapshot after write"),
        }
    }
}

impl Shared {
    fn lock(&self) -> Result<MutexGuard<'_, SqliteState>, StoreError> {
        self.state.lock().map_err(|e| StoreError::Storage(e.to_string()))
    }

    /// Publish a snapshot if another connection committed since the last check.
    fn poll_external(&self, state: &mut SqliteState) -> Result<bool, StoreError> {
        let current = data_version(&state.conn)?;
        if current == state.data_version {
            return Ok(false);
        }
        state.data_version = current;
        SqliteItemStore::bump_and_publish(state, &self.hub);
        Ok(true)
    }
}

fn watch(shared: Weak<Shared>, interval: Duration) {
    tracing::debug!("sqlite watcher started");
    loop {
        thread::sleep(interval);
        let Some(shared) = shared.upgrade() else {
            break;
        };
        let Ok(mut state) = shared.lock() else {
            break;
        };
        if shared.hub.subscriber_count() == 0 {
            state.watching = false;
            break;
        }
        match shared.poll_external(&mut state) {
            Ok(true) => tracing::debug!(version = state.version, "picked up external commit"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "failed to poll data_version"),
        }
    }
    tracing::debug!("sqlite watcher stopped");
}

fn data_version(conn: &Connection) -> Result<i64, StoreError> {
    conn.query_row("PRAGMA data_version", [], |row| row.get(0))
        .map_err(|e| StoreError::Storage(format!("data_version: {}", e)))
}

fn decode(id: &str, doc: &str) -> Result<Item, StoreError> {
    let mut item: Item = serde_json::from_str(doc)
        .map_err(|e| StoreError::Storage(format!("decode {}: {}", id, e)))?;
    // The key column is authoritative over any id inside the document.
    item.id = id.to_string();
    Ok(item)
}

impl ItemStore for SqliteItemStore {
    fn subscribe(&self) -> Result<Subscription, StoreError> {
        let mut state = self.lock()?;
        // Fold in anything committed elsewhere before taking the first snapshot.
        state.data_version = data_version(&state.conn)?;
        let items = Self::load_all(&state.conn)?;
        let subscription = self.shared.hub.subscribe(Snapshot {
            version: state.version,
            items,
        });
        self.ensure_watcher(&mut state);
        Ok(subscription)
    }

    fn list(&self) -> Result<Vec<Item>, StoreError> {
        let state = self.lock()?;
        Self::load_all(&state.conn)
    }

    fn get(&self, id: &str) -> Result<Option<Item>, StoreError> {
        let state = self.lock()?;
        let doc: Option<String> = state
            .conn
            .query_row("SELECT doc FROM items WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StoreError::Storage(format!("get: {}", e)))?;
        doc.map(|d| decode(id, &d)).transpose()
    }

    fn upsert_batch(&self, items: Vec<Item>) -> Result<Vec<ItemId>, StoreError> {
        let mut state = self.lock()?;
        let now = Utc::now().timestamp_millis();
        let tx = state
            .conn
            .transaction()
            .map_err(|e| StoreError::Storage(format!("begin: {}", e)))?;

        let mut ids = Vec::with_capacity(items.len());
        for mut item in items {
            if item.name.trim().is_empty() {
                // Dropping the transaction rolls back earlier rows.
                return Err(StoreError::Validation("item name is empty".to_string()));
            }
            if item.id.is_empty() {
                item.id = new_item_id();
            }
            let doc =
                serde_json::to_string(&item).map_err(|e| StoreError::Storage(e.to_string()))?;
            tx.execute(
                "INSERT INTO items (id, doc, created) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET doc = excluded.doc",
                params![item.id, doc, now],
            )
            .map_err(|e| StoreError::Storage(format!("upsert: {}", e)))?;
            ids.push(item.id);
        }
        tx.commit()
            .map_err(|e| StoreError::Storage(format!("commit: {}", e)))?;

        Self::bump_and_publish(&mut state, &self.shared.hub);
        Ok(ids)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        let rows = state
            .conn
            .execute("DELETE FROM items WHERE id = ?1", params![id])
            .map_err(|e| StoreError::Storage(format!("delete: {}", e)))?;
        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Self::bump_and_publish(&mut state, &self.shared.hub);
        Ok(())
    }
}
