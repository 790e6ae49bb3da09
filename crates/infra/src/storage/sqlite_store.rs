//! SQLite-backed key-value store
//!
//! A single `kv` table holds the session and queue entries. Calls run on the
//! blocking pool; the connection sits behind a mutex.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use clearhold_common::{KeyValueStore, StorageError, StorageResult};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task;
use tracing::info;

use crate::errors::sql_to_storage_error;

const SCHEMA_SQL: &str = "CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
)";

/// Durable [`KeyValueStore`]
#[derive(Clone)]
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
}

impl SqliteKeyValueStore {
    /// Open (or create) the store at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|err| {
                StorageError::Unavailable(format!("cannot create {}: {err}", parent.display()))
            })?;
        }

        let conn = Connection::open(&path).map_err(sql_to_storage_error)?;
        let store = Self::init(conn, Some(path))?;
        info!(db_path = ?store.path, "key-value store opened");
        Ok(store)
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory().map_err(sql_to_storage_error)?;
        Self::init(conn, None)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StorageResult<Self> {
        conn.execute_batch(SCHEMA_SQL).map_err(sql_to_storage_error)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)), path })
    }

    async fn with_conn<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        task::spawn_blocking(move || {
            let conn = conn.lock();
            op(&conn).map_err(sql_to_storage_error)
        })
        .await
        .map_err(|err| StorageError::Backend(format!("storage task failed: {err}")))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| row.get(0))
                .optional()
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv (key, value, updated_at)
                 VALUES (?1, ?2, CAST(strftime('%s','now') AS INTEGER))
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                updated_at = excluded.updated_at",
                params![key, value],
            )
            .map(|_| ())
        })
        .await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key]).map(|_| ())
        })
        .await
    }

    async fn remove_many(&self, keys: &[&str]) -> StorageResult<()> {
        let keys: Vec<String> = keys.iter().map(|k| (*k).to_string()).collect();
        self.with_conn(move |conn| {
            let tx = conn.unchecked_transaction()?;
            for key in &keys {
                tx.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            }
            tx.commit()
        })
        .await
    }
}
