//! SQLite implementation of the KvBackend trait.
//!
//! A local stand-in for a networked key-value service: durable across
//! restarts when file-backed, no server to run. Uses rusqlite with bundled
//! SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::info;

use burnote_core::now_millis;

use crate::error::{Result, StoreError};
use crate::kv::{AppendOutcome, KvBackend};
use crate::migration;

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// SQLite-based key-value backend.
///
/// The connection is opened by `connect` and dropped by `disconnect`. It is
/// guarded by a mutex, which together with immediate transactions makes
/// [`append_bounded`](KvBackend::append_bounded) atomic even when several
/// processes share the database file.
pub struct SqliteKv {
    location: Location,
    conn: Arc<Mutex<Option<Connection>>>,
    connected: Arc<AtomicBool>,
}

impl SqliteKv {
    /// Back the store with a database file, created on first connect.
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::with_location(Location::File(path.as_ref().to_path_buf()))
    }

    /// Back the store with an in-memory database.
    ///
    /// Contents are lost on `disconnect`. Useful for testing.
    pub fn open_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            conn: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Execute a blocking operation on the open connection.
    async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(poisoned)?;
            let conn = guard
                .as_mut()
                .ok_or_else(|| StoreError::Unavailable("sqlite backend not connected".into()))?;
            f(conn)
        })
        .await?
    }
}

#[async_trait]
impl KvBackend for SqliteKv {
    async fn connect(&self) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let connected = Arc::clone(&self.connected);
        let location = self.location.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(poisoned)?;
            if guard.is_some() {
                return Ok(());
            }

            let mut opened = match &location {
                Location::File(path) => Connection::open(path)?,
                Location::Memory => Connection::open_in_memory()?,
            };
            migration::migrate(&mut opened)?;
            *guard = Some(opened);
            connected.store(true, Ordering::Release);

            info!(location = ?location, "opened sqlite backend");
            Ok(())
        })
        .await?
    }

    async fn disconnect(&self) -> Result<()> {
        let conn = Arc::clone(&self.conn);
        let connected = Arc::clone(&self.connected);

        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(poisoned)?;
            connected.store(false, Ordering::Release);
            if let Some(open) = guard.take() {
                open.close().map_err(|(_, e)| StoreError::from(e))?;
            }
            Ok(())
        })
        .await?
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();

        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT value FROM documents WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
        })
        .await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let key = key.to_string();

        self.with_conn(move |conn| document_exists(conn, &key)).await
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let key = key.to_string();
        let value = value.to_string();

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO documents (key, value, written_at) VALUES (?1, ?2, ?3)",
                params![key, value, now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let key = key.to_string();

        self.with_conn(move |conn| count_items(conn, &key)).await
    }

    async fn list_items(&self, key: &str) -> Result<Vec<String>> {
        let key = key.to_string();

        self.with_conn(move |conn| {
            let mut stmt =
                conn.prepare("SELECT value FROM list_items WHERE key = ?1 ORDER BY position")?;
            let items = stmt
                .query_map(params![key], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<String>>>()?;
            Ok(items)
        })
        .await
    }

    async fn append_bounded(
        &self,
        key: &str,
        item: &str,
        limit: Option<u64>,
        guard: &str,
    ) -> Result<AppendOutcome> {
        let key = key.to_string();
        let item = item.to_string();
        let guard = guard.to_string();

        self.with_conn(move |conn| {
            // Immediate: take the write lock before counting.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if !document_exists(&tx, &guard)? {
                return Ok(AppendOutcome::GuardMissing);
            }

            let len = count_items(&tx, &key)?;
            if limit.is_some_and(|limit| len >= limit) {
                return Ok(AppendOutcome::LimitReached(len));
            }

            tx.execute(
                "INSERT INTO list_items (key, position, value) VALUES (?1, ?2, ?3)",
                params![key, len as i64, item],
            )?;
            tx.commit()?;

            Ok(AppendOutcome::Appended(len + 1))
        })
        .await
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        let keys = keys.to_vec();

        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            for key in &keys {
                tx.execute("DELETE FROM documents WHERE key = ?1", params![key])?;
                tx.execute("DELETE FROM list_items WHERE key = ?1", params![key])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}

fn document_exists(conn: &Connection, key: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM documents WHERE key = ?1)",
        params![key],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn count_items(conn: &Connection, key: &str) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM list_items WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )?;
    u64::try_from(count).map_err(|_| StoreError::InvalidData(format!("negative count for {}", key)))
}

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::Unavailable(format!("mutex poisoned: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected() -> SqliteKv {
        let kv = SqliteKv::open_memory();
        kv.connect().await.unwrap();
        kv
    }

    #[tokio::test]
    async fn test_put_and_get_document() {
        let kv = connected().await;

        assert_eq!(kv.get("note-a").await.unwrap(), None);
        assert!(!kv.exists("note-a").await.unwrap());

        kv.put("note-a", "{\"x\":1}").await.unwrap();
        assert_eq!(kv.get("note-a").await.unwrap().as_deref(), Some("{\"x\":1}"));
        assert!(kv.exists("note-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let kv = connected().await;
        kv.put("k", "v").await.unwrap();

        // A second connect must not reopen (and wipe) the in-memory database.
        kv.connect().await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect() {
        let kv = SqliteKv::open_memory();
        kv.disconnect().await.unwrap();
        assert!(!kv.is_connected().await);
    }

    #[tokio::test]
    async fn test_bounded_append() {
        let kv = connected().await;
        kv.put("note-x", "{}").await.unwrap();

        assert_eq!(
            kv.append_bounded("read-x", "a", Some(2), "note-x").await.unwrap(),
            AppendOutcome::Appended(1)
        );
        assert_eq!(
            kv.append_bounded("read-x", "b", Some(2), "note-x").await.unwrap(),
            AppendOutcome::Appended(2)
        );
        assert_eq!(
            kv.append_bounded("read-x", "c", Some(2), "note-x").await.unwrap(),
            AppendOutcome::LimitReached(2)
        );
        assert_eq!(
            kv.append_bounded("read-x", "d", None, "note-x").await.unwrap(),
            AppendOutcome::Appended(3)
        );

        assert_eq!(kv.list_items("read-x").await.unwrap(), vec!["a", "b", "d"]);
        assert_eq!(kv.list_len("read-missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_is_connected_does_not_take_connection_lock() {
        let kv = connected().await;
        let _busy = kv.conn.lock().unwrap();
        assert!(kv.is_connected().await);
    }

    #[tokio::test]
    async fn test_append_needs_guard_document() {
        let kv = connected().await;

        assert_eq!(
            kv.append_bounded("read-gone", "a", None, "note-gone")
                .await
                .unwrap(),
            AppendOutcome::GuardMissing
        );
        assert_eq!(kv.list_len("read-gone").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_removes_documents_and_lists() {
        let kv = connected().await;
        kv.put("note-y", "{}").await.unwrap();
        kv.append_bounded("read-y", "r", None, "note-y").await.unwrap();

        kv.delete(&["note-y".to_string(), "read-y".to_string(), "absent".to_string()])
            .await
            .unwrap();

        assert!(!kv.exists("note-y").await.unwrap());
        assert_eq!(kv.list_len("read-y").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_backend_survives_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");

        let kv = SqliteKv::open(&path);
        kv.connect().await.unwrap();
        kv.put("note-z", "persisted").await.unwrap();
        kv.disconnect().await.unwrap();

        assert!(kv.get("note-z").await.unwrap_err().is_retryable());

        let reopened = SqliteKv::open(&path);
        reopened.connect().await.unwrap();
        assert_eq!(
            reopened.get("note-z").await.unwrap().as_deref(),
            Some("persisted")
        );
    }
}
