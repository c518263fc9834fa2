//! Store construction from configuration.

use std::sync::Arc;

use burnote_store::{DurableStore, MemoryStore, NoteStore, RedisKv, SqliteKv};
use tracing::info;

use crate::config::{BackendConfig, StoreConfig};
use crate::error::Result;

/// Build the configured store.
///
/// The store is not started: the caller owns the handle and drives its
/// lifecycle with `start` and `stop`.
pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn NoteStore>> {
    let store: Arc<dyn NoteStore> = match &config.backend {
        BackendConfig::Memory => {
            info!("using in-memory note store");
            Arc::new(MemoryStore::new())
        }
        BackendConfig::Sqlite { path } => {
            info!(path = %path.display(), "using sqlite note store");
            Arc::new(DurableStore::new(SqliteKv::open(path)))
        }
        BackendConfig::Redis { url } => {
            info!("using redis note store");
            Arc::new(DurableStore::new(RedisKv::open(url)?))
        }
    };

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burnote_core::NoteId;

    #[tokio::test]
    async fn test_open_memory_store() {
        let store = open_store(&StoreConfig::memory()).unwrap();
        store.start().await.unwrap();
        assert!(!store.note_exists(&NoteId::generate()).await.unwrap());
        store.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_sqlite_store_needs_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&StoreConfig::sqlite(dir.path().join("notes.db"))).unwrap();

        let err = store.note_exists(&NoteId::generate()).await.unwrap_err();
        assert!(err.is_retryable());

        store.start().await.unwrap();
        assert!(!store.note_exists(&NoteId::generate()).await.unwrap());
        store.stop().await.unwrap();
    }

    #[test]
    fn test_open_redis_store_rejects_bad_url() {
        assert!(open_store(&StoreConfig::redis("definitely not a url")).is_err());
    }
}
