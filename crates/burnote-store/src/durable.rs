//! Durable implementation of the NoteStore trait over a [`KvBackend`].
//!
//! # Atomicity
//!
//! Every logical operation here is a sequence of independent round trips to
//! the backend: content fetch, access count, access append. Only the last
//! step is allowed to change state, and it is the backend's conditional
//! [`append_bounded`](KvBackend::append_bounded): the budget is re-checked on
//! the backend in the same atomic step that appends the record. The earlier
//! count read only decides which error to report (exhaustion before expiry);
//! it never grants a read on its own. Two racing readers of a one-read note
//! may both pass the count read, but only one append lands and the other
//! reports `ReadsExhausted`. The append is also guarded on the note document
//! still existing, so a reader racing `purge_if_dead` gets `NotFound` rather
//! than a fresh budget from the deleted access list.
//!
//! Durability and network transparency are bought with this extra round trip.
//! If the backend fails after the count read but before the append is
//! acknowledged, the read is reported as `Unavailable`, never as success. The
//! append itself may or may not have landed in that case, so an unlucky
//! reader can lose one read of the budget without receiving the note.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use burnote_core::{
    now_millis, AccessRecord, LogEntry, LogId, Note, NoteId, NoteReadOptions,
};

use crate::error::{Result, StoreError};
use crate::kv::{log_key, note_key, reads_key, AppendOutcome, KvBackend};
use crate::traits::NoteStore;

/// Note store persisted in an external key-value service.
///
/// Layout: `note-{id}` holds the note as a JSON document, `read-{id}` is the
/// list of JSON access records, `log-{id}` holds a log entry.
pub struct DurableStore<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> DurableStore<B> {
    /// Wrap a backend. The store is not started.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get the backend reference.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn load_note(&self, id: &NoteId) -> Result<Note> {
        let raw = self
            .backend
            .get(&note_key(id))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("note {}", id)))?;
        decode(&raw)
    }
}

#[async_trait]
impl<B: KvBackend> NoteStore for DurableStore<B> {
    async fn start(&self) -> Result<()> {
        if !self.backend.is_connected().await {
            info!("connecting durable note store");
        }
        self.backend.connect().await
    }

    async fn stop(&self) -> Result<()> {
        info!("disconnecting durable note store");
        self.backend.disconnect().await
    }

    async fn store_note(&self, note: &Note) -> Result<NoteId> {
        let id = NoteId::generate();
        let key = note_key(&id);
        debug!(note = %id, key = %key, "storing note");

        // The access list starts out absent, which reads as empty.
        self.backend.put(&key, &encode(note)?).await?;
        Ok(id)
    }

    async fn get_note(&self, id: &NoteId, options: &NoteReadOptions) -> Result<Note> {
        let note = self.load_note(id).await?;
        let reads_key = reads_key(id);

        if options.check_allowed_reads {
            let reads = self.backend.list_len(&reads_key).await?;
            if note.is_exhausted(reads) {
                return Err(StoreError::ReadsExhausted {
                    allowed: note.allowed_reads,
                    reads,
                });
            }
        }

        let now = now_millis();
        if options.check_burn_date && note.is_burned(now) {
            return Err(StoreError::Expired {
                burn_date: note.burn_date,
                now,
            });
        }

        if options.add_access {
            let record = encode(&AccessRecord::new(options.context.clone(), now))?;
            let limit = options
                .check_allowed_reads
                .then_some(u64::from(note.allowed_reads));

            match self
                .backend
                .append_bounded(&reads_key, &record, limit, &note_key(id))
                .await?
            {
                AppendOutcome::Appended(reads) => {
                    debug!(note = %id, reads, "note was read");
                }
                AppendOutcome::LimitReached(reads) => {
                    warn!(note = %id, reads, "lost race for last read");
                    return Err(StoreError::ReadsExhausted {
                        allowed: note.allowed_reads,
                        reads,
                    });
                }
                AppendOutcome::GuardMissing => {
                    debug!(note = %id, "note purged during read");
                    return Err(StoreError::NotFound(format!("note {}", id)));
                }
            }
        }

        Ok(note)
    }

    async fn note_exists(&self, id: &NoteId) -> Result<bool> {
        self.backend.exists(&note_key(id)).await
    }

    async fn has_burned(&self, id: &NoteId) -> Result<bool> {
        let note = self.load_note(id).await?;
        Ok(note.is_burned(now_millis()))
    }

    async fn has_been_read(&self, id: &NoteId) -> Result<bool> {
        let note = self.load_note(id).await?;
        let reads = self.backend.list_len(&reads_key(id)).await?;
        Ok(note.is_exhausted(reads))
    }

    async fn accesses(&self, id: &NoteId) -> Result<Vec<AccessRecord>> {
        if !self.note_exists(id).await? {
            return Err(StoreError::NotFound(format!("note {}", id)));
        }
        self.backend
            .list_items(&reads_key(id))
            .await?
            .iter()
            .map(|raw| decode(raw))
            .collect()
    }

    async fn purge_if_dead(&self, id: &NoteId) -> Result<bool> {
        let note = match self.load_note(id).await {
            Ok(note) => note,
            Err(StoreError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };

        // Death is monotonic, so deleting after this check cannot remove a
        // live note. Readers already past their content fetch are stopped by
        // the guarded append once the note document is gone.
        let reads = self.backend.list_len(&reads_key(id)).await?;
        if !note.is_dead(reads, now_millis()) {
            return Ok(false);
        }

        self.backend
            .delete(&[note_key(id), reads_key(id)])
            .await?;
        debug!(note = %id, "purged dead note");
        Ok(true)
    }

    async fn store_log(&self, entry: &LogEntry) -> Result<LogId> {
        let id = LogId::generate();
        let key = log_key(&id);
        debug!(log = %id, key = %key, "storing log");
        self.backend.put(&key, &encode(entry)?).await?;
        Ok(id)
    }

    async fn get_log(&self, id: &LogId) -> Result<LogEntry> {
        let raw = self
            .backend
            .get(&log_key(id))
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("log {}", id)))?;
        debug!(log = %id, "log was read");
        decode(&raw)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteKv;
    use bytes::Bytes;
    use std::sync::Arc;

    async fn started_store() -> DurableStore<SqliteKv> {
        let store = DurableStore::new(SqliteKv::open_memory());
        store.start().await.unwrap();
        store
    }

    fn make_note(allowed_reads: u32, burn_in_ms: i64) -> Note {
        Note {
            allowed_reads,
            encrypted_message: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            fingerprint: Bytes::from_static(&[0x01; 32]),
            initialization_vector: Bytes::from_static(&[0x02; 12]),
            salt: Bytes::from_static(&[0x03; 16]),
            burn_date: now_millis() + burn_in_ms,
            encryption_scheme: Some("PBKDF2+AES-GCM".into()),
        }
    }

    #[tokio::test]
    async fn test_store_and_read_once() {
        let store = started_store().await;
        let note = make_note(1, 3_600_000);
        let id = store.store_note(&note).await.unwrap();

        let read = store
            .get_note(&id, &NoteReadOptions::default())
            .await
            .unwrap();
        assert_eq!(read, note);

        let again = store.get_note(&id, &NoteReadOptions::default()).await;
        assert!(matches!(again, Err(StoreError::ReadsExhausted { .. })));
        assert!(store.has_been_read(&id).await.unwrap());
    }

    #[tokio::test]
    async fn test_documents_use_expected_keys() {
        let store = started_store().await;
        let id = store.store_note(&make_note(2, 3_600_000)).await.unwrap();
        store
            .get_note(&id, &NoteReadOptions::default())
            .await
            .unwrap();

        let backend = store.backend();
        assert!(backend.exists(&format!("note-{}", id)).await.unwrap());
        assert_eq!(backend.list_len(&format!("read-{}", id)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_operations_before_start_are_unavailable() {
        let store = DurableStore::new(SqliteKv::open_memory());
        let err = store.store_note(&make_note(1, 1_000)).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_corrupt_note_document_is_serialization_error() {
        let store = started_store().await;
        let id = NoteId::generate();
        store
            .backend()
            .put(&note_key(&id), "{not json")
            .await
            .unwrap();

        let err = store
            .get_note(&id, &NoteReadOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reads_respect_budget() {
        let store = Arc::new(started_store().await);
        let id = store.store_note(&make_note(3, 3_600_000)).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store.get_note(&id, &NoteReadOptions::default()).await
                })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(StoreError::ReadsExhausted { .. }) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(ok, 3);
        assert_eq!(store.accesses(&id).await.unwrap().len(), 3);
    }

    /// Delegates to SQLite and purges `armed` from a second store just
    /// before the next access count is read.
    struct PurgeDuringCount {
        inner: SqliteKv,
        purger: DurableStore<SqliteKv>,
        armed: std::sync::Mutex<Option<NoteId>>,
    }

    #[async_trait]
    impl KvBackend for PurgeDuringCount {
        async fn connect(&self) -> Result<()> {
            self.inner.connect().await
        }

        async fn disconnect(&self) -> Result<()> {
            self.inner.disconnect().await
        }

        async fn is_connected(&self) -> bool {
            self.inner.is_connected().await
        }

        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn exists(&self, key: &str) -> Result<bool> {
            self.inner.exists(key).await
        }

        async fn put(&self, key: &str, value: &str) -> Result<()> {
            self.inner.put(key, value).await
        }

        async fn list_len(&self, key: &str) -> Result<u64> {
            let armed = self.armed.lock().unwrap().take();
            if let Some(id) = armed {
                assert!(self.purger.purge_if_dead(&id).await.unwrap());
            }
            self.inner.list_len(key).await
        }

        async fn list_items(&self, key: &str) -> Result<Vec<String>> {
            self.inner.list_items(key).await
        }

        async fn append_bounded(
            &self,
            key: &str,
            item: &str,
            limit: Option<u64>,
            guard: &str,
        ) -> Result<AppendOutcome> {
            self.inner.append_bounded(key, item, limit, guard).await
        }

        async fn delete(&self, keys: &[String]) -> Result<()> {
            self.inner.delete(keys).await
        }
    }

    #[tokio::test]
    async fn test_purge_during_read_does_not_refill_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");

        let purger = DurableStore::new(SqliteKv::open(&path));
        purger.start().await.unwrap();
        let reader = DurableStore::new(PurgeDuringCount {
            inner: SqliteKv::open(&path),
            purger,
            armed: std::sync::Mutex::new(None),
        });
        reader.start().await.unwrap();

        let id = reader.store_note(&make_note(1, 3_600_000)).await.unwrap();
        reader
            .get_note(&id, &NoteReadOptions::default())
            .await
            .unwrap();

        *reader.backend().armed.lock().unwrap() = Some(id);
        let err = reader
            .get_note(&id, &NoteReadOptions::default())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(!reader.note_exists(&id).await.unwrap());
        assert_eq!(reader.backend().list_len(&reads_key(&id)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_purge_during_unchecked_burn_read_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");

        let purger = DurableStore::new(SqliteKv::open(&path));
        purger.start().await.unwrap();
        let reader = DurableStore::new(PurgeDuringCount {
            inner: SqliteKv::open(&path),
            purger,
            armed: std::sync::Mutex::new(None),
        });
        reader.start().await.unwrap();

        let id = reader.store_note(&make_note(3, -1)).await.unwrap();
        *reader.backend().armed.lock().unwrap() = Some(id);

        let options = NoteReadOptions::default().with_check_burn_date(false);
        let err = reader.get_note(&id, &options).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unbounded_append_when_budget_unchecked() {
        let store = started_store().await;
        let id = store.store_note(&make_note(1, 3_600_000)).await.unwrap();
        let unchecked = NoteReadOptions::default().with_check_allowed_reads(false);

        for _ in 0..4 {
            store.get_note(&id, &unchecked).await.unwrap();
        }

        assert_eq!(store.accesses(&id).await.unwrap().len(), 4);
        assert!(store.has_been_read(&id).await.unwrap());
    }
}
