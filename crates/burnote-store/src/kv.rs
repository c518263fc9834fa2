//! Key-value backend abstraction used by the durable store.
//!
//! A backend stores two kinds of values under string keys: documents (single
//! strings, written once) and lists (append-only sequences of strings). An
//! absent list reads as empty.

use async_trait::async_trait;
use burnote_core::{LogId, NoteId};

use crate::error::Result;

/// Outcome of a bounded list append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The item was appended; the list now has this length.
    Appended(u64),
    /// The list already held at least `limit` items; nothing was written.
    LimitReached(u64),
    /// The guard document was absent; nothing was written.
    GuardMissing,
}

/// A networked or local key-value service.
///
/// Each method is a single round trip and is atomic on its own. Nothing is
/// atomic across calls; [`append_bounded`](KvBackend::append_bounded) is the
/// one conditional primitive the durable store builds its read invariant on.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Open the connection. Idempotent; concurrent callers share one connection.
    async fn connect(&self) -> Result<()>;

    /// Close the connection. Safe to call when not connected.
    async fn disconnect(&self) -> Result<()>;

    /// Whether the backend is connected.
    async fn is_connected(&self) -> bool;

    /// Read a document.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Check whether a document exists.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Write a document, replacing any previous value.
    async fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Length of a list.
    async fn list_len(&self, key: &str) -> Result<u64>;

    /// All items of a list, in append order.
    async fn list_items(&self, key: &str) -> Result<Vec<String>>;

    /// Append `item` to a list unless it already holds `limit` or more items
    /// or the document `guard` does not exist.
    ///
    /// Both checks and the append happen as one atomic step on the backend.
    /// With `limit = None` only the guard is checked.
    async fn append_bounded(
        &self,
        key: &str,
        item: &str,
        limit: Option<u64>,
        guard: &str,
    ) -> Result<AppendOutcome>;

    /// Delete documents and lists. Missing keys are ignored.
    async fn delete(&self, keys: &[String]) -> Result<()>;
}

/// Key of a note's content document.
pub fn note_key(id: &NoteId) -> String {
    format!("note-{}", id)
}

/// Key of a note's access list.
pub fn reads_key(id: &NoteId) -> String {
    format!("read-{}", id)
}

/// Key of a log document.
pub fn log_key(id: &LogId) -> String {
    format!("log-{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_share_the_id_text() {
        let id = NoteId::generate();
        assert_eq!(note_key(&id), format!("note-{}", id));
        assert_eq!(reads_key(&id), format!("read-{}", id));
        assert_ne!(note_key(&id), reads_key(&id));
    }

    #[test]
    fn test_log_key() {
        let id = LogId::generate();
        assert!(log_key(&id).starts_with("log-"));
        assert_eq!(log_key(&id).len(), "log-".len() + 36);
    }
}
