//! NoteStore trait: the abstract interface for note persistence and enforcement.
//!
//! This trait keeps the request layer storage-agnostic. Implementations
//! include the volatile [`MemoryStore`](crate::MemoryStore) and the durable
//! [`DurableStore`](crate::DurableStore) over any [`KvBackend`](crate::KvBackend).

use async_trait::async_trait;
use burnote_core::{AccessRecord, LogEntry, LogId, Note, NoteId, NoteReadOptions};

use crate::error::{Result, StoreError};

/// The NoteStore trait: async interface for notes, their access state, and logs.
///
/// Every method may suspend. Implementations must be safe to call
/// concurrently from many tasks against the same or different identifiers.
///
/// # The read invariant
///
/// For a note with `allowed_reads = N`, at most N calls to [`get_note`] with
/// `check_allowed_reads` and `add_access` set ever succeed, under any
/// interleaving. The budget check and the access append are one indivisible
/// step per note.
///
/// # `get_note` evaluation order
///
/// 1. Existence, else [`StoreError::NotFound`].
/// 2. Budget (if `check_allowed_reads`), else [`StoreError::ReadsExhausted`].
/// 3. Expiry (if `check_burn_date`), else [`StoreError::Expired`].
/// 4. Record access (if `add_access`).
/// 5. Return the note content.
///
/// A failing step short-circuits the rest; a failed call never records an access.
///
/// [`get_note`]: NoteStore::get_note
#[async_trait]
pub trait NoteStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Make the store ready for use. Idempotent.
    async fn start(&self) -> Result<()>;

    /// Release resources. Safe to call if never started.
    async fn stop(&self) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Notes
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a note with an empty access list and return its fresh identifier.
    async fn store_note(&self, note: &Note) -> Result<NoteId>;

    /// Fetch a note, enforcing and recording according to `options`.
    async fn get_note(&self, id: &NoteId, options: &NoteReadOptions) -> Result<Note>;

    /// Check whether a note is stored. Unknown identifiers yield `false`.
    async fn note_exists(&self, id: &NoteId) -> Result<bool>;

    /// True iff the current time is at or past the note's burn date.
    async fn has_burned(&self, id: &NoteId) -> Result<bool>;

    /// True iff the recorded accesses consume the note's read budget.
    async fn has_been_read(&self, id: &NoteId) -> Result<bool>;

    /// Access records of a note, in insertion order.
    async fn accesses(&self, id: &NoteId) -> Result<Vec<AccessRecord>>;

    /// Physically remove a note that is burned or read-exhausted.
    ///
    /// Returns `true` if something was removed. Afterwards the note answers
    /// exactly like one that never existed. Live and unknown notes are left
    /// alone and yield `false`.
    async fn purge_if_dead(&self, id: &NoteId) -> Result<bool>;

    // ─────────────────────────────────────────────────────────────────────────
    // Logs
    // ─────────────────────────────────────────────────────────────────────────

    /// Persist a log entry and return its fresh identifier.
    async fn store_log(&self, entry: &LogEntry) -> Result<LogId>;

    /// Fetch a log entry.
    async fn get_log(&self, id: &LogId) -> Result<LogEntry>;
}

/// Coarse fate of a note, as shown to a recipient before they spend a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteStatus {
    /// Readable right now.
    Available,
    /// Read budget consumed.
    Read,
    /// Burn date passed.
    Burned,
    /// Never existed, or was purged.
    Missing,
}

/// Extension trait for common store patterns.
pub trait NoteStoreExt: NoteStore {
    /// Determine a note's status without consuming a read.
    ///
    /// Read exhaustion wins over expiry, following `get_note`'s order.
    fn status(&self, id: &NoteId) -> impl std::future::Future<Output = Result<NoteStatus>> + Send;
}

impl<S: NoteStore + ?Sized> NoteStoreExt for S {
    async fn status(&self, id: &NoteId) -> Result<NoteStatus> {
        let options = NoteReadOptions::default().with_add_access(false);

        match self.get_note(id, &options).await {
            Ok(_) => Ok(NoteStatus::Available),
            Err(StoreError::ReadsExhausted { .. }) => Ok(NoteStatus::Read),
            Err(StoreError::Expired { .. }) => Ok(NoteStatus::Burned),
            Err(StoreError::NotFound(_)) => Ok(NoteStatus::Missing),
            Err(e) => Err(e),
        }
    }
}
