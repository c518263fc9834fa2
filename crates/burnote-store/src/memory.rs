//! In-memory implementation of the NoteStore trait.
//!
//! Used for tests and non-durable deployments. Everything is lost when the
//! store is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use burnote_core::{
    now_millis, AccessRecord, LogEntry, LogId, Note, NoteId, NoteReadOptions,
};

use crate::error::{Result, StoreError};
use crate::traits::NoteStore;

/// In-memory store implementation.
///
/// The note map lock is only held long enough to look up or insert a slot.
/// Each note carries its own mutex around its access list, so contention is
/// scoped to a single note and the budget check plus append is one critical
/// section. No lock is ever held across an `.await`.
pub struct MemoryStore {
    notes: RwLock<HashMap<NoteId, Arc<NoteSlot>>>,
    logs: RwLock<HashMap<LogId, LogEntry>>,
}

struct NoteSlot {
    note: Note,
    accesses: Mutex<Vec<AccessRecord>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(HashMap::new()),
            logs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of notes currently held, dead ones included.
    pub fn note_count(&self) -> Result<usize> {
        Ok(self.notes.read().map_err(poisoned)?.len())
    }

    fn slot(&self, id: &NoteId) -> Result<Arc<NoteSlot>> {
        let notes = self.notes.read().map_err(poisoned)?;
        notes.get(id).cloned().ok_or_else(|| note_not_found(id))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn start(&self) -> Result<()> {
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        Ok(())
    }

    async fn store_note(&self, note: &Note) -> Result<NoteId> {
        let id = NoteId::generate();
        let slot = Arc::new(NoteSlot {
            note: note.clone(),
            accesses: Mutex::new(Vec::new()),
        });

        self.notes.write().map_err(poisoned)?.insert(id, slot);
        debug!(note = %id, "stored note");
        Ok(id)
    }

    async fn get_note(&self, id: &NoteId, options: &NoteReadOptions) -> Result<Note> {
        let slot = self.slot(id)?;

        // Held from the budget check through the append.
        let mut accesses = slot.accesses.lock().map_err(poisoned)?;

        let reads = accesses.len() as u64;
        if options.check_allowed_reads && slot.note.is_exhausted(reads) {
            return Err(StoreError::ReadsExhausted {
                allowed: slot.note.allowed_reads,
                reads,
            });
        }

        let now = now_millis();
        if options.check_burn_date && slot.note.is_burned(now) {
            return Err(StoreError::Expired {
                burn_date: slot.note.burn_date,
                now,
            });
        }

        if options.add_access {
            accesses.push(AccessRecord::new(options.context.clone(), now));
            debug!(note = %id, reads = accesses.len(), "note was read");
        }

        Ok(slot.note.clone())
    }

    async fn note_exists(&self, id: &NoteId) -> Result<bool> {
        Ok(self.notes.read().map_err(poisoned)?.contains_key(id))
    }

    async fn has_burned(&self, id: &NoteId) -> Result<bool> {
        let slot = self.slot(id)?;
        Ok(slot.note.is_burned(now_millis()))
    }

    async fn has_been_read(&self, id: &NoteId) -> Result<bool> {
        let slot = self.slot(id)?;
        let reads = slot.accesses.lock().map_err(poisoned)?.len() as u64;
        Ok(slot.note.is_exhausted(reads))
    }

    async fn accesses(&self, id: &NoteId) -> Result<Vec<AccessRecord>> {
        let slot = self.slot(id)?;
        let accesses = slot.accesses.lock().map_err(poisoned)?;
        Ok(accesses.clone())
    }

    async fn purge_if_dead(&self, id: &NoteId) -> Result<bool> {
        // Lock order: map, then slot. Readers never take the map lock while
        // holding a slot.
        let mut notes = self.notes.write().map_err(poisoned)?;

        let dead = match notes.get(id) {
            Some(slot) => {
                let reads = slot.accesses.lock().map_err(poisoned)?.len() as u64;
                slot.note.is_dead(reads, now_millis())
            }
            None => return Ok(false),
        };

        if dead {
            notes.remove(id);
            debug!(note = %id, "purged dead note");
        }
        Ok(dead)
    }

    async fn store_log(&self, entry: &LogEntry) -> Result<LogId> {
        let id = LogId::generate();
        self.logs.write().map_err(poisoned)?.insert(id, entry.clone());
        debug!(log = %id, "stored log");
        Ok(id)
    }

    async fn get_log(&self, id: &LogId) -> Result<LogEntry> {
        let logs = self.logs.read().map_err(poisoned)?;
        logs.get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("log {}", id)))
    }
}

fn note_not_found(id: &NoteId) -> StoreError {
    StoreError::NotFound(format!("note {}", id))
}

fn poisoned<T>(e: PoisonError<T>) -> StoreError {
    StoreError::Unavailable(format!("lock poisoned: {}", e))
}
