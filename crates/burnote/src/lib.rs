//! # Burnote
//!
//! Storage for burn-after-reading notes: encrypted payloads that can be read
//! a bounded number of times before a burn date, and never after.
//!
//! ## Overview
//!
//! Clients encrypt locally and upload only ciphertext, so this crate never
//! sees plaintext. What it guarantees is access control:
//!
//! - **Read budget**: a note with `allowed_reads = N` is handed out at most N
//!   times, however many requests race for it
//! - **Burn date**: from its burn date on, a note is unreadable
//! - **Status checks**: a note's fate can be inspected without spending a read
//! - **Request logs**: write-once audit records, correlated with reads
//!
//! ## Usage
//!
//! ```rust,no_run
//! use burnote::{open_store, StoreConfig, NoteReadOptions};
//!
//! async fn example() {
//!     // Pick the backend from BURNOTE_STORE and friends
//!     let config = StoreConfig::from_env().unwrap();
//!     let store = open_store(&config).unwrap();
//!     store.start().await.unwrap();
//!
//!     // let id = store.store_note(&note).await.unwrap();
//!     // let note = store.get_note(&id, &NoteReadOptions::default()).await.unwrap();
//!
//!     store.stop().await.unwrap();
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `burnote::core` - Data model (Note, NoteId, NoteReadOptions, ...)
//! - `burnote::store` - Store trait and implementations

pub mod config;
pub mod error;
mod open;

// Re-export component crates
pub use burnote_core as core;
pub use burnote_store as store;

pub use config::{BackendConfig, StoreConfig};
pub use error::{BurnoteError, Result};
pub use open::open_store;

// Re-export commonly used types
pub use burnote_core::{
    validate_note, AccessContext, AccessRecord, LogEntry, LogId, Note, NoteId, NoteReadOptions,
};
pub use burnote_store::{NoteStatus, NoteStore, NoteStoreExt, StoreError};
