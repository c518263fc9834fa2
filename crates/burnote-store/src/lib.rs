//! # Burnote Store
//!
//! The note-access control engine: storage for sealed notes that enforces
//! read budgets and burn dates, plus write-once request logs.
//!
//! ## Overview
//!
//! Everything is behind the [`NoteStore`] trait, so the request layer does
//! not care where notes live. Two implementations exist:
//!
//! - [`MemoryStore`] - process-local, lost on restart
//! - [`DurableStore`] - persisted in a key-value service through [`KvBackend`]
//!
//! with two backends for the durable store:
//!
//! - [`RedisKv`] - a networked Redis server
//! - [`SqliteKv`] - a local SQLite file (or in-memory database)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use burnote_core::NoteReadOptions;
//! use burnote_store::{DurableStore, NoteStore, RedisKv};
//!
//! async fn example() {
//!     let store = DurableStore::new(RedisKv::open("redis://127.0.0.1/").unwrap());
//!     store.start().await.unwrap();
//!
//!     // let note: Note = ...;
//!     // let id = store.store_note(&note).await.unwrap();
//!     // let note = store.get_note(&id, &NoteReadOptions::default()).await.unwrap();
//!
//!     store.stop().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Read budget**: the budget check and the access append are one atomic
//!   step per note (a per-note mutex in memory, a conditional append on the
//!   backend for the durable store)
//! - **Ordered checks**: existence, then budget, then expiry, then recording
//! - **No retries**: a failed round trip surfaces as `Unavailable` once

pub mod durable;
pub mod error;
pub mod kv;
pub mod memory;
pub mod migration;
pub mod redis_kv;
pub mod sqlite;
pub mod traits;

pub use durable::DurableStore;
pub use error::{Result, StoreError};
pub use kv::{AppendOutcome, KvBackend};
pub use memory::MemoryStore;
pub use redis_kv::RedisKv;
pub use sqlite::SqliteKv;
pub use traits::{NoteStatus, NoteStore, NoteStoreExt};
