//! # Burnote Testkit
//!
//! Testing utilities for Burnote stores.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Contract suite**: the behaviour every `NoteStore` must share, run per backend
//! - **Generators**: Proptest strategies for notes, logs and read options
//! - **Fixtures**: Note builders and a ready-made request log
//!
//! ## Contract Suite
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use burnote_store::MemoryStore;
//! use burnote_testkit::SharedStore;
//!
//! async fn memory() -> SharedStore {
//!     Arc::new(MemoryStore::new())
//! }
//!
//! burnote_testkit::store_contract_tests!(memory_contract, memory);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use burnote_testkit::generators::note;
//!
//! proptest! {
//!     #[test]
//!     fn budget_is_positive(note in note()) {
//!         prop_assert!(note.allowed_reads > 0);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use burnote_testkit::fixtures::NoteFixture;
//!
//! let note = NoteFixture::new().allowed_reads(3).burned().build();
//! assert_eq!(note.allowed_reads, 3);
//! ```

pub mod contract;
pub mod fixtures;
pub mod generators;

pub use contract::SharedStore;
pub use fixtures::{init_tracing, sample_log, NoteFixture, HOUR_MS};
