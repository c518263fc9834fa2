//! # Burnote Core
//!
//! Pure data model for Burnote: sealed notes, their access records, request
//! logs, and the identifiers that address them.
//!
//! This crate contains no I/O, no storage, no networking. The server never
//! sees plaintext: every byte field on a [`Note`] is opaque client output.
//!
//! ## Key Types
//!
//! - [`Note`] - An immutable encrypted payload with a read budget and burn date
//! - [`NoteId`] / [`LogId`] - Random, unguessable UUID v4 identifiers
//! - [`NoteReadOptions`] - Enforcement switches for a single read
//! - [`AccessRecord`] - Evidence of one successful read
//! - [`LogEntry`] - Audit record of an inbound request

pub mod error;
pub mod note;
pub mod options;
pub mod time;
pub mod types;
pub mod validation;

pub use error::{IdError, ValidationError};
pub use note::{AccessContext, AccessRecord, LogEntry, Note};
pub use options::NoteReadOptions;
pub use time::now_millis;
pub use types::{LogId, NoteId};
pub use validation::validate_note;
