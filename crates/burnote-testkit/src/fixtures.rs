//! Test fixtures and helpers.
//!
//! Common setup code for store tests.

use bytes::Bytes;

use burnote_core::{now_millis, LogEntry, Note};

/// One hour in milliseconds.
pub const HOUR_MS: i64 = 3_600_000;

/// Builder for notes used in tests.
///
/// Defaults to a single-read note burning one hour from now.
#[derive(Debug, Clone)]
pub struct NoteFixture {
    note: Note,
}

impl NoteFixture {
    pub fn new() -> Self {
        Self {
            note: Note {
                allowed_reads: 1,
                encrypted_message: Bytes::from_static(b"\x8f\x13\x07\x42encrypted body"),
                fingerprint: Bytes::from_static(&[0xab; 32]),
                initialization_vector: Bytes::from_static(&[0x11; 12]),
                salt: Bytes::from_static(&[0x5a; 16]),
                burn_date: now_millis() + HOUR_MS,
                encryption_scheme: Some("PBKDF2-SHA256/AES-256-GCM".into()),
            },
        }
    }

    pub fn allowed_reads(mut self, n: u32) -> Self {
        self.note.allowed_reads = n;
        self
    }

    /// Set the burn date relative to now.
    pub fn burn_in(mut self, ms: i64) -> Self {
        self.note.burn_date = now_millis() + ms;
        self
    }

    /// Burn date one millisecond in the past.
    pub fn burned(self) -> Self {
        self.burn_in(-1)
    }

    pub fn message(mut self, bytes: &[u8]) -> Self {
        self.note.encrypted_message = Bytes::copy_from_slice(bytes);
        self
    }

    pub fn scheme(mut self, scheme: Option<&str>) -> Self {
        self.note.encryption_scheme = scheme.map(String::from);
        self
    }

    pub fn build(self) -> Note {
        self.note
    }
}

impl Default for NoteFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A request log as the request layer would record it.
pub fn sample_log() -> LogEntry {
    LogEntry {
        source: "203.0.113.7".into(),
        path: "/api/note/3f0c3b9e-2a55-4c1e-9d8b-52f7a1b0c6d4".into(),
        timestamp: now_millis(),
    }
}

/// Install a test subscriber once. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}
