//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use burnote_core::{AccessContext, LogEntry, LogId, Note, NoteReadOptions};

/// Generate opaque bytes of at most `max_len` bytes (at least one).
pub fn opaque_bytes(max_len: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 1..=max_len).prop_map(Bytes::from)
}

/// Generate a read budget.
pub fn allowed_reads() -> impl Strategy<Value = u32> {
    1u32..=8
}

/// Generate a burn date anywhere from the epoch to far in the future.
pub fn burn_date() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}

/// Generate an optional cipher description.
pub fn encryption_scheme() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[A-Za-z0-9/+-]{1,32}")
}

/// Generate a note with arbitrary content.
pub fn note() -> impl Strategy<Value = Note> {
    (
        allowed_reads(),
        opaque_bytes(512),
        opaque_bytes(64),
        opaque_bytes(16),
        prop::collection::vec(any::<u8>(), 0..=32),
        burn_date(),
        encryption_scheme(),
    )
        .prop_map(
            |(allowed_reads, message, fingerprint, iv, salt, burn_date, scheme)| Note {
                allowed_reads,
                encrypted_message: message,
                fingerprint,
                initialization_vector: iv,
                salt: Bytes::from(salt),
                burn_date,
                encryption_scheme: scheme,
            },
        )
}

/// Generate a log entry.
pub fn log_entry() -> impl Strategy<Value = LogEntry> {
    (
        "[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}",
        "/[a-z0-9/-]{0,64}",
        0i64..=i64::MAX / 2,
    )
        .prop_map(|(source, path, timestamp)| LogEntry {
            source,
            path,
            timestamp,
        })
}

/// Generate read options with arbitrary switches.
pub fn read_options() -> impl Strategy<Value = NoteReadOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(check_reads, check_burn, add_access, with_log)| {
            let context = if with_log {
                AccessContext::for_log(LogId::generate())
            } else {
                AccessContext::default()
            };
            NoteReadOptions {
                check_allowed_reads: check_reads,
                check_burn_date: check_burn,
                add_access,
                context,
            }
        },
    )
}
