//! Notes, access records and request logs.
//!
//! A note is sealed on creation: its content never changes. What changes is
//! its access state, the list of [`AccessRecord`]s kept by the store. The
//! number of records is the authoritative count of reads consumed.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::types::LogId;

/// An encrypted note as uploaded by a client.
///
/// Every byte field is opaque to the server. `burn_date` is Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Note {
    /// Maximum number of successful recorded reads.
    pub allowed_reads: u32,
    /// Client-side ciphertext.
    pub encrypted_message: Bytes,
    /// Integrity digest over the plaintext, checked by the client.
    pub fingerprint: Bytes,
    /// Cipher initialization vector.
    pub initialization_vector: Bytes,
    /// Key-derivation salt.
    #[serde(default)]
    pub salt: Bytes,
    /// Instant (Unix ms) from which the note is unreadable.
    pub burn_date: i64,
    /// Free-form description of the client's cipher choice, stored verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_scheme: Option<String>,
}

impl Note {
    /// Returns true if the burn date has been reached at `now`.
    pub fn is_burned(&self, now: i64) -> bool {
        now >= self.burn_date
    }

    /// Returns true if `reads` recorded accesses consume the whole budget.
    pub fn is_exhausted(&self, reads: u64) -> bool {
        reads >= u64::from(self.allowed_reads)
    }

    /// Returns true if the note can no longer be read under full enforcement.
    pub fn is_dead(&self, reads: u64, now: i64) -> bool {
        self.is_exhausted(reads) || self.is_burned(now)
    }
}

/// Caller-supplied context attached to an access record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AccessContext {
    /// Log entry of the request that triggered the read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_id: Option<LogId>,
    /// Additional free-form annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl AccessContext {
    /// Context correlated with a request log.
    pub fn for_log(log_id: LogId) -> Self {
        Self {
            log_id: Some(log_id),
            tags: BTreeMap::new(),
        }
    }

    /// Add a tag.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.log_id.is_none() && self.tags.is_empty()
    }
}

/// Evidence of one successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
    #[serde(default)]
    pub context: AccessContext,
    /// When the store recorded the read (Unix ms).
    pub accessed_at: i64,
}

impl AccessRecord {
    pub fn new(context: AccessContext, accessed_at: i64) -> Self {
        Self {
            context,
            accessed_at,
        }
    }
}

/// Audit record of an inbound request.
///
/// Write-once. Logs are never enforced against and never expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogEntry {
    /// Source address of the request.
    pub source: String,
    /// Accessed path.
    pub path: String,
    /// Time of the request (Unix ms).
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn note(allowed_reads: u32, burn_date: i64) -> Note {
        Note {
            allowed_reads,
            encrypted_message: Bytes::from_static(b"ciphertext"),
            fingerprint: Bytes::from_static(b"digest"),
            initialization_vector: Bytes::from_static(&[7; 12]),
            salt: Bytes::from_static(&[1; 16]),
            burn_date,
            encryption_scheme: None,
        }
    }

    #[test]
    fn test_burn_date_boundary_is_inclusive() {
        let n = note(1, 1_000);
        assert!(!n.is_burned(999));
        assert!(n.is_burned(1_000));
        assert!(n.is_burned(1_001));
    }

    #[test]
    fn test_exhausted_at_budget() {
        let n = note(3, i64::MAX);
        assert!(!n.is_exhausted(2));
        assert!(n.is_exhausted(3));
        assert!(n.is_dead(3, 0));
        assert!(!n.is_dead(0, 0));
    }

    #[test]
    fn test_note_json_uses_camel_case() {
        let json = serde_json::to_value(note(2, 42)).unwrap();
        assert_eq!(json["allowedReads"], 2);
        assert_eq!(json["burnDate"], 42);
        assert!(json.get("encryptionScheme").is_none());
    }

    #[test]
    fn test_note_rejects_unknown_fields() {
        let mut json = serde_json::to_value(note(1, 1)).unwrap();
        json["surprise"] = serde_json::Value::Bool(true);
        assert!(serde_json::from_value::<Note>(json).is_err());
    }

    #[test]
    fn test_empty_context_serializes_to_empty_object() {
        let json = serde_json::to_string(&AccessContext::default()).unwrap();
        assert_eq!(json, "{}");
        assert!(AccessContext::default().is_empty());
        assert!(!AccessContext::default().tag("via", "status").is_empty());
    }

    proptest! {
        #[test]
        fn test_death_is_monotonic(
            allowed in 1u32..64,
            reads in 0u64..128,
            burn_date in 0i64..1_000_000,
            now in 0i64..1_000_000,
            later_reads in 0u64..16,
            later_ms in 0i64..1_000_000,
        ) {
            let note = note(allowed, burn_date);
            if note.is_dead(reads, now) {
                prop_assert!(note.is_dead(reads + later_reads, now + later_ms));
            }
            prop_assert_eq!(note.is_exhausted(reads), reads >= u64::from(allowed));
        }
    }
}
