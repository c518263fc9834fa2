//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// The first four variants are the outcomes callers map to responses. The
/// rest describe corrupt or unreadable backing data.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Identifier does not resolve to a stored note or log.
    #[error("not found: {0}")]
    NotFound(String),

    /// Note exists but its read budget is consumed.
    #[error("note allows only {allowed} reads but has {reads}")]
    ReadsExhausted { allowed: u32, reads: u64 },

    /// Note exists but its burn date has passed.
    #[error("note burned at {burn_date}, now is {now}")]
    Expired { burn_date: i64, now: i64 },

    /// Backing medium unreachable, not started, or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Document serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Whether the caller may retry the same call later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(format!("sqlite: {}", e))
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Unavailable(format!("redis: {}", e))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        StoreError::Unavailable(format!("spawn_blocking failed: {}", e))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
