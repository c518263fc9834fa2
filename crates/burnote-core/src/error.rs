//! Error types for Burnote Core.

use thiserror::Error;

/// Errors from parsing a note or log identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    #[error("malformed identifier: {0:?}")]
    Malformed(String),

    #[error("identifier is not a random (v4) UUID: {0:?}")]
    NotVersion4(String),
}

/// Reasons a note is not acceptable for storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("allowed reads must be positive")]
    NoAllowedReads,

    #[error("burn date {burn_date} is not in the future (now {now})")]
    BurnDateNotInFuture { burn_date: i64, now: i64 },

    #[error("field {0} must not be empty")]
    EmptyField(&'static str),
}
