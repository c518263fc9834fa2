//! Error types for Burnote.

use burnote_core::{IdError, ValidationError};
use burnote_store::StoreError;
use thiserror::Error;

/// Errors that can occur while configuring or using Burnote.
#[derive(Debug, Error)]
pub enum BurnoteError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Rejected note upload.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Malformed note or log identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for Burnote operations.
pub type Result<T> = std::result::Result<T, BurnoteError>;
