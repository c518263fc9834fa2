//! Note validation for the request layer.
//!
//! Stores accept any note they are given; rejecting malformed uploads is the
//! caller's job, done with [`validate_note`] before `store_note`.

use crate::error::ValidationError;
use crate::note::Note;

/// Validate an uploaded note against the current time.
///
/// This performs:
/// - Positive read budget
/// - Burn date strictly in the future
/// - Non-empty ciphertext, fingerprint and IV
pub fn validate_note(note: &Note, now: i64) -> Result<(), ValidationError> {
    // 1. Budget
    if note.allowed_reads == 0 {
        return Err(ValidationError::NoAllowedReads);
    }

    // 2. Burn date
    if note.burn_date <= now {
        return Err(ValidationError::BurnDateNotInFuture {
            burn_date: note.burn_date,
            now,
        });
    }

    // 3. Opaque payload fields
    if note.encrypted_message.is_empty() {
        return Err(ValidationError::EmptyField("encryptedMessage"));
    }
    if note.fingerprint.is_empty() {
        return Err(ValidationError::EmptyField("fingerprint"));
    }
    if note.initialization_vector.is_empty() {
        return Err(ValidationError::EmptyField("initializationVector"));
    }

    Ok(())
}
