//! Strong identifier types.
//!
//! Notes and logs live in separate namespaces, so their identifiers are
//! distinct newtypes even though both wrap a random UUID v4.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::{Uuid, Variant, Version};

use crate::error::IdError;

/// Length of the canonical hyphenated UUID text form.
const CANONICAL_LEN: usize = 36;

macro_rules! random_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse the canonical text form of a UUID v4.
            ///
            /// Only the 36-character hyphenated form is accepted (case-insensitive).
            /// Other UUID versions, the simple/braced/URN encodings and anything
            /// malformed are rejected.
            pub fn parse(s: &str) -> Result<Self, IdError> {
                parse_v4(s).map(Self)
            }

            /// Get the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0.hyphenated())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

random_id!(
    /// Identifier of a stored note.
    NoteId
);

random_id!(
    /// Identifier of a stored log entry.
    LogId
);

fn parse_v4(s: &str) -> Result<Uuid, IdError> {
    if s.len() != CANONICAL_LEN {
        return Err(IdError::Malformed(s.to_string()));
    }
    let uuid = Uuid::parse_str(s).map_err(|_| IdError::Malformed(s.to_string()))?;
    if uuid.get_version() != Some(Version::Random) || uuid.get_variant() != Variant::RFC4122 {
        return Err(IdError::NotVersion4(s.to_string()));
    }
    Ok(uuid)
}
