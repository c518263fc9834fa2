//! Store configuration.
//!
//! The backend is chosen once at startup. Configuration is read from the
//! environment:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `BURNOTE_STORE` | Backend: `memory`, `sqlite` or `redis` | `memory` |
//! | `BURNOTE_SQLITE_PATH` | Database file for the `sqlite` backend | `burnote.db` |
//! | `BURNOTE_REDIS_URL` | Server URL for the `redis` backend | `redis://127.0.0.1/` |

use std::path::PathBuf;

use crate::error::{BurnoteError, Result};

/// Environment variable selecting the backend.
pub const STORE_ENV: &str = "BURNOTE_STORE";

/// Environment variable with the SQLite database path.
pub const SQLITE_PATH_ENV: &str = "BURNOTE_SQLITE_PATH";

/// Environment variable with the Redis URL.
pub const REDIS_URL_ENV: &str = "BURNOTE_REDIS_URL";

pub const DEFAULT_SQLITE_PATH: &str = "burnote.db";
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1/";

/// Which medium backs the note store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Process memory. Lost on restart.
    Memory,
    /// A local SQLite database file.
    Sqlite { path: PathBuf },
    /// A Redis server.
    Redis { url: String },
}

/// Configuration for opening a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: BackendConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::Memory,
        }
    }
}

impl StoreConfig {
    /// In-memory store.
    pub fn memory() -> Self {
        Self::default()
    }

    /// SQLite-backed durable store.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendConfig::Sqlite { path: path.into() },
        }
    }

    /// Redis-backed durable store.
    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: BackendConfig::Redis { url: url.into() },
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let kind = lookup(STORE_ENV).unwrap_or_else(|| "memory".to_string());

        let backend = match kind.trim().to_ascii_lowercase().as_str() {
            "memory" => BackendConfig::Memory,
            "sqlite" => BackendConfig::Sqlite {
                path: lookup(SQLITE_PATH_ENV)
                    .unwrap_or_else(|| DEFAULT_SQLITE_PATH.to_string())
                    .into(),
            },
            "redis" => BackendConfig::Redis {
                url: lookup(REDIS_URL_ENV).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            },
            other => {
                return Err(BurnoteError::Config(format!(
                    "unknown {} value {:?} (expected memory, sqlite or redis)",
                    STORE_ENV, other
                )))
            }
        };

        Ok(Self { backend })
    }
}
