//! Redis implementation of the KvBackend trait.
//!
//! Documents are plain string values, access lists are native Redis lists.
//! The bounded append runs as a Lua script, which Redis executes atomically.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, Script};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{Result, StoreError};
use crate::kv::{AppendOutcome, KvBackend};

/// Appends ARGV[1] to KEYS[1] unless KEYS[2] is absent or the list holds
/// ARGV[2] or more items. A negative ARGV[2] means no limit.
/// Returns {status, length}: 1 appended, 0 limit reached, -1 guard missing.
const APPEND_BOUNDED_LUA: &str = r#"
if redis.call('EXISTS', KEYS[2]) == 0 then
    return {-1, 0}
end
local len = redis.call('LLEN', KEYS[1])
local limit = tonumber(ARGV[2])
if limit >= 0 and len >= limit then
    return {0, len}
end
return {1, redis.call('RPUSH', KEYS[1], ARGV[1])}
"#;

/// Redis-based key-value backend.
///
/// Holds one multiplexed connection, shared by all concurrent operations.
/// Operations clone the connection handle and never hold the lock while
/// talking to the server; only `connect` holds it across the handshake so
/// that concurrent starts end up with a single connection.
pub struct RedisKv {
    client: Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    append_script: Script,
}

impl RedisKv {
    /// Create a backend for the given `redis://` URL. Does not connect.
    pub fn open(url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::open(url)?,
            conn: Mutex::new(None),
            append_script: Script::new(APPEND_BOUNDED_LUA),
        })
    }

    async fn conn(&self) -> Result<MultiplexedConnection> {
        self.conn
            .lock()
            .await
            .clone()
            .ok_or_else(|| StoreError::Unavailable("redis backend not connected".into()))
    }
}

#[async_trait]
impl KvBackend for RedisKv {
    async fn connect(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        if conn.is_none() {
            info!(addr = %self.client.get_connection_info().addr, "connecting to redis");
            *conn = Some(self.client.get_multiplexed_async_connection().await?);
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        if self.conn.lock().await.take().is_some() {
            info!("disconnected from redis");
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.conn.lock().await.is_some()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        conn.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let mut conn = self.conn().await?;
        let len: u64 = conn.llen(key).await?;
        Ok(len)
    }

    async fn list_items(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        let items: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(items)
    }

    async fn append_bounded(
        &self,
        key: &str,
        item: &str,
        limit: Option<u64>,
        guard: &str,
    ) -> Result<AppendOutcome> {
        let mut conn = self.conn().await?;
        let limit = match limit {
            Some(limit) => i64::try_from(limit)
                .map_err(|_| StoreError::InvalidData(format!("limit {} out of range", limit)))?,
            None => -1,
        };

        let (status, len): (i64, u64) = self
            .append_script
            .key(key)
            .key(guard)
            .arg(item)
            .arg(limit)
            .invoke_async(&mut conn)
            .await?;

        Ok(match status {
            1 => AppendOutcome::Appended(len),
            0 => AppendOutcome::LimitReached(len),
            _ => AppendOutcome::GuardMissing,
        })
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(keys.to_vec()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_bad_url() {
        let err = RedisKv::open("not a url").err().unwrap();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_operations_before_connect_are_unavailable() {
        let kv = RedisKv::open("redis://127.0.0.1:1/").unwrap();
        assert!(!kv.is_connected().await);

        let err = kv.get("note-x").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));

        // Safe without a connection.
        kv.disconnect().await.unwrap();
    }
}
