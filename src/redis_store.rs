//! Redis-backed session cache.
//!
//! Uses a [`ConnectionManager`] so reconnects are transparent; any command
//! failure still surfaces as [`CacheError`] for the caller to distinguish
//! from "key absent".

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};

use crate::cache::{CacheError, CacheResult, SessionCache};

/// Session cache on a Redis server. Cloneable handles share one multiplexed
/// connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Connect to a Redis instance by URL (`redis://host:port/db`).
    ///
    /// # Errors
    /// Returns [`CacheError`] when the URL is invalid or the server is
    /// unreachable.
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(to_cache_error)?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(to_cache_error)?;
        Ok(Self::new(connection))
    }
}

fn to_cache_error(err: redis::RedisError) -> CacheError {
    CacheError::new(err.to_string())
}

#[async_trait]
impl SessionCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection.get(key).await.map_err(to_cache_error)?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> CacheResult<()> {
        let mut connection = self.connection.clone();
        // SETEX rejects non-positive lifetimes; clamp to the shortest one.
        let ttl = ttl_seconds.max(1) as u64;
        let _: () = connection
            .set_ex(key, value, ttl)
            .await
            .map_err(to_cache_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut connection = self.connection.clone();
        // DEL's removed-count doubles as the atomic was-present answer.
        let removed: u64 = connection.del(key).await.map_err(to_cache_error)?;
        Ok(removed > 0)
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut connection = self.connection.clone();
        let pattern = format!("{prefix}*");
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        // SCAN instead of KEYS: no full-keyspace stall on a shared server.
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut connection)
                .await
                .map_err(to_cache_error)?;
            if !keys.is_empty() {
                let count: u64 = connection.del(&keys).await.map_err(to_cache_error)?;
                removed += count;
            }
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        Ok(removed)
    }
}
