//! Key-value session cache seam and the cache key conventions.
//!
//! The cache holds only ephemeral state: refresh-token records and pending
//! OTP challenges, each with an explicit TTL. No durability beyond the TTL is
//! assumed; an abandoned write simply ages out.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The cache backend did not answer (timeout, connection loss).
///
/// Callers must keep this distinct from "key absent": conflating the two
/// would fire the replay-detection path on a transient outage.
#[derive(Debug, Error)]
#[error("session cache unavailable: {reason}")]
pub struct CacheError {
    reason: String,
}

impl CacheError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Marker value stored under a live refresh record.
pub(crate) const REFRESH_VALID_MARKER: &str = "valid";

/// Key for one member of a refresh lineage.
pub(crate) fn refresh_key(subject: Uuid, jti: Uuid) -> String {
    format!("refresh:{subject}:{jti}")
}

/// Prefix matching every refresh record of one subject.
pub(crate) fn refresh_prefix(subject: Uuid) -> String {
    format!("refresh:{subject}:")
}

/// Key for the single live OTP challenge of a registration identifier.
pub(crate) fn otp_key(identifier: &str) -> String {
    format!("otp:register:{identifier}")
}

/// Remote key-value store with per-key TTLs.
///
/// Every call is remote I/O and may fail with [`CacheError`]. `delete`
/// reports presence; that answer is the atomic consume primitive behind
/// single-use refresh records, so backends must make delete-and-report a
/// single step (`DEL` on Redis, a mutexed map here).
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write `value` under `key`, overwriting any prior value and resetting
    /// the TTL.
    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> CacheResult<()>;

    /// Delete one key, reporting whether it was present.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Delete every key starting with `prefix`, returning how many existed.
    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64>;
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache backend for tests and single-node deployments.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>) {
    let now = Instant::now();
    entries.retain(|_, entry| entry.expires_at > now);
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries);
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: i64) -> CacheResult<()> {
        let ttl = Duration::from_secs(ttl_seconds.max(0) as u64);
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries);
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries);
        Ok(entries.remove(key).is_some())
    }

    async fn delete_prefix(&self, prefix: &str) -> CacheResult<u64> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries);
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }
}
