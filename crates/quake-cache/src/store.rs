//! Key/value abstraction over the result cache backend

use crate::fingerprint::CacheKey;
use async_trait::async_trait;
use quake_core::Result;
use std::fmt::Debug;
use std::time::Duration;

/// A best-effort key/value store with per-key expiry.
///
/// The store alone decides when an entry has expired: once `ttl` has elapsed
/// since `set`, `get` reports the key as absent. Connectivity, auth and TLS
/// failures are reported as `QuakeError::CacheUnavailable`.
#[async_trait]
pub trait CacheStore: Debug + Send + Sync {
    /// Fetch the payload stored under `key`, if present and not expired
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous entry
    async fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Remove the entry for `key`; returns whether one was present
    async fn invalidate(&self, key: &CacheKey) -> Result<bool>;

    /// Short backend name for logs
    fn name(&self) -> &str;
}

/// Whole seconds for stores that only accept second granularity.
///
/// Rounds up so an entry never lives shorter than asked, and never returns 0.
pub fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
    secs.max(1)
}
