//! Result cache for seismic magnitude-range queries
//!
//! This crate holds the pieces the cache-aside executor is built from.
//!
//! # Features
//!
//! - **Fingerprints**: SHA-256 keys over canonicalized query bounds
//! - **Stores**: the [`CacheStore`] trait, an in-process LRU store with
//!   per-entry TTL and, behind the `redis` feature, a Redis store
//! - **Codec**: lossless result set payloads using Arrow IPC
//! - **Statistics**: hits, misses, evictions, expirations and absorbed faults
//!
//! # Example
//!
//! ```ignore
//! use quake_cache::{codec, CacheConfig, CacheKey, CacheStore, MemoryCacheStore};
//!
//! let config = CacheConfig::default();
//! let store = MemoryCacheStore::new(&config);
//! let key = CacheKey::from_params(&params);
//!
//! if let Some(bytes) = store.get(&key).await? {
//!     return codec::decode(&bytes);
//! }
//!
//! let result = executor.execute(&params).await?;
//! store.set(&key, codec::encode(&result)?, config.ttl).await?;
//! ```

pub mod codec;
pub mod config;
pub mod fingerprint;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod stats;
pub mod store;

pub use config::CacheConfig;
pub use fingerprint::{fingerprint, CacheKey};
pub use memory::{CacheEntry, MemoryCacheStore};
#[cfg(feature = "redis")]
pub use redis_store::{RedisCacheStore, RedisConfig};
pub use stats::CacheStats;
pub use store::CacheStore;
