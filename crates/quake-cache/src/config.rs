//! Cache configuration options

use std::time::Duration;

pub const DEFAULT_TTL_SECS: u64 = 300;

/// Configuration for the result cache and the cache-aside flow around it
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held by the in-memory store
    pub max_entries: usize,
    /// Maximum payload bytes held by the in-memory store (approximate)
    pub max_memory_bytes: usize,
    /// Time-to-live for cache entries
    pub ttl: Duration,
    /// Whether caching is enabled
    pub enabled: bool,
    /// Upper bound on a single cache store call
    pub store_timeout: Duration,
    /// Upper bound on a single backing store query
    pub query_timeout: Duration,
    /// Namespace prepended to keys by shared stores
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_memory_bytes: 100 * 1024 * 1024, // 100 MB
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            enabled: true,
            store_timeout: Duration::from_secs(2),
            query_timeout: Duration::from_secs(30),
            key_prefix: "quake".to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new cache configuration with custom settings
    pub fn new(max_entries: usize, max_memory_bytes: usize, ttl_secs: u64) -> Self {
        Self {
            max_entries,
            max_memory_bytes,
            ttl: Duration::from_secs(ttl_secs),
            ..Default::default()
        }
    }

    /// Create a disabled cache configuration
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Set the maximum number of entries
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Set the maximum memory usage
    pub fn with_max_memory(mut self, max_memory_bytes: usize) -> Self {
        self.max_memory_bytes = max_memory_bytes;
        self
    }

    /// Set the TTL duration
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Enable or disable the cache
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}
