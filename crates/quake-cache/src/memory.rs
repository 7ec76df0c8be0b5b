//! In-process LRU result store with per-entry TTL

use crate::config::CacheConfig;
use crate::fingerprint::CacheKey;
use crate::stats::CacheStats;
use crate::store::CacheStore;
use async_trait::async_trait;
use lru::LruCache;
use parking_lot::RwLock;
use quake_core::Result;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Entry stored in the cache
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Encoded result set
    pub payload: Vec<u8>,
    /// When this entry stops being readable; `None` when the TTL runs past
    /// the clock's range
    pub expires_at: Option<Instant>,
}

impl CacheEntry {
    /// Create a new cache entry that lives for `ttl`
    pub fn new(payload: Vec<u8>, ttl: Duration) -> Self {
        Self {
            payload,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    /// Check if this entry has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }

    pub fn size_bytes(&self) -> usize {
        self.payload.len()
    }
}

type EntryMap = LruCache<CacheKey, CacheEntry, ahash::RandomState>;

/// Thread-safe LRU store for encoded query results
pub struct MemoryCacheStore {
    /// The underlying LRU cache
    cache: RwLock<EntryMap>,
    /// Upper bound on total payload bytes
    max_memory_bytes: usize,
    /// Cache statistics
    stats: Arc<CacheStats>,
    /// Current memory usage
    memory_used: RwLock<usize>,
}

impl MemoryCacheStore {
    /// Create a new store bounded by the entry and memory limits in `config`
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::with_hasher(capacity, ahash::RandomState::new())),
            max_memory_bytes: config.max_memory_bytes,
            stats: Arc::new(CacheStats::new()),
            memory_used: RwLock::new(0),
        }
    }

    /// Create a store with default limits
    pub fn with_defaults() -> Self {
        Self::new(&CacheConfig::default())
    }

    /// Get a payload from the cache, dropping it if it has expired
    pub fn get_payload(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let mut cache = self.cache.write();

        let payload = match cache.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.payload.clone()),
            _ => None,
        };

        if payload.is_some() {
            self.stats.record_hit();
            return payload;
        }

        if let Some(expired) = cache.pop(key) {
            let mut memory_used = self.memory_used.write();
            *memory_used = memory_used.saturating_sub(expired.size_bytes());
            self.stats.record_expiration();
            self.update_stats(&cache, *memory_used);
        }

        self.stats.record_miss();
        None
    }

    /// Insert a payload, replacing any previous entry for the key
    pub fn put(&self, key: CacheKey, payload: Vec<u8>, ttl: Duration) {
        let entry = CacheEntry::new(payload, ttl);
        let entry_size = entry.size_bytes();

        if entry_size > self.max_memory_bytes {
            debug!(
                "Not caching {}: payload of {} bytes exceeds limit of {} bytes",
                key, entry_size, self.max_memory_bytes
            );
            return;
        }

        let mut cache = self.cache.write();
        let mut memory_used = self.memory_used.write();

        // Replacement is not an eviction
        if let Some(old_entry) = cache.pop(&key) {
            *memory_used = memory_used.saturating_sub(old_entry.size_bytes());
        }

        // Evict entries if we would exceed memory limit
        while *memory_used + entry_size > self.max_memory_bytes && !cache.is_empty() {
            if let Some((_, evicted)) = cache.pop_lru() {
                *memory_used = memory_used.saturating_sub(evicted.size_bytes());
                self.stats.record_eviction();
            }
        }

        // At capacity, push hands back the least recently used entry
        if let Some((_, evicted)) = cache.push(key, entry) {
            *memory_used = memory_used.saturating_sub(evicted.size_bytes());
            self.stats.record_eviction();
        }

        *memory_used += entry_size;
        self.update_stats(&cache, *memory_used);
    }

    /// Remove an entry from the cache
    pub fn remove(&self, key: &CacheKey) -> bool {
        let mut cache = self.cache.write();
        let mut memory_used = self.memory_used.write();

        match cache.pop(key) {
            Some(entry) => {
                *memory_used = memory_used.saturating_sub(entry.size_bytes());
                self.update_stats(&cache, *memory_used);
                true
            }
            None => false,
        }
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        let eviction_count;
        {
            let mut cache = self.cache.write();
            let mut memory_used = self.memory_used.write();

            eviction_count = cache.len() as u64;
            cache.clear();
            *memory_used = 0;
        }

        for _ in 0..eviction_count {
            self.stats.record_eviction();
        }

        self.stats.set_entry_count(0);
        self.stats.set_memory_bytes(0);
    }

    /// Expire entries that have exceeded their TTL
    pub fn expire_stale(&self) -> usize {
        let mut cache = self.cache.write();
        let mut memory_used = self.memory_used.write();

        let expired_keys: Vec<CacheKey> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();

        for key in expired_keys {
            if let Some(entry) = cache.pop(&key) {
                *memory_used = memory_used.saturating_sub(entry.size_bytes());
                self.stats.record_expiration();
            }
        }

        self.update_stats(&cache, *memory_used);
        count
    }

    /// Get cache statistics
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Get current number of entries, expired ones included until they are touched
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    /// Get current memory usage in bytes
    pub fn memory_used(&self) -> usize {
        *self.memory_used.read()
    }

    fn update_stats(&self, cache: &EntryMap, memory_used: usize) {
        self.stats.set_entry_count(cache.len() as u64);
        self.stats.set_memory_bytes(memory_used as u64);
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(self.get_payload(key))
    }

    async fn set(&self, key: &CacheKey, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.put(key.clone(), value, ttl);
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.remove(key))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("max_entries", &self.cache.read().cap())
            .field("max_memory_bytes", &self.max_memory_bytes)
            .field("current_entries", &self.len())
            .field("memory_used", &self.memory_used())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quake_core::QueryParameters;
    use std::thread;

    const TTL: Duration = Duration::from_secs(300);

    fn key(min: f64, max: f64) -> CacheKey {
        CacheKey::from_params(&QueryParameters::new(min, max).unwrap())
    }

    #[test]
    fn test_put_get() {
        let store = MemoryCacheStore::with_defaults();
        let k = key(1.0, 5.0);

        store.put(k.clone(), vec![1, 2, 3], TTL);

        assert_eq!(store.get_payload(&k), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_miss() {
        let store = MemoryCacheStore::with_defaults();

        assert!(store.get_payload(&key(0.0, 1.0)).is_none());
        assert_eq!(store.stats().misses(), 1);
    }

    #[test]
    fn test_hit_stats() {
        let store = MemoryCacheStore::with_defaults();
        let k = key(1.0, 5.0);

        store.put(k.clone(), vec![7], TTL);
        store.get_payload(&k);
        store.get_payload(&k);

        assert_eq!(store.stats().hits(), 2);
        assert_eq!(store.stats().hit_rate(), 1.0);
    }

    #[test]
    fn test_remove() {
        let store = MemoryCacheStore::with_defaults();
        let k = key(1.0, 5.0);

        store.put(k.clone(), vec![1, 2, 3], TTL);
        assert_eq!(store.len(), 1);

        assert!(store.remove(&k));
        assert!(!store.remove(&k));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_clear() {
        let store = MemoryCacheStore::with_defaults();

        for i in 0..10 {
            store.put(key(i as f64, 10.0), vec![i as u8], TTL);
        }

        assert_eq!(store.len(), 10);
        store.clear();
        assert_eq!(store.len(), 0);
        assert_eq!(store.memory_used(), 0);
    }

    #[test]
    fn test_lru_eviction() {
        let config = CacheConfig::default().with_max_entries(3);
        let store = MemoryCacheStore::new(&config);

        for i in 0..4 {
            store.put(key(i as f64, 10.0), vec![i as u8], TTL);
        }

        assert_eq!(store.len(), 3);
        assert_eq!(store.stats().evictions(), 1);
        assert!(store.get_payload(&key(0.0, 10.0)).is_none());
        assert!(store.get_payload(&key(3.0, 10.0)).is_some());
    }

    #[test]
    fn test_memory_bound_eviction() {
        let config = CacheConfig::default().with_max_memory(10);
        let store = MemoryCacheStore::new(&config);

        store.put(key(1.0, 2.0), vec![0; 6], TTL);
        store.put(key(2.0, 3.0), vec![0; 6], TTL);

        assert_eq!(store.len(), 1);
        assert_eq!(store.memory_used(), 6);
        assert!(store.get_payload(&key(2.0, 3.0)).is_some());
    }

    #[test]
    fn test_oversized_payload_not_cached() {
        let config = CacheConfig::default().with_max_memory(4);
        let store = MemoryCacheStore::new(&config);

        store.put(key(1.0, 2.0), vec![0; 5], TTL);

        assert!(store.is_empty());
        assert_eq!(store.memory_used(), 0);
    }

    #[test]
    fn test_replace_tracks_memory_once() {
        let store = MemoryCacheStore::with_defaults();
        let k = key(1.0, 5.0);

        store.put(k.clone(), vec![0; 8], TTL);
        store.put(k.clone(), vec![0; 3], TTL);

        assert_eq!(store.len(), 1);
        assert_eq!(store.memory_used(), 3);
        assert_eq!(store.stats().evictions(), 0);
    }

    #[test]
    fn test_ttl_expiration() {
        let store = MemoryCacheStore::with_defaults();
        let k = key(1.0, 5.0);

        store.put(k.clone(), vec![1, 2, 3], Duration::from_millis(50));

        assert!(store.get_payload(&k).is_some());

        thread::sleep(Duration::from_millis(100));

        assert!(store.get_payload(&k).is_none());
        assert_eq!(store.stats().expirations(), 1);
        assert_eq!(store.memory_used(), 0);
    }

    #[test]
    fn test_huge_ttl_never_expires() {
        let store = MemoryCacheStore::with_defaults();
        let k = key(1.0, 5.0);

        store.put(k.clone(), vec![4, 2], Duration::from_secs(u64::MAX));
        store.put(key(2.0, 5.0), vec![1], Duration::MAX);

        assert_eq!(store.get_payload(&k), Some(vec![4, 2]));
        assert_eq!(store.get_payload(&key(2.0, 5.0)), Some(vec![1]));
        assert_eq!(store.expire_stale(), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expire_stale() {
        let store = MemoryCacheStore::with_defaults();

        for i in 0..5 {
            store.put(key(i as f64, 10.0), vec![i as u8], Duration::from_millis(50));
        }
        store.put(key(9.0, 10.0), vec![9], TTL);

        assert_eq!(store.len(), 6);

        thread::sleep(Duration::from_millis(100));

        assert_eq!(store.expire_stale(), 5);
        assert_eq!(store.len(), 1);
        assert_eq!(store.memory_used(), 1);
    }

    #[test]
    fn test_concurrent_access() {
        let store = Arc::new(MemoryCacheStore::with_defaults());
        let mut handles = vec![];

        for i in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let k = key(i as f64, 10.0);
                store.put(k.clone(), vec![i as u8], TTL);
                store.get_payload(&k);
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
    }

    #[tokio::test]
    async fn test_cache_store_trait() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::with_defaults());
        let k = key(2.0, 6.0);

        assert_eq!(store.get(&k).await.unwrap(), None);
        store.set(&k, b"payload".to_vec(), TTL).await.unwrap();
        assert_eq!(store.get(&k).await.unwrap(), Some(b"payload".to_vec()));
        assert!(store.invalidate(&k).await.unwrap());
        assert_eq!(store.get(&k).await.unwrap(), None);
        assert_eq!(store.name(), "memory");
    }
}
