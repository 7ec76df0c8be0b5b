//! Cached Query Executor
//!
//! Wraps a [`QueryExecutor`] with a cache-aside flow over a [`CacheStore`].
//!
//! Per request: fingerprint the parameters, look the key up, decode on hit;
//! otherwise run the query, encode the result and write it back with the
//! configured TTL. Cache faults (store errors, timeouts, undecodable payloads)
//! are absorbed as misses. Only a failed backing query reaches the caller, as
//! `QuakeError::BackingStoreError`. Nothing is retried.

use crate::executor::QueryExecutor;
use quake_cache::{codec, CacheConfig, CacheKey, CacheStats, CacheStore, MemoryCacheStore};
use quake_core::{
    CacheStatus, QuakeError, QueryParameters, RequestOutcome, Result, ResultSet,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// A query executor with cache-aside result caching
#[derive(Debug, Clone)]
pub struct CachedQueryExecutor {
    /// The authoritative query executor
    executor: Arc<dyn QueryExecutor>,
    /// Where encoded results are kept
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    stats: Arc<CacheStats>,
}

impl CachedQueryExecutor {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        store: Arc<dyn CacheStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            executor,
            store,
            config,
            stats: Arc::new(CacheStats::new()),
        }
    }

    /// Create a cached executor backed by an in-process store
    pub fn with_memory_store(executor: Arc<dyn QueryExecutor>, config: CacheConfig) -> Self {
        let store = Arc::new(MemoryCacheStore::new(&config));
        Self::new(executor, store, config)
    }

    /// Validate raw bounds and resolve them
    pub async fn resolve_bounds(
        &self,
        min_magnitude: f64,
        max_magnitude: f64,
    ) -> Result<RequestOutcome> {
        let params = QueryParameters::new(min_magnitude, max_magnitude)?;
        self.resolve(&params).await
    }

    /// Serve the query from cache when possible, otherwise from the executor
    pub async fn resolve(&self, params: &QueryParameters) -> Result<RequestOutcome> {
        let key = CacheKey::from_params(params);
        let start = Instant::now();

        if self.config.enabled {
            if let Some(result) = self.lookup(&key).await {
                self.stats.record_hit();
                let elapsed = start.elapsed();
                debug!(
                    "CACHE HIT for {} ({} rows, {:.4}s)",
                    params,
                    result.num_rows(),
                    elapsed.as_secs_f64()
                );
                return Ok(RequestOutcome::new(result, CacheStatus::Hit, elapsed));
            }
        }

        self.stats.record_miss();
        let result = self.execute(params).await?;

        if self.config.enabled {
            self.populate(&key, &result).await;
        }

        let elapsed = start.elapsed();
        debug!(
            "CACHE MISS for {} ({} rows, {:.4}s)",
            params,
            result.num_rows(),
            elapsed.as_secs_f64()
        );
        Ok(RequestOutcome::new(result, CacheStatus::Miss, elapsed))
    }

    /// Look the key up; every cache-layer fault comes back as `None`
    async fn lookup(&self, key: &CacheKey) -> Option<ResultSet> {
        let bytes = match timeout(self.config.store_timeout, self.store.get(key)).await {
            Ok(Ok(Some(bytes))) => bytes,
            Ok(Ok(None)) => return None,
            Ok(Err(e)) => {
                self.stats.record_store_error();
                warn!(
                    "Cache lookup on {} store failed, treating as miss: {}",
                    self.store.name(),
                    e
                );
                return None;
            }
            Err(_) => {
                self.stats.record_store_error();
                warn!(
                    "Cache lookup on {} store timed out after {:?}, treating as miss",
                    self.store.name(),
                    self.config.store_timeout
                );
                return None;
            }
        };

        match codec::decode(&bytes) {
            Ok(result) => Some(result),
            Err(e) => {
                self.stats.record_corrupt_payload();
                warn!("Discarding cached payload for {}: {}", key, e);
                None
            }
        }
    }

    async fn execute(&self, params: &QueryParameters) -> Result<ResultSet> {
        match timeout(self.config.query_timeout, self.executor.execute(params)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                self.stats.record_backing_failure();
                error!("Backing store query for {} failed: {}", params, e);
                Err(into_backing_error(e))
            }
            Err(_) => {
                self.stats.record_backing_failure();
                error!(
                    "Backing store query for {} timed out after {:?}",
                    params, self.config.query_timeout
                );
                Err(QuakeError::BackingStoreError(format!(
                    "query timed out after {:?}",
                    self.config.query_timeout
                )))
            }
        }
    }

    /// Write the result back; failures only cost a future hit
    async fn populate(&self, key: &CacheKey, result: &ResultSet) {
        let payload = match codec::encode(result) {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.record_populate_failure();
                warn!("Could not encode result for {}: {}", key, e);
                return;
            }
        };

        let write = self.store.set(key, payload, self.config.ttl);
        match timeout(self.config.store_timeout, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.stats.record_populate_failure();
                warn!("Cache write to {} store failed: {}", self.store.name(), e);
            }
            Err(_) => {
                self.stats.record_populate_failure();
                warn!(
                    "Cache write to {} store timed out after {:?}",
                    self.store.name(),
                    self.config.store_timeout
                );
            }
        }
    }

    /// Evict the cached result for `params`
    pub async fn invalidate(&self, params: &QueryParameters) -> Result<bool> {
        let key = CacheKey::from_params(params);
        self.store.invalidate(&key).await
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Check if caching is enabled
    pub fn is_cache_enabled(&self) -> bool {
        self.config.enabled
    }
}

fn into_backing_error(err: QuakeError) -> QuakeError {
    match err {
        QuakeError::BackingStoreError(_) => err,
        other => QuakeError::BackingStoreError(other.to_string()),
    }
}
