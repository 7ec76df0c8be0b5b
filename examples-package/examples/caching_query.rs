//! Query Caching Example
//!
//! Demonstrates the cache-aside flow: a miss runs the query and fills the
//! cache, a repeat is served from it, and entries expire after their TTL.

use anyhow::Result;
use arrow::array::{Float64Array, StringArray, TimestampMillisecondArray};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::print_batches;
use quake_cache::CacheConfig;
use quake_core::Schema;
use quake_executor::{CachedQueryExecutor, EventQueryExecutor};
use quake_storage::MemoryDataSource;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Query Caching Example ===\n");

    let source = MemoryDataSource::new(Schema::earthquakes(), vec![sample_events()?])?;
    let executor = Arc::new(EventQueryExecutor::new(Arc::new(source)));

    let config = CacheConfig::default().with_ttl(Duration::from_secs(1));
    let cached = CachedQueryExecutor::with_memory_store(executor, config);

    println!("--- Example 1: Miss, then hit ---\n");
    for _ in 0..2 {
        let outcome = cached.resolve_bounds(2.0, 6.0).await?;
        println!(
            "{}: {} rows in {:.4}s",
            outcome.cache_status.label(),
            outcome.result.num_rows(),
            outcome.elapsed_seconds()
        );
    }
    let outcome = cached.resolve_bounds(2.0, 6.0).await?;
    print_batches(outcome.result.batches())?;

    println!("\n--- Example 2: Expiry ---\n");
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let outcome = cached.resolve_bounds(2.0, 6.0).await?;
    println!("After TTL: {}", outcome.cache_status.label());

    println!("\n--- Example 3: Statistics ---\n");
    let stats = cached.cache_stats();
    println!("  Requests: {}", stats.total_requests());
    println!("  Hits:     {}", stats.hits());
    println!("  Misses:   {}", stats.misses());
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    println!("\n=== All caching examples completed! ===");
    Ok(())
}

fn sample_events() -> Result<RecordBatch> {
    Ok(RecordBatch::try_new(
        Arc::new(Schema::earthquakes().to_arrow()),
        vec![
            Arc::new(StringArray::from(vec!["ci40", "nc71", "us7000", "ak02"])),
            Arc::new(TimestampMillisecondArray::from(vec![
                1_705_307_412_000,
                1_705_311_000_000,
                1_705_314_600_000,
                1_705_318_200_000,
            ])),
            Arc::new(Float64Array::from(vec![35.7, 38.8, -33.4, 61.2])),
            Arc::new(Float64Array::from(vec![-117.5, -122.8, -70.6, -150.1])),
            Arc::new(Float64Array::from(vec![Some(8.2), None, Some(100.0), Some(40.0)])),
            Arc::new(Float64Array::from(vec![4.4, 2.1, 6.7, 3.0])),
            Arc::new(StringArray::from(vec![
                Some("10 km N of Ridgecrest, CA"),
                Some("The Geysers, CA"),
                Some("Santiago, Chile"),
                None,
            ])),
        ],
    )?)
}
