//! CSV Query Example
//!
//! Loads a USGS-style earthquake export and runs a cached magnitude range
//! query over it. Pass a CSV path as the first argument, or a small sample
//! file is written to the temp directory.

use anyhow::Result;
use arrow::util::pretty::print_batches;
use quake_cache::CacheConfig;
use quake_executor::{CachedQueryExecutor, EventQueryExecutor};
use quake_storage::MemoryDataSource;
use std::path::PathBuf;
use std::sync::Arc;

const SAMPLE: &str = "\
time,latitude,longitude,depth,mag,magType,id,place
2024-01-15T08:30:12.345Z,35.7,-117.5,8.2,4.4,ml,ci40,\"10 km N of Ridgecrest, CA\"
2024-01-15T09:00:00.000Z,38.8,-122.8,1.9,2.1,md,nc71,\"The Geysers, CA\"
2024-01-15T10:00:00.000Z,-33.4,-70.6,100.0,6.7,mww,us7000,\"Santiago, Chile\"
";

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== CSV Query Example ===\n");

    let path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let path = std::env::temp_dir().join("quake_sample_events.csv");
            std::fs::write(&path, SAMPLE)?;
            path
        }
    };

    let source = MemoryDataSource::from_csv(&path)?;
    println!("Loaded {} events from {}\n", source.num_rows(), path.display());

    let executor = Arc::new(EventQueryExecutor::new(Arc::new(source)));
    let cached = CachedQueryExecutor::with_memory_store(executor, CacheConfig::default());

    let outcome = cached.resolve_bounds(2.5, 7.0).await?;
    println!(
        "mag 2.5..=7.0 -> {} ({} rows)",
        outcome.cache_status.label(),
        outcome.result.num_rows()
    );
    print_batches(outcome.result.batches())?;

    Ok(())
}
