use crate::config::{Config, OutputFormat};
use anyhow::{Context, Result};
use arrow::csv::WriterBuilder;
use colored::Colorize;
use comfy_table::{Cell, Color, Table as ComfyTable};
use quake_cache::{CacheStats, CacheStore, MemoryCacheStore};
use quake_core::{CacheStatus, QueryParameters, RequestOutcome, ResultSet};
use quake_executor::{CachedQueryExecutor, EventQueryExecutor};
use quake_storage::MemoryDataSource;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load the event table and put the configured cache in front of it
pub async fn build_executor(config: &Config, file: &Path) -> Result<CachedQueryExecutor> {
    if !file.exists() {
        anyhow::bail!("File not found: {:?}", file);
    }

    let source = MemoryDataSource::from_csv(file)
        .with_context(|| format!("Failed to load events from {}", file.display()))?;
    let executor = Arc::new(EventQueryExecutor::new(Arc::new(source)));

    let cache_config = config.cache_config();
    let store = open_store(config).await;
    info!(
        "Result cache: {} store, ttl {}s, {}",
        store.name(),
        cache_config.ttl.as_secs(),
        if cache_config.enabled { "enabled" } else { "disabled" }
    );

    Ok(CachedQueryExecutor::new(executor, store, cache_config))
}

#[cfg(feature = "redis")]
async fn open_store(config: &Config) -> Arc<dyn CacheStore> {
    if let Some(redis_config) = config.redis_config() {
        match quake_cache::RedisCacheStore::connect(redis_config).await {
            Ok(store) => return Arc::new(store),
            Err(e) => tracing::warn!("Redis unavailable, using in-process cache: {}", e),
        }
    }
    Arc::new(MemoryCacheStore::new(&config.cache_config()))
}

#[cfg(not(feature = "redis"))]
async fn open_store(config: &Config) -> Arc<dyn CacheStore> {
    if config.redis.is_some() {
        tracing::warn!("Built without Redis support, using in-process cache");
    }
    Arc::new(MemoryCacheStore::new(&config.cache_config()))
}

pub async fn run_query(
    config: &Config,
    file: &Path,
    min: f64,
    max: f64,
    repeat: usize,
    output: OutputFormat,
) -> Result<()> {
    let params = QueryParameters::new(min, max)?;
    let executor = build_executor(config, file).await?;

    let mut last = None;
    for _ in 0..repeat.max(1) {
        let outcome = executor.resolve(&params).await?;
        if config.show_timing || output != OutputFormat::Table {
            eprintln!("{}", status_line(&params, &outcome));
        }
        last = Some(outcome);
    }

    if let Some(outcome) = last {
        print_outcome(&outcome, output, config.max_rows)?;
    }

    if repeat > 1 {
        eprintln!("{}", stats_table(&executor.cache_stats(), &executor));
    }

    Ok(())
}

pub fn status_line(params: &QueryParameters, outcome: &RequestOutcome) -> String {
    let label = match outcome.cache_status {
        CacheStatus::Hit => outcome.cache_status.label().bright_green().bold(),
        CacheStatus::Miss => outcome.cache_status.label().bright_yellow().bold(),
    };
    format!(
        "{} {} -> {} rows in {:.4}s",
        label,
        params,
        outcome.result.num_rows(),
        outcome.elapsed_seconds()
    )
}

pub fn print_outcome(
    outcome: &RequestOutcome,
    format: OutputFormat,
    max_rows: usize,
) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Table => {
            writeln!(out, "{}", render_table(&outcome.result, max_rows)?)?;
            if outcome.result.num_rows() > max_rows {
                writeln!(
                    out,
                    "{}",
                    format!(
                        "({} of {} rows shown)",
                        max_rows,
                        outcome.result.num_rows()
                    )
                    .bright_black()
                )?;
            }
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&outcome_json(outcome)?)?)?;
        }
        OutputFormat::Csv => write_csv(&outcome.result, &mut out)?,
    }
    Ok(())
}

/// Rows as a table, at most `max_rows` of them
pub fn render_table(result: &ResultSet, max_rows: usize) -> Result<ComfyTable> {
    let mut table = ComfyTable::new();
    table.set_header(
        result
            .column_names()
            .into_iter()
            .map(|name| Cell::new(name).fg(Color::Cyan)),
    );

    for row in result.rows()?.into_iter().take(max_rows) {
        table.add_row(row.values().map(|v| v.to_string()));
    }
    Ok(table)
}

/// `{rows, columns, elapsed_seconds, cache_status}`
pub fn outcome_json(outcome: &RequestOutcome) -> Result<serde_json::Value> {
    Ok(json!({
        "rows": outcome.rows()?,
        "columns": outcome.columns(),
        "elapsed_seconds": outcome.elapsed_seconds(),
        "cache_status": outcome.cache_status,
    }))
}

pub fn write_csv<W: Write>(result: &ResultSet, mut out: W) -> Result<()> {
    if result.batches().is_empty() {
        writeln!(out, "{}", result.column_names().join(","))?;
        return Ok(());
    }
    let mut writer = WriterBuilder::new().with_header(true).build(out);
    for batch in result.batches() {
        writer.write(batch)?;
    }
    Ok(())
}

pub fn stats_table(stats: &CacheStats, executor: &CachedQueryExecutor) -> ComfyTable {
    let mut table = ComfyTable::new();
    table.set_header(vec![
        Cell::new("Metric").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Green),
    ]);

    let config = executor.config();
    let rows = [
        ("Store", executor.store().name().to_string()),
        (
            "Enabled",
            if executor.is_cache_enabled() { "Yes" } else { "No" }.to_string(),
        ),
        ("TTL", format!("{}s", config.ttl.as_secs())),
        ("Requests", stats.total_requests().to_string()),
        ("Hits", stats.hits().to_string()),
        ("Misses", stats.misses().to_string()),
        ("Hit Rate", format!("{:.1}%", stats.hit_rate() * 100.0)),
        ("Store Errors", stats.store_errors().to_string()),
        ("Corrupt Payloads", stats.corrupt_payloads().to_string()),
        ("Populate Failures", stats.populate_failures().to_string()),
        ("Backing Failures", stats.backing_failures().to_string()),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }
    table
}
