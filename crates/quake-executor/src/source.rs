use arrow::record_batch::RecordBatch;
use quake_core::{Result, Schema};
use std::fmt::Debug;

/// Authoritative event data that a query executor scans
pub trait DataSource: Debug + Send + Sync {
    fn scan(&self) -> Result<Vec<RecordBatch>>;
    fn schema(&self) -> &Schema;
}
