//! In-memory event table
//!
//! Holds the event table as Arrow record batches. Appends are checked
//! against the table schema so scans always yield uniform batches.

use crate::csv::CsvDataSource;
use arrow::record_batch::RecordBatch;
use parking_lot::RwLock;
use quake_core::{QuakeError, Result, Schema};
use quake_executor::DataSource;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// In-memory data source
#[derive(Debug)]
pub struct MemoryDataSource {
    schema: Schema,
    batches: RwLock<Vec<RecordBatch>>,
}

impl MemoryDataSource {
    /// Create a new memory data source
    pub fn new(schema: Schema, batches: Vec<RecordBatch>) -> Result<Self> {
        let source = Self::empty(schema);
        source.append(batches)?;
        Ok(source)
    }

    /// An event table with no rows
    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            batches: RwLock::new(Vec::new()),
        }
    }

    /// Load the event table from a CSV file once
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let csv = CsvDataSource::new(path);
        let source = Self::new(csv.schema().clone(), csv.scan()?)?;
        info!(
            "Loaded {} events from {}",
            source.num_rows(),
            csv.path().display()
        );
        Ok(source)
    }

    /// Append batches; all or nothing
    pub fn append(&self, batches: Vec<RecordBatch>) -> Result<()> {
        let expected = Arc::new(self.schema.to_arrow());
        for batch in &batches {
            if batch.schema().fields() != expected.fields() {
                return Err(QuakeError::SchemaError(format!(
                    "batch schema {:?} does not match table schema",
                    batch
                        .schema()
                        .fields()
                        .iter()
                        .map(|f| f.name().as_str())
                        .collect::<Vec<_>>()
                )));
            }
        }

        self.batches
            .write()
            .extend(batches.into_iter().filter(|b| b.num_rows() > 0));
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.batches.read().iter().map(|b| b.num_rows()).sum()
    }

    pub fn num_batches(&self) -> usize {
        self.batches.read().len()
    }

    pub fn clear(&self) {
        self.batches.write().clear();
    }
}

impl DataSource for MemoryDataSource {
    fn scan(&self) -> Result<Vec<RecordBatch>> {
        Ok(self.batches.read().clone())
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}
