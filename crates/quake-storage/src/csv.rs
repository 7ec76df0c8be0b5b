//! CSV event table
//!
//! Reads USGS-style earthquake exports. The file may carry any number of
//! extra columns in any order; only the event columns are kept, converted to
//! the types of [`Schema::earthquakes`]. Rows missing a required value are
//! skipped.

use arrow::array::{new_null_array, ArrayRef, BooleanArray};
use arrow::compute::{and, cast, filter_record_batch, is_not_null};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType as ArrowDataType, Field as ArrowField, Schema as ArrowSchema};
use arrow::record_batch::RecordBatch;
use quake_core::{QuakeError, Result, Schema};
use quake_executor::DataSource;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const DEFAULT_BATCH_SIZE: usize = 8192;

/// Event table read from a CSV file on every scan
#[derive(Debug)]
pub struct CsvDataSource {
    schema: Schema,
    path: PathBuf,
    batch_size: usize,
}

impl CsvDataSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            schema: Schema::earthquakes(),
            path: path.as_ref().to_path_buf(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Header columns of the file, read as text
    fn raw_schema(&self) -> Result<ArrowSchema> {
        let file = File::open(&self.path)?;
        let (inferred, _) = Format::default()
            .with_header(true)
            .infer_schema(file, Some(1))?;

        Ok(ArrowSchema::new(
            inferred
                .fields()
                .iter()
                .map(|f| ArrowField::new(f.name(), ArrowDataType::Utf8, true))
                .collect::<Vec<_>>(),
        ))
    }

    fn convert(&self, raw: &RecordBatch) -> Result<RecordBatch> {
        let target = Arc::new(self.schema.to_arrow());
        let raw_schema = raw.schema();

        let columns = target
            .fields()
            .iter()
            .map(|field| match raw_schema.index_of(field.name()) {
                Ok(idx) => Ok(cast(raw.column(idx), field.data_type())?),
                Err(_) if field.is_nullable() => {
                    Ok(new_null_array(field.data_type(), raw.num_rows()))
                }
                Err(_) => Err(QuakeError::SchemaError(format!(
                    "CSV file {} has no '{}' column",
                    self.path.display(),
                    field.name()
                ))),
            })
            .collect::<Result<Vec<ArrayRef>>>()?;

        let mut keep: Option<BooleanArray> = None;
        for (field, column) in target.fields().iter().zip(&columns) {
            if field.is_nullable() || column.null_count() == 0 {
                continue;
            }
            let present = is_not_null(column)?;
            keep = Some(match keep {
                Some(mask) => and(&mask, &present)?,
                None => present,
            });
        }

        // Build unchecked first: required columns may still hold nulls here
        let nullable = Arc::new(ArrowSchema::new(
            target
                .fields()
                .iter()
                .map(|f| f.as_ref().clone().with_nullable(true))
                .collect::<Vec<_>>(),
        ));
        let mut batch = RecordBatch::try_new(nullable, columns)?;

        if let Some(mask) = keep {
            let before = batch.num_rows();
            batch = filter_record_batch(&batch, &mask)?;
            debug!(
                "Skipped {} rows with missing values in {}",
                before - batch.num_rows(),
                self.path.display()
            );
        }

        Ok(RecordBatch::try_new(target, batch.columns().to_vec())?)
    }
}

impl DataSource for CsvDataSource {
    fn scan(&self) -> Result<Vec<RecordBatch>> {
        let raw_schema = Arc::new(self.raw_schema()?);
        let file = File::open(&self.path)?;

        let reader = ReaderBuilder::new(raw_schema)
            .with_header(true)
            .with_batch_size(self.batch_size)
            .build(file)?;

        let mut batches = Vec::new();
        for raw in reader {
            let batch = self.convert(&raw?)?;
            if batch.num_rows() > 0 {
                batches.push(batch);
            }
        }

        if batches.is_empty() {
            warn!("No events loaded from {}", self.path.display());
        }
        Ok(batches)
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quake_core::ScalarValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const USGS_SAMPLE: &str = "\
time,latitude,longitude,depth,mag,magType,id,updated,place
2024-01-15T08:30:12.345Z,35.7,-117.5,8.2,4.4,ml,ci1,2024-01-16,\"10 km N of Ridgecrest, CA\"
2024-01-15T09:00:00.000Z,38.8,-122.8,,2.1,md,nc2,2024-01-16,The Geysers
2024-01-15T10:00:00.000Z,61.2,-150.1,40.0,,ml,ak3,2024-01-16,Southern Alaska
";

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn rows(source: &CsvDataSource) -> Vec<RecordBatch> {
        source.scan().unwrap()
    }

    #[test]
    fn test_scan_projects_event_columns() {
        let file = write_csv(USGS_SAMPLE);
        let source = CsvDataSource::new(file.path());

        let batches = rows(&source);
        assert_eq!(batches.len(), 1);

        let batch = &batches[0];
        assert_eq!(batch.schema().as_ref(), &Schema::earthquakes().to_arrow());
        // ak3 has no magnitude
        assert_eq!(batch.num_rows(), 2);

        let id = ScalarValue::from_array(batch.column(0), 0).unwrap();
        assert_eq!(id, ScalarValue::Utf8("ci1".to_string()));
        let time = ScalarValue::from_array(batch.column(1), 0).unwrap();
        assert_eq!(time, ScalarValue::Timestamp(1_705_307_412_345));
        let place = ScalarValue::from_array(batch.column(6), 0).unwrap();
        assert_eq!(place, ScalarValue::Utf8("10 km N of Ridgecrest, CA".to_string()));
    }

    #[test]
    fn test_missing_depth_is_null() {
        let file = write_csv(USGS_SAMPLE);
        let batches = rows(&CsvDataSource::new(file.path()));

        let depth = ScalarValue::from_array(batches[0].column(4), 1).unwrap();
        assert_eq!(depth, ScalarValue::Null);
    }

    #[test]
    fn test_optional_column_may_be_absent() {
        let file = write_csv(
            "id,time,latitude,longitude,mag\n\
             x1,2024-02-01T00:00:00Z,1.0,2.0,3.5\n",
        );
        let batches = rows(&CsvDataSource::new(file.path()));

        assert_eq!(batches[0].num_rows(), 1);
        assert_eq!(batches[0].column(6).null_count(), 1);
    }

    #[test]
    fn test_required_column_missing() {
        let file = write_csv("id,time,latitude,longitude\nx1,2024-02-01T00:00:00Z,1.0,2.0\n");
        let err = CsvDataSource::new(file.path()).scan().unwrap_err();
        assert!(matches!(err, QuakeError::SchemaError(_)));
    }

    #[test]
    fn test_small_batches() {
        let file = write_csv(USGS_SAMPLE);
        let source = CsvDataSource::new(file.path()).with_batch_size(1);

        let total: usize = rows(&source).iter().map(|b| b.num_rows()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_missing_file() {
        let err = CsvDataSource::new("/nonexistent/events.csv").scan().unwrap_err();
        assert!(matches!(err, QuakeError::IoError(_)));
    }
}
