use crate::operators::{filter_magnitude, project, sort_time_descending};
use crate::source::DataSource;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use quake_core::schema::{EVENT_COLUMNS, MAGNITUDE_COLUMN, TIME_COLUMN};
use quake_core::{QueryParameters, Result, ResultSet};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::debug;

/// Issues the authoritative magnitude-range query.
///
/// Results are ordered by event time, newest first. Implementations are free
/// to fail with any error; the cache-aside executor reports it to callers as a
/// backing store failure.
#[async_trait]
pub trait QueryExecutor: Debug + Send + Sync {
    async fn execute(&self, params: &QueryParameters) -> Result<ResultSet>;
}

/// Executes range queries against a scanned event table
#[derive(Debug, Clone)]
pub struct EventQueryExecutor {
    source: Arc<dyn DataSource>,
}

impl EventQueryExecutor {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn DataSource> {
        &self.source
    }

    fn run(&self, params: &QueryParameters) -> Result<ResultSet> {
        let batches = self.source.scan()?;
        let schema = Arc::new(self.source.schema().to_arrow());
        let mag_idx = self.source.schema().index_of(MAGNITUDE_COLUMN)?;

        let projected = batches
            .iter()
            .map(|batch| {
                let filtered = filter_magnitude(batch, mag_idx, params)?;
                project(&filtered, &EVENT_COLUMNS)
            })
            .collect::<Result<Vec<RecordBatch>>>()?;

        let output_schema = match projected.first() {
            Some(batch) => batch.schema(),
            None => Arc::new(schema.project(&event_column_indices(&schema)?)?),
        };

        let time_idx = output_schema.index_of(TIME_COLUMN)?;
        let id_idx = output_schema.index_of(EVENT_COLUMNS[0])?;
        let sorted = sort_time_descending(&output_schema, &projected, time_idx, id_idx)?;

        debug!("Range query {} matched {} rows", params, sorted.num_rows());

        ResultSet::try_new(output_schema, vec![sorted])
    }
}

fn event_column_indices(schema: &arrow::datatypes::Schema) -> Result<Vec<usize>> {
    EVENT_COLUMNS
        .iter()
        .map(|name| Ok(schema.index_of(name)?))
        .collect()
}

#[async_trait]
impl QueryExecutor for EventQueryExecutor {
    async fn execute(&self, params: &QueryParameters) -> Result<ResultSet> {
        self.run(params)
    }
}
