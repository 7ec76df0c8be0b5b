//! Tabular query results and their row-level view

use crate::error::{QuakeError, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType as ArrowDataType, Float32Type, Float64Type, Int32Type, Int64Type, SchemaRef,
    TimeUnit, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType,
};
use arrow::record_batch::RecordBatch;
use arrow::temporal_conversions::timestamp_ms_to_datetime;
use arrow::util::display::array_value_to_string;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::time::Duration;

use crate::types::CacheStatus;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Utf8(String),
    /// Milliseconds since the Unix epoch, UTC
    Timestamp(i64),
}

impl ScalarValue {
    /// Read the value at `row` from an Arrow array
    pub fn from_array(array: &dyn Array, row: usize) -> Result<Self> {
        if array.is_null(row) {
            return Ok(ScalarValue::Null);
        }

        let value = match array.data_type() {
            ArrowDataType::Boolean => ScalarValue::Boolean(array.as_boolean().value(row)),
            ArrowDataType::Int32 => {
                ScalarValue::Int64(array.as_primitive::<Int32Type>().value(row) as i64)
            }
            ArrowDataType::Int64 => {
                ScalarValue::Int64(array.as_primitive::<Int64Type>().value(row))
            }
            ArrowDataType::Float32 => {
                ScalarValue::Float64(array.as_primitive::<Float32Type>().value(row) as f64)
            }
            ArrowDataType::Float64 => {
                ScalarValue::Float64(array.as_primitive::<Float64Type>().value(row))
            }
            ArrowDataType::Utf8 => {
                ScalarValue::Utf8(array.as_string::<i32>().value(row).to_string())
            }
            ArrowDataType::LargeUtf8 => {
                ScalarValue::Utf8(array.as_string::<i64>().value(row).to_string())
            }
            ArrowDataType::Timestamp(unit, _) => {
                let millis = match unit {
                    TimeUnit::Second => {
                        array.as_primitive::<TimestampSecondType>().value(row) * 1_000
                    }
                    TimeUnit::Millisecond => {
                        array.as_primitive::<TimestampMillisecondType>().value(row)
                    }
                    TimeUnit::Microsecond => {
                        array.as_primitive::<TimestampMicrosecondType>().value(row) / 1_000
                    }
                    TimeUnit::Nanosecond => {
                        array.as_primitive::<TimestampNanosecondType>().value(row) / 1_000_000
                    }
                };
                ScalarValue::Timestamp(millis)
            }
            _ => ScalarValue::Utf8(array_value_to_string(array, row)?),
        };

        Ok(value)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int64(v) => Some(*v as f64),
            ScalarValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Utf8(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Null => write!(f, ""),
            ScalarValue::Boolean(v) => write!(f, "{}", v),
            ScalarValue::Int64(v) => write!(f, "{}", v),
            ScalarValue::Float64(v) => write!(f, "{}", v),
            ScalarValue::Utf8(v) => write!(f, "{}", v),
            ScalarValue::Timestamp(ms) => match timestamp_ms_to_datetime(*ms) {
                Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.3fZ")),
                None => write!(f, "{}", ms),
            },
        }
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Null => serializer.serialize_none(),
            ScalarValue::Boolean(v) => serializer.serialize_bool(*v),
            ScalarValue::Int64(v) => serializer.serialize_i64(*v),
            ScalarValue::Float64(v) => serializer.serialize_f64(*v),
            ScalarValue::Utf8(v) => serializer.serialize_str(v),
            ScalarValue::Timestamp(_) => serializer.serialize_str(&self.to_string()),
        }
    }
}

/// One result row: column name to value, in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    cells: Vec<(String, ScalarValue)>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &ScalarValue> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Ordered rows over a fixed column schema.
///
/// Equality is by content: same columns in the same order and the same rows in
/// the same order, regardless of how the rows are split across batches.
#[derive(Debug, Clone)]
pub struct ResultSet {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl ResultSet {
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for batch in &batches {
            if batch.schema().fields() != schema.fields() {
                return Err(QuakeError::SchemaError(format!(
                    "batch schema {:?} does not match result schema {:?}",
                    batch.schema(),
                    schema
                )));
            }
        }
        Ok(Self { schema, batches })
    }

    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            batches: vec![],
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn into_batches(self) -> Vec<RecordBatch> {
        self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(|b| b.num_rows()).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Materialize every row in order
    pub fn rows(&self) -> Result<Vec<Row>> {
        let names = self.column_names();
        let mut rows = Vec::with_capacity(self.num_rows());

        for batch in &self.batches {
            for row in 0..batch.num_rows() {
                let cells = batch
                    .columns()
                    .iter()
                    .zip(names.iter())
                    .map(|(col, name)| Ok((name.clone(), ScalarValue::from_array(col, row)?)))
                    .collect::<Result<Vec<_>>>()?;
                rows.push(Row { cells });
            }
        }

        Ok(rows)
    }

    /// All values of one column, in row order
    pub fn column_values(&self, column: &str) -> Result<Vec<ScalarValue>> {
        let idx = self
            .schema
            .index_of(column)
            .map_err(|_| QuakeError::ColumnNotFound(column.to_string()))?;

        let mut values = Vec::with_capacity(self.num_rows());
        for batch in &self.batches {
            let array = batch.column(idx);
            for row in 0..batch.num_rows() {
                values.push(ScalarValue::from_array(array, row)?);
            }
        }
        Ok(values)
    }
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        if self.schema.fields() != other.schema.fields() || self.num_rows() != other.num_rows() {
            return false;
        }
        match (self.rows(), other.rows()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

/// What a caller receives for one resolved request
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    pub result: ResultSet,
    pub cache_status: CacheStatus,
    pub elapsed: Duration,
}

impl RequestOutcome {
    pub fn new(result: ResultSet, cache_status: CacheStatus, elapsed: Duration) -> Self {
        Self {
            result,
            cache_status,
            elapsed,
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn columns(&self) -> Vec<String> {
        self.result.column_names()
    }

    pub fn rows(&self) -> Result<Vec<Row>> {
        self.result.rows()
    }
}
