//! Columnar kernels behind the magnitude-range query
//!
//! Equivalent to
//! `SELECT id, time, latitude, longitude, depth, mag, place FROM events
//!  WHERE mag BETWEEN ? AND ? ORDER BY time DESC`.

use arrow::array::{AsArray, BooleanArray, Float64Array};
use arrow::compute::kernels::cmp::{gt_eq, lt_eq};
use arrow::compute::{
    and, cast, concat_batches, filter_record_batch, lexsort_to_indices, take_record_batch,
    SortColumn, SortOptions,
};
use arrow::datatypes::{DataType as ArrowDataType, Float64Type, SchemaRef};
use arrow::record_batch::RecordBatch;
use quake_core::{QuakeError, QueryParameters, Result};

/// Rows whose magnitude lies in the inclusive range; null magnitudes never match
pub fn filter_magnitude(
    batch: &RecordBatch,
    mag_idx: usize,
    params: &QueryParameters,
) -> Result<RecordBatch> {
    let mags = cast(batch.column(mag_idx), &ArrowDataType::Float64)?;
    let mags = mags.as_primitive::<Float64Type>();

    let lower = Float64Array::new_scalar(params.min_magnitude());
    let upper = Float64Array::new_scalar(params.max_magnitude());

    let mask: BooleanArray = and(&gt_eq(mags, &lower)?, &lt_eq(mags, &upper)?)?;
    Ok(filter_record_batch(batch, &mask)?)
}

/// Keep only `columns`, in the given order
pub fn project(batch: &RecordBatch, columns: &[&str]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices = columns
        .iter()
        .map(|name| {
            schema
                .index_of(name)
                .map_err(|_| QuakeError::ColumnNotFound(name.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(batch.project(&indices)?)
}

/// Merge batches and order rows by `time_idx` descending.
///
/// Rows with equal times are ordered by `tie_idx` ascending so the output is
/// deterministic; rows with a null time go last.
pub fn sort_time_descending(
    schema: &SchemaRef,
    batches: &[RecordBatch],
    time_idx: usize,
    tie_idx: usize,
) -> Result<RecordBatch> {
    let merged = concat_batches(schema, batches)?;
    if merged.num_rows() < 2 {
        return Ok(merged);
    }

    let sort_columns = [
        SortColumn {
            values: merged.column(time_idx).clone(),
            options: Some(SortOptions {
                descending: true,
                nulls_first: false,
            }),
        },
        SortColumn {
            values: merged.column(tie_idx).clone(),
            options: Some(SortOptions {
                descending: false,
                nulls_first: false,
            }),
        },
    ];

    let indices = lexsort_to_indices(&sort_columns, None)?;
    Ok(take_record_batch(&merged, &indices)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch(ids: Vec<&str>, times: Vec<i64>, mags: Vec<Option<f64>>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", ArrowDataType::Utf8, false),
            Field::new("time", ArrowDataType::Int64, false),
            Field::new("mag", ArrowDataType::Float64, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(Int64Array::from(times)),
                Arc::new(Float64Array::from(mags)),
            ],
        )
        .unwrap()
    }

    fn ids(batch: &RecordBatch) -> Vec<String> {
        batch
            .column(0)
            .as_string::<i32>()
            .iter()
            .map(|v| v.unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_filter_is_inclusive() {
        let input = batch(
            vec!["a", "b", "c", "d"],
            vec![1, 2, 3, 4],
            vec![Some(1.9), Some(2.0), Some(6.0), Some(6.1)],
        );
        let params = QueryParameters::new(2.0, 6.0).unwrap();

        let out = filter_magnitude(&input, 2, &params).unwrap();
        assert_eq!(ids(&out), vec!["b", "c"]);
    }

    #[test]
    fn test_filter_skips_null_magnitudes() {
        let input = batch(vec!["a", "b"], vec![1, 2], vec![None, Some(3.0)]);
        let params = QueryParameters::new(0.0, 10.0).unwrap();

        let out = filter_magnitude(&input, 2, &params).unwrap();
        assert_eq!(ids(&out), vec!["b"]);
    }

    #[test]
    fn test_filter_inverted_range_is_empty() {
        let input = batch(vec!["a"], vec![1], vec![Some(4.0)]);
        let params = QueryParameters::new(6.0, 2.0).unwrap();

        assert_eq!(filter_magnitude(&input, 2, &params).unwrap().num_rows(), 0);
    }

    #[test]
    fn test_filter_casts_integer_magnitudes() {
        let schema = Arc::new(Schema::new(vec![Field::new(
            "mag",
            ArrowDataType::Int64,
            false,
        )]));
        let input =
            RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 3, 5]))]).unwrap();
        let params = QueryParameters::new(2.0, 5.0).unwrap();

        assert_eq!(filter_magnitude(&input, 0, &params).unwrap().num_rows(), 2);
    }

    #[test]
    fn test_sort_time_descending_across_batches() {
        let b1 = batch(vec!["a", "b"], vec![10, 30], vec![Some(1.0), Some(1.0)]);
        let b2 = batch(vec!["c", "d"], vec![20, 30], vec![Some(1.0), Some(1.0)]);
        let schema = b1.schema();

        let out = sort_time_descending(&schema, &[b1, b2], 1, 0).unwrap();
        assert_eq!(ids(&out), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_sort_empty() {
        let b = batch(vec![], vec![], vec![]);
        let schema = b.schema();
        let out = sort_time_descending(&schema, &[], 1, 0).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.schema(), schema);
    }

    #[test]
    fn test_project() {
        let input = batch(vec!["a"], vec![1], vec![Some(2.0)]);
        let out = project(&input, &["mag", "id"]).unwrap();
        assert_eq!(out.schema().field(0).name(), "mag");
        assert_eq!(out.schema().field(1).name(), "id");
        assert!(matches!(
            project(&input, &["depth"]),
            Err(QuakeError::ColumnNotFound(_))
        ));
    }
}
