//! Column extraction helpers shared by the Parquet readers

use crate::error::{Result, SeastersError};
use crate::utils::constants::DEFAULT_READ_BATCH_SIZE;
use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float64Type, Int64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ProjectionMask;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Read a Parquet file, restricted to `columns` when given
///
/// Every requested column must exist in the file.
pub(crate) fn read_batches(path: &Path, columns: Option<&[&str]>) -> Result<Vec<RecordBatch>> {
    if !path.exists() {
        return Err(SeastersError::MissingData(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let mut builder =
        ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(DEFAULT_READ_BATCH_SIZE);

    if let Some(columns) = columns {
        let schema = builder.schema().clone();
        if let Some(missing) = columns.iter().find(|c| schema.index_of(c).is_err()) {
            return Err(SeastersError::MissingData(format!(
                "Column '{}' not found in {}",
                missing,
                path.display()
            )));
        }
        let roots: Vec<usize> = builder
            .parquet_schema()
            .root_schema()
            .get_fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| columns.contains(&field.name()))
            .map(|(i, _)| i)
            .collect();
        let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
        builder = builder.with_projection(mask);
    }

    debug!("Reading {}", path.display());
    let batches = builder.build()?.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(batches)
}

pub(crate) fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch.column_by_name(name).ok_or_else(|| {
        SeastersError::MissingData(format!("Column '{}' not found in record batch", name))
    })
}

/// Cast a numeric column to `f64`, nulls and NaN become `None`
pub(crate) fn f64_values(array: &ArrayRef) -> Result<Vec<Option<f64>>> {
    let casted = cast(array, &DataType::Float64)?;
    let values = casted.as_primitive_opt::<Float64Type>().ok_or_else(|| {
        SeastersError::InvalidFormat(format!("Cannot read {} as float", array.data_type()))
    })?;
    Ok(values.iter().map(|v| v.filter(|x| !x.is_nan())).collect())
}

pub(crate) fn i64_values(array: &ArrayRef) -> Result<Vec<Option<i64>>> {
    let casted = cast(array, &DataType::Int64)?;
    let values = casted.as_primitive_opt::<Int64Type>().ok_or_else(|| {
        SeastersError::InvalidFormat(format!("Cannot read {} as integer", array.data_type()))
    })?;
    Ok(values.iter().collect())
}

pub(crate) fn string_values(array: &ArrayRef) -> Result<Vec<Option<String>>> {
    let casted = cast(array, &DataType::Utf8)?;
    let values = casted.as_string_opt::<i32>().ok_or_else(|| {
        SeastersError::InvalidFormat(format!("Cannot read {} as string", array.data_type()))
    })?;
    Ok(values.iter().map(|v| v.map(str::to_string)).collect())
}

fn from_epoch(value: i64, per_second: i64) -> Option<DateTime<Utc>> {
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);
    DateTime::from_timestamp(secs, nanos as u32)
}

/// Decode a timestamp or date column as UTC instants
///
/// Timestamps store UTC epoch values whatever their time zone annotation,
/// so naive and zoned columns decode the same way.
pub(crate) fn time_values(array: &ArrayRef) -> Result<Vec<Option<DateTime<Utc>>>> {
    let invalid = || {
        SeastersError::InvalidFormat(format!(
            "Cannot read {} as a time column",
            array.data_type()
        ))
    };

    let values: Vec<Option<DateTime<Utc>>> = match array.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => array
            .as_primitive_opt::<TimestampSecondType>()
            .ok_or_else(invalid)?
            .iter()
            .map(|v| v.and_then(|v| from_epoch(v, 1)))
            .collect(),
        DataType::Timestamp(TimeUnit::Millisecond, _) => array
            .as_primitive_opt::<TimestampMillisecondType>()
            .ok_or_else(invalid)?
            .iter()
            .map(|v| v.and_then(|v| from_epoch(v, 1_000)))
            .collect(),
        DataType::Timestamp(TimeUnit::Microsecond, _) => array
            .as_primitive_opt::<TimestampMicrosecondType>()
            .ok_or_else(invalid)?
            .iter()
            .map(|v| v.and_then(|v| from_epoch(v, 1_000_000)))
            .collect(),
        DataType::Timestamp(TimeUnit::Nanosecond, _) => array
            .as_primitive_opt::<TimestampNanosecondType>()
            .ok_or_else(invalid)?
            .iter()
            .map(|v| v.and_then(|v| from_epoch(v, 1_000_000_000)))
            .collect(),
        DataType::Date32 => array
            .as_primitive_opt::<Date32Type>()
            .ok_or_else(invalid)?
            .iter()
            .map(|v| v.and_then(|days| from_epoch(i64::from(days) * 86_400, 1)))
            .collect(),
        DataType::Date64 => array
            .as_primitive_opt::<Date64Type>()
            .ok_or_else(invalid)?
            .iter()
            .map(|v| v.and_then(|v| from_epoch(v, 1_000)))
            .collect(),
        _ => return Err(invalid()),
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Date32Array, Int32Array, TimestampSecondArray};
    use std::sync::Arc;

    #[test]
    fn test_time_values() {
        let array: ArrayRef =
            Arc::new(TimestampSecondArray::from(vec![Some(0), None, Some(86_400)]).with_timezone("UTC"));
        let values = time_values(&array).unwrap();
        assert_eq!(values[0].unwrap().to_rfc3339(), "1970-01-01T00:00:00+00:00");
        assert!(values[1].is_none());
        assert_eq!(values[2].unwrap().to_rfc3339(), "1970-01-02T00:00:00+00:00");

        let dates: ArrayRef = Arc::new(Date32Array::from(vec![1]));
        let values = time_values(&dates).unwrap();
        assert_eq!(values[0].unwrap().to_rfc3339(), "1970-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_negative_epoch() {
        let array: ArrayRef = Arc::new(TimestampSecondArray::from(vec![-1]));
        let values = time_values(&array).unwrap();
        assert_eq!(values[0].unwrap().to_rfc3339(), "1969-12-31T23:59:59+00:00");
    }

    #[test]
    fn test_f64_values_from_integers() {
        let array: ArrayRef = Arc::new(Int32Array::from(vec![Some(3), None]));
        assert_eq!(f64_values(&array).unwrap(), vec![Some(3.0), None]);
    }

    #[test]
    fn test_non_time_column_rejected() {
        let array: ArrayRef = Arc::new(Int32Array::from(vec![1]));
        assert!(time_values(&array).is_err());
    }
}
