use crate::error::{Result, SeastersError};
use crate::models::{TableAttrs, TimeSeries};
use crate::readers::columns::{column, f64_values, read_batches, time_values};
use crate::utils::constants::COL_TIME;
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

/// Reads one variable of a per-station observation file
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesReader;

impl SeriesReader {
    pub fn new() -> Self {
        Self
    }

    /// Read `column` against the time index, dropping missing observations
    ///
    /// Only the time and value columns are decoded.
    pub fn read_series(&self, path: &Path, column_name: &str, attrs: TableAttrs) -> Result<TimeSeries> {
        let columns = [COL_TIME, column_name];
        let batches = read_batches(path, Some(&columns[..]))?;

        let mut pairs: Vec<(DateTime<Utc>, f64)> = Vec::new();
        let mut dropped = 0usize;
        for batch in &batches {
            let times = time_values(column(batch, COL_TIME)?)?;
            let values = f64_values(column(batch, column_name)?)?;
            for (t, v) in times.into_iter().zip(values) {
                match (t, v) {
                    (Some(t), Some(v)) => pairs.push((t, v)),
                    _ => dropped += 1,
                }
            }
        }

        debug!(
            "{}: {} observations of '{}' ({} missing dropped)",
            path.display(),
            pairs.len(),
            column_name,
            dropped
        );

        TimeSeries::from_pairs(attrs, pairs).map_err(|e| {
            SeastersError::InvalidFormat(format!("{}: {}", path.display(), e))
        })
    }
}
