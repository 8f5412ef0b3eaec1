use crate::error::Result;
use crate::readers::columns::{column, i64_values, read_batches, string_values, time_values};
use crate::utils::constants::{COL_COUNT, COL_END, COL_START, COL_STATION_ID, COL_VAR, COL_YEAR};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// First and last year with data, per station
pub type YearSpans = HashMap<String, (i32, i32)>;

/// Number of records per year, per station
pub type YearCounts = HashMap<String, BTreeMap<i32, u64>>;

/// First and last observation instant, per station
pub type TimeSpans = HashMap<String, (DateTime<Utc>, DateTime<Utc>)>;

/// Reads the per-station time coverage tables of each source
#[derive(Debug, Default)]
pub struct InventoryReader;

impl InventoryReader {
    pub fn new() -> Self {
        Self
    }

    /// Long-form inventory (`station_id`, `var`, `start`, `end`) restricted to one variable
    pub fn read_year_spans(&self, path: &Path, var: &str) -> Result<YearSpans> {
        let columns = [COL_STATION_ID, COL_VAR, COL_START, COL_END];
        let mut spans = YearSpans::new();

        for batch in read_batches(path, Some(&columns[..]))? {
            let ids = string_values(column(&batch, COL_STATION_ID)?)?;
            let vars = string_values(column(&batch, COL_VAR)?)?;
            let starts = i64_values(column(&batch, COL_START)?)?;
            let ends = i64_values(column(&batch, COL_END)?)?;

            for row in 0..batch.num_rows() {
                if vars[row].as_deref() != Some(var) {
                    continue;
                }
                if let (Some(id), Some(start), Some(end)) = (&ids[row], starts[row], ends[row]) {
                    let span = spans.entry(id.clone()).or_insert((start as i32, end as i32));
                    span.0 = span.0.min(start as i32);
                    span.1 = span.1.max(end as i32);
                }
            }
        }

        Ok(spans)
    }

    /// Yearly record counts (`station_id`, `year`, `count`)
    pub fn read_year_counts(&self, path: &Path) -> Result<YearCounts> {
        let columns = [COL_STATION_ID, COL_YEAR, COL_COUNT];
        let mut counts = YearCounts::new();

        for batch in read_batches(path, Some(&columns[..]))? {
            let ids = string_values(column(&batch, COL_STATION_ID)?)?;
            let years = i64_values(column(&batch, COL_YEAR)?)?;
            let values = i64_values(column(&batch, COL_COUNT)?)?;

            for row in 0..batch.num_rows() {
                if let (Some(id), Some(year)) = (&ids[row], years[row]) {
                    let count = values[row].unwrap_or(0).max(0) as u64;
                    *counts
                        .entry(id.clone())
                        .or_default()
                        .entry(year as i32)
                        .or_insert(0) += count;
                }
            }
        }

        Ok(counts)
    }

    /// Timestamp coverage (`station_id`, `start`, `end`)
    pub fn read_time_spans(&self, path: &Path) -> Result<TimeSpans> {
        let columns = [COL_STATION_ID, COL_START, COL_END];
        let mut spans = TimeSpans::new();

        for batch in read_batches(path, Some(&columns[..]))? {
            let ids = string_values(column(&batch, COL_STATION_ID)?)?;
            let starts = time_values(column(&batch, COL_START)?)?;
            let ends = time_values(column(&batch, COL_END)?)?;

            for row in 0..batch.num_rows() {
                if let (Some(id), Some(start), Some(end)) = (&ids[row], starts[row], ends[row]) {
                    spans.insert(id.clone(), (start, end));
                }
            }
        }

        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::test_support::write_batch;
    use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray, TimestampSecondArray};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_year_spans_for_one_variable() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("inventory.parquet");
        write_batch(
            &path,
            vec![
                ("station_id", Arc::new(StringArray::from(vec!["A", "A", "B"])) as ArrayRef),
                ("var", Arc::new(StringArray::from(vec!["PRCP", "TMAX", "TMAX"]))),
                ("start", Arc::new(Int32Array::from(vec![1950, 1900, 2000]))),
                ("end", Arc::new(Int32Array::from(vec![2020, 2021, 2010]))),
            ],
        );

        let spans = InventoryReader::new().read_year_spans(&path, "PRCP")?;
        assert_eq!(spans.len(), 1);
        assert_eq!(spans["A"], (1950, 2020));

        let spans = InventoryReader::new().read_year_spans(&path, "TMAX")?;
        assert_eq!(spans["A"], (1900, 2021));
        assert_eq!(spans["B"], (2000, 2010));
        Ok(())
    }

    #[test]
    fn test_year_counts() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("inventory.parquet");
        write_batch(
            &path,
            vec![
                ("station_id", Arc::new(StringArray::from(vec!["A", "A", "B"])) as ArrayRef),
                ("year", Arc::new(Int64Array::from(vec![2019, 2020, 2020]))),
                ("count", Arc::new(Int64Array::from(vec![0, 8760, 12]))),
            ],
        );

        let counts = InventoryReader::new().read_year_counts(&path)?;
        assert_eq!(counts["A"].get(&2019), Some(&0));
        assert_eq!(counts["A"].get(&2020), Some(&8760));
        assert_eq!(counts["B"].len(), 1);
        Ok(())
    }

    #[test]
    fn test_time_spans() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("inventory.parquet");
        write_batch(
            &path,
            vec![
                ("station_id", Arc::new(StringArray::from(vec!["G1"])) as ArrayRef),
                ("start", Arc::new(TimestampSecondArray::from(vec![0]))),
                ("end", Arc::new(TimestampSecondArray::from(vec![3600]))),
            ],
        );

        let spans = InventoryReader::new().read_time_spans(&path)?;
        let (start, end) = spans["G1"];
        assert_eq!(end - start, chrono::Duration::hours(1));
        Ok(())
    }
}
