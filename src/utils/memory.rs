use crate::error::Result;
use parquet::basic::Type as PhysicalType;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Per-value overhead added to variable-length columns
const BYTE_ARRAY_OVERHEAD: f64 = 50.0;

/// How to estimate the memory footprint of a search result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryEstimate {
    #[default]
    None,
    /// Every column of the station files
    Attrs,
    /// Only the requested variable column
    NoAttrs,
}

impl FromStr for MemoryEstimate {
    type Err = crate::error::SeastersError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Self::None),
            "attrs" => Ok(Self::Attrs),
            "noattrs" => Ok(Self::NoAttrs),
            _ => Err(crate::error::SeastersError::InvalidArgument(format!(
                "Provided memory estimate ('{}') is not valid. Accepted values are in {:?}",
                s,
                ["none", "attrs", "noattrs"]
            ))),
        }
    }
}

/// Estimate the in-memory size (in bytes) of a Parquet file once decoded
///
/// Only the columns listed in `usecols` are counted when it is given.
pub fn estimate_file(path: &Path, usecols: Option<&[&str]>) -> Result<u64> {
    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file)?;
    let metadata = reader.metadata();

    let mut est_bytes = 0u64;

    for rg in metadata.row_groups() {
        for column in rg.columns() {
            let name = column.column_path().string();
            if let Some(cols) = usecols {
                if !cols.contains(&name.as_str()) {
                    continue;
                }
            }

            est_bytes += column_estimate(
                column.column_type(),
                column.num_values(),
                column.compressed_size(),
            );
        }
    }

    Ok(est_bytes)
}

/// Decoded size of one column chunk from its physical type
fn column_estimate(physical_type: PhysicalType, num_values: i64, compressed_size: i64) -> u64 {
    let num_values = num_values.max(0) as u64;
    match physical_type {
        PhysicalType::BYTE_ARRAY => {
            let avg_len = compressed_size.max(0) as f64 / num_values.max(1) as f64;
            (num_values as f64 * (avg_len + BYTE_ARRAY_OVERHEAD)) as u64
        }
        PhysicalType::INT64 | PhysicalType::DOUBLE | PhysicalType::FLOAT => num_values * 8,
        PhysicalType::INT32 => num_values * 4,
        _ => num_values * 16,
    }
}

/// Estimate the in-memory size of several Parquet files
pub fn estimate_files(files: &[PathBuf], usecols: Option<&[&str]>) -> Result<u64> {
    files
        .iter()
        .map(|f| estimate_file(f, usecols))
        .sum()
}

/// Format a byte count with the appropriate binary unit
pub fn format_memory(bytes: u64) -> String {
    let mem = bytes as f64;
    if mem > 1024f64.powi(3) {
        format!("{:.2} GB", mem / 1024f64.powi(3))
    } else if mem > 1024f64.powi(2) {
        format!("{:.2} MB", mem / 1024f64.powi(2))
    } else {
        format!("{:.2} KB", mem / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_memory() {
        assert_eq!(format_memory(512), "0.50 KB");
        assert_eq!(format_memory(3 * 1024 * 1024), "3.00 MB");
        assert_eq!(format_memory(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_column_estimate() {
        // 4 values over 10 compressed bytes average 2.5 bytes each
        assert_eq!(column_estimate(PhysicalType::BYTE_ARRAY, 4, 10), 210);
        assert_eq!(column_estimate(PhysicalType::FIXED_LEN_BYTE_ARRAY, 10, 400), 160);
        assert_eq!(column_estimate(PhysicalType::DOUBLE, 10, 3), 80);
        assert_eq!(column_estimate(PhysicalType::INT32, 10, 3), 40);
        assert_eq!(column_estimate(PhysicalType::BOOLEAN, 2, 1), 32);
        assert_eq!(column_estimate(PhysicalType::BYTE_ARRAY, 0, 0), 0);
    }

    #[test]
    fn test_parse_memory_estimate() {
        assert_eq!("none".parse::<MemoryEstimate>().unwrap(), MemoryEstimate::None);
        assert_eq!("attrs".parse::<MemoryEstimate>().unwrap(), MemoryEstimate::Attrs);
        assert_eq!(
            "noattrs".parse::<MemoryEstimate>().unwrap(),
            MemoryEstimate::NoAttrs
        );
        assert!("all".parse::<MemoryEstimate>().is_err());
    }
}
