use crate::error::{Result, SeastersError};
use crate::models::{FieldValue, ObservationTable, StationTable};
use crate::utils::constants::{
    ATTR_LONG_NAME, ATTR_NAME, ATTR_UNITS, COL_ELEVATION, COL_LAT, COL_LON, COL_STATION_ID,
    COL_STATION_NAME, COL_TIME, COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE,
    COMPRESSION_SNAPPY, COMPRESSION_ZSTD, DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(SeastersError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write a wide observation table: a UTC `time` column then one column per station
    ///
    /// Table attributes are kept in the schema metadata.
    pub fn write_observations(&self, table: &ObservationTable, path: &Path) -> Result<()> {
        let time_type = DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()));
        let mut fields = vec![Field::new(COL_TIME, time_type, false)];
        fields.extend(
            table
                .columns()
                .iter()
                .map(|name| Field::new(name, DataType::Float64, true)),
        );

        let mut metadata = HashMap::new();
        metadata.insert(ATTR_NAME.to_string(), table.attrs.name.clone());
        metadata.insert(ATTR_LONG_NAME.to_string(), table.attrs.long_name.clone());
        if let Some(units) = &table.attrs.units {
            metadata.insert(ATTR_UNITS.to_string(), units.clone());
        }
        let schema = Arc::new(Schema::new(fields).with_metadata(metadata));

        let times: Vec<i64> = table.index().iter().map(|t| t.timestamp_micros()).collect();
        let mut arrays: Vec<ArrayRef> =
            vec![Arc::new(TimestampMicrosecondArray::from(times).with_timezone("UTC"))];
        arrays.extend(
            table
                .iter_columns()
                .map(|(_, values)| Arc::new(Float64Array::from(values.to_vec())) as ArrayRef),
        );

        let batch = RecordBatch::try_new(schema, arrays)?;
        self.write_batch(batch, path)?;
        debug!(
            "Wrote {} rows x {} stations to {}",
            table.n_rows(),
            table.n_columns(),
            path.display()
        );
        Ok(())
    }

    /// Write station metadata, extra attributes included
    ///
    /// Extra attributes holding only numbers become Float64 columns, any other
    /// extra attribute is written as text.
    pub fn write_stations(&self, stations: &StationTable, path: &Path) -> Result<()> {
        let mut fields = vec![
            Field::new(COL_STATION_ID, DataType::Utf8, false),
            Field::new(COL_LAT, DataType::Float64, false),
            Field::new(COL_LON, DataType::Float64, false),
            Field::new(COL_ELEVATION, DataType::Float64, true),
            Field::new(COL_STATION_NAME, DataType::Utf8, false),
        ];
        let mut arrays: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                stations.iter().map(|s| s.station_id.as_str()),
            )),
            Arc::new(Float64Array::from_iter_values(stations.iter().map(|s| s.lat))),
            Arc::new(Float64Array::from_iter_values(stations.iter().map(|s| s.lon))),
            Arc::new(Float64Array::from(
                stations.iter().map(|s| s.elevation).collect::<Vec<_>>(),
            )),
            Arc::new(StringArray::from_iter_values(
                stations.iter().map(|s| s.station_name.as_str()),
            )),
        ];

        for name in stations.extra_columns() {
            let values: Vec<&FieldValue> = stations
                .iter()
                .map(|s| s.extra.get(&name).unwrap_or(&FieldValue::Null))
                .collect();
            let numeric = values
                .iter()
                .all(|v| matches!(v, FieldValue::Number(_) | FieldValue::Null));

            if numeric {
                let column: Vec<Option<f64>> = values
                    .iter()
                    .map(|v| match v {
                        FieldValue::Number(n) => Some(*n),
                        _ => None,
                    })
                    .collect();
                fields.push(Field::new(&name, DataType::Float64, true));
                arrays.push(Arc::new(Float64Array::from(column)));
            } else {
                let column: Vec<Option<String>> = values
                    .iter()
                    .map(|v| match v {
                        FieldValue::Null => None,
                        other => Some(other.to_string()),
                    })
                    .collect();
                fields.push(Field::new(&name, DataType::Utf8, true));
                arrays.push(Arc::new(StringArray::from(column)));
            }
        }

        let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?;
        self.write_batch(batch, path)?;
        debug!("Wrote {} stations to {}", stations.len(), path.display());
        Ok(())
    }

    fn write_batch(&self, batch: RecordBatch, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(())
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Get statistics of an existing Parquet file
pub fn get_file_info(path: &Path) -> Result<ParquetFileInfo> {
    use parquet::file::reader::{FileReader, SerializedFileReader};

    let file = File::open(path)?;
    let reader = SerializedFileReader::new(file)?;
    let metadata = reader.metadata();

    let file_metadata = metadata.file_metadata();
    let row_groups = metadata.num_row_groups();
    let total_rows = file_metadata.num_rows();
    let file_size = std::fs::metadata(path)?.len();

    let row_group_sizes: Vec<i64> = metadata.row_groups().iter().map(|rg| rg.num_rows()).collect();
    let compression = metadata
        .row_groups()
        .first()
        .and_then(|rg| rg.columns().first())
        .map(|c| c.compression());
    let columns = file_metadata
        .schema_descr()
        .columns()
        .iter()
        .map(|c| c.path().string())
        .collect();

    Ok(ParquetFileInfo {
        total_rows,
        row_groups: row_groups as i32,
        row_group_sizes,
        file_size,
        compression,
        columns,
    })
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    /// Compression of the first column chunk, if any row group exists
    pub compression: Option<Compression>,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        let compression = self
            .compression
            .map(|c| format!("{:?}", c))
            .unwrap_or_else(|| "n/a".to_string());
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Columns: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.columns.len(),
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            compression,
            avg_rows
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{StationRecord, TableAttrs};
    use crate::readers::StationReader;
    use chrono::{TimeZone, Utc};
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn sample_table() -> ObservationTable {
        let index = (0..3)
            .map(|h| Utc.with_ymd_and_hms(2020, 6, 1, h, 0, 0).unwrap())
            .collect();
        ObservationTable::from_columns(
            TableAttrs::new("Precipitation", "Precipitation", "mm"),
            index,
            vec!["GSDR:DE_00001".to_string(), "GHCNh:USW00094728".to_string()],
            vec![
                vec![Some(0.2), None, Some(1.4)],
                vec![None, Some(0.0), Some(3.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_write_observations() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        ParquetWriter::new().write_observations(&sample_table(), temp_file.path())?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(temp_file.path())?)?;
        let schema = builder.schema().clone();
        assert_eq!(schema.metadata().get("units").map(String::as_str), Some("mm"));
        assert_eq!(schema.field(0).name(), "time");
        assert_eq!(schema.field(2).name(), "GHCNh:USW00094728");

        let batches: Vec<RecordBatch> = builder.build()?.collect::<std::result::Result<_, _>>()?;
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);
        assert_eq!(batches[0].column(1).null_count(), 1);

        Ok(())
    }

    #[test]
    fn test_write_stations_round_trip() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        let stations = StationTable::new(vec![
            StationRecord::new("DE_00001", 52.1, 13.4, Some(34.0), "BERLIN")
                .with_extra("resolution", FieldValue::Number(0.1))
                .with_extra("original_units", FieldValue::Text("mm".to_string())),
            StationRecord::new("DE_00002", 48.1, 11.6, None, "MUENCHEN"),
        ])?;

        ParquetWriter::new().write_stations(&stations, temp_file.path())?;
        let read = StationReader::new().read_stations(temp_file.path())?;

        assert_eq!(read.len(), 2);
        let second = read.get("DE_00002").unwrap();
        assert_eq!(second.elevation, None);
        assert_eq!(second.field("resolution"), Some(FieldValue::Null));
        let first = read.get("DE_00001").unwrap();
        assert_eq!(first.field("resolution"), Some(FieldValue::Number(0.1)));
        assert_eq!(
            first.field("original_units"),
            Some(FieldValue::Text("mm".to_string()))
        );

        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let compressions = ["snappy", "gzip", "lz4", "zstd", "none"];

        for compression in &compressions {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let temp_file = NamedTempFile::new()?;

            let result = writer.write_observations(&sample_table(), temp_file.path());
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }

        assert!(ParquetWriter::new().with_compression("brotli9000").is_err());
        Ok(())
    }

    #[test]
    fn test_file_info() -> Result<()> {
        let temp_file = NamedTempFile::new()?;
        ParquetWriter::new()
            .with_row_group_size(2)
            .write_observations(&sample_table(), temp_file.path())?;

        let info = get_file_info(temp_file.path())?;
        assert_eq!(info.total_rows, 3);
        assert_eq!(info.row_groups, 2);
        assert_eq!(info.row_group_sizes, vec![2, 1]);
        assert_eq!(info.columns.len(), 3);
        assert!(info.summary().contains("Total rows: 3"));

        Ok(())
    }
}
