pub(crate) mod columns;
pub mod inventory_reader;
pub mod series_reader;
pub mod station_reader;

pub use inventory_reader::{InventoryReader, TimeSpans, YearCounts, YearSpans};
pub use series_reader::SeriesReader;
pub use station_reader::StationReader;

#[cfg(test)]
pub(crate) mod test_support {
    use arrow::array::{ArrayRef, RecordBatch};
    use parquet::arrow::ArrowWriter;
    use std::fs::File;
    use std::path::Path;

    /// Write named columns as a single-batch Parquet file
    pub fn write_batch(path: &Path, columns: Vec<(&str, ArrayRef)>) {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let file = File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }
}
