use crate::error::Result;
use crate::models::ObservationTable;
use crate::utils::constants::COL_TIME;
use chrono::SecondsFormat;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Writes observation tables as wide CSV: `time` then one column per station
///
/// Missing observations are left as empty cells.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn write_observations(&self, table: &ObservationTable, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_to(table, file)?;
        debug!("Wrote {} rows to {}", table.n_rows(), path.display());
        Ok(())
    }

    pub fn write_to<W: Write>(&self, table: &ObservationTable, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        let mut header = Vec::with_capacity(table.n_columns() + 1);
        header.push(COL_TIME);
        header.extend(table.columns().iter().map(String::as_str));
        writer.write_record(&header)?;

        let columns: Vec<&[Option<f64>]> = table.iter_columns().map(|(_, values)| values).collect();
        for (row, time) in table.index().iter().enumerate() {
            let mut record = Vec::with_capacity(columns.len() + 1);
            record.push(time.to_rfc3339_opts(SecondsFormat::Secs, true));
            record.extend(
                columns
                    .iter()
                    .map(|values| values[row].map(|v| v.to_string()).unwrap_or_default()),
            );
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
