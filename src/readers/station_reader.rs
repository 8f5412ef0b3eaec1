use crate::error::{Result, SeastersError};
use crate::models::{FieldValue, StationRecord, StationTable};
use crate::readers::columns::{column, f64_values, read_batches, string_values};
use crate::utils::constants::{COL_ELEVATION, COL_LAT, COL_LON, COL_STATION_ID, COL_STATION_NAME};
use std::path::Path;

const CORE_COLUMNS: [&str; 5] = [
    COL_STATION_ID,
    COL_LAT,
    COL_LON,
    COL_ELEVATION,
    COL_STATION_NAME,
];

/// Reads station metadata tables (`station_id`, `lat`, `lon`, `elevation`, `station_name`, ...)
pub struct StationReader {
    validate: bool,
}

impl StationReader {
    pub fn new() -> Self {
        Self { validate: true }
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Read a station table; columns beyond the core ones become `extra` attributes
    pub fn read_stations(&self, path: &Path) -> Result<StationTable> {
        let batches = read_batches(path, None)?;
        let mut stations = Vec::new();

        for batch in &batches {
            let ids = string_values(column(batch, COL_STATION_ID)?)?;
            let lats = f64_values(column(batch, COL_LAT)?)?;
            let lons = f64_values(column(batch, COL_LON)?)?;
            let elevations = match batch.column_by_name(COL_ELEVATION) {
                Some(array) => f64_values(array)?,
                None => vec![None; batch.num_rows()],
            };
            let names = match batch.column_by_name(COL_STATION_NAME) {
                Some(array) => string_values(array)?,
                None => vec![None; batch.num_rows()],
            };

            let schema = batch.schema();
            let mut extras: Vec<(String, Vec<FieldValue>)> = Vec::new();
            for (field, array) in schema.fields().iter().zip(batch.columns()) {
                if CORE_COLUMNS.contains(&field.name().as_str()) {
                    continue;
                }
                let values = if field.data_type().is_numeric() {
                    f64_values(array)?
                        .into_iter()
                        .map(|v| v.map(FieldValue::Number).unwrap_or(FieldValue::Null))
                        .collect()
                } else {
                    string_values(array)?
                        .into_iter()
                        .map(|v| v.map(FieldValue::Text).unwrap_or(FieldValue::Null))
                        .collect()
                };
                extras.push((field.name().clone(), values));
            }

            for row in 0..batch.num_rows() {
                let station_id = ids[row].clone().ok_or_else(|| {
                    SeastersError::InvalidFormat(format!(
                        "Missing station identifier at row {} of {}",
                        row,
                        path.display()
                    ))
                })?;
                let (lat, lon) = match (lats[row], lons[row]) {
                    (Some(lat), Some(lon)) => (lat, lon),
                    _ => {
                        return Err(SeastersError::InvalidFormat(format!(
                            "Missing coordinates for station '{}'",
                            station_id
                        )))
                    }
                };

                let mut station = StationRecord::new(
                    station_id,
                    lat,
                    lon,
                    elevations[row],
                    names[row].clone().unwrap_or_default(),
                );
                for (name, values) in &extras {
                    station.extra.insert(name.clone(), values[row].clone());
                }
                stations.push(station);
            }
        }

        let table = StationTable::new(stations)?;
        if self.validate {
            table.validate_all()?;
        }
        Ok(table)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
