use crate::config::PathConfig;
use crate::error::{Result, SeastersError};
use crate::models::TableAttrs;
use crate::readers::{InventoryReader, StationReader};
use crate::sources::{describe_filter, search_fallback, GaugeSource, SearchCriteria, Selection};
use crate::utils::constants::{DEFAULT_GAUGE_UNITS, GSDR_PRECIPITATION_COLUMN, SOURCE_GSDR};
use tracing::info;

/// Global Sub-Daily Rainfall dataset
///
/// Hourly precipitation only, one file per station. The inventory holds the
/// first and last record timestamp of each station.
#[derive(Debug, Clone)]
pub struct GsdrSource {
    paths: PathConfig,
}

impl GsdrSource {
    pub fn new(paths: PathConfig) -> Self {
        Self { paths }
    }
}

impl GaugeSource for GsdrSource {
    fn name(&self) -> &'static str {
        SOURCE_GSDR
    }

    fn default_var(&self) -> &'static str {
        GSDR_PRECIPITATION_COLUMN
    }

    fn attrs(&self, var: &str) -> Result<TableAttrs> {
        if var != GSDR_PRECIPITATION_COLUMN {
            return Err(SeastersError::InvalidVariable {
                var: var.to_string(),
                valid: vec![GSDR_PRECIPITATION_COLUMN.to_string()],
            });
        }
        Ok(TableAttrs::new(
            GSDR_PRECIPITATION_COLUMN,
            GSDR_PRECIPITATION_COLUMN,
            DEFAULT_GAUGE_UNITS,
        ))
    }

    fn select(&self, _var: &str, criteria: &SearchCriteria) -> Result<Selection> {
        let mut stations = StationReader::new().read_stations(&self.paths.gsdr_stations())?;
        criteria.check_fields(&stations)?;
        let spans = InventoryReader::new().read_time_spans(&self.paths.gsdr_inventory())?;
        stations.retain(|s| spans.contains_key(&s.station_id));

        if let Some(range) = &criteria.time_range {
            stations.retain(|s| {
                spans
                    .get(&s.station_id)
                    .is_some_and(|(start, end)| range.overlaps(start, end))
            });
            if stations.is_empty() {
                return Ok(search_fallback(
                    SOURCE_GSDR,
                    "time_range",
                    format!("{} - {}", range.start(), range.end()),
                ));
            }
        }

        let stations = criteria.filter_stations(stations)?;
        if stations.is_empty() {
            return Ok(search_fallback(
                SOURCE_GSDR,
                "filter_condition",
                describe_filter(criteria),
            ));
        }

        info!("Search completed.");
        let files = stations
            .iter()
            .map(|s| (s.station_id.clone(), vec![self.paths.gsdr_file(&s.station_id)]))
            .collect();
        Ok(Selection {
            metadata: stations,
            files,
        })
    }
}
