use crate::config::PathConfig;
use crate::error::Result;
use crate::models::{ghcnh_variables, TableAttrs};
use crate::readers::{InventoryReader, StationReader, YearCounts};
use crate::sources::{describe_filter, search_fallback, GaugeSource, SearchCriteria, Selection};
use crate::utils::constants::{GHCNH_PRECIPITATION, SOURCE_GHCNH};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

/// Hourly Global Historical Climatology Network
///
/// Files are split by variable and by year; the inventory of each variable
/// counts records per station and year.
#[derive(Debug, Clone)]
pub struct GhcnhSource {
    paths: PathConfig,
}

impl GhcnhSource {
    pub fn new(paths: PathConfig) -> Self {
        Self { paths }
    }

    /// Variable holding precipitation accumulated over `hours`
    pub fn accumulation_var(hours: u32) -> String {
        if hours == 1 {
            GHCNH_PRECIPITATION.to_string()
        } else {
            format!("{}_{}_hour", GHCNH_PRECIPITATION, hours)
        }
    }

    /// Yearly record counts of `var` per station
    pub fn inventory(&self, var: &str) -> Result<YearCounts> {
        ghcnh_variables()?.get(var)?;
        InventoryReader::new().read_year_counts(&self.paths.ghcnh_inventory(var))
    }
}

impl GaugeSource for GhcnhSource {
    fn name(&self) -> &'static str {
        SOURCE_GHCNH
    }

    fn default_var(&self) -> &'static str {
        GHCNH_PRECIPITATION
    }

    fn attrs(&self, var: &str) -> Result<TableAttrs> {
        Ok(TableAttrs::from_variable(ghcnh_variables()?.get(var)?))
    }

    fn select(&self, var: &str, criteria: &SearchCriteria) -> Result<Selection> {
        let mut stations = StationReader::new().read_stations(&self.paths.ghcnh_station_list())?;
        criteria.check_fields(&stations)?;
        let counts = self.inventory(var)?;

        // Years with at least one record, restricted to the requested range
        let years: BTreeMap<String, Vec<i32>> = counts
            .into_iter()
            .map(|(station_id, per_year)| {
                let years = per_year
                    .into_iter()
                    .filter(|(year, count)| {
                        *count > 0
                            && criteria
                                .time_range
                                .as_ref()
                                .map_or(true, |range| range.years().contains(year))
                    })
                    .map(|(year, _)| year)
                    .collect::<Vec<_>>();
                (station_id, years)
            })
            .filter(|(_, years)| !years.is_empty())
            .collect();

        stations.retain(|s| years.contains_key(&s.station_id));
        if stations.is_empty() {
            if let Some(range) = &criteria.time_range {
                return Ok(search_fallback(
                    SOURCE_GHCNH,
                    "time_range",
                    format!("{} - {}", range.start(), range.end()),
                ));
            }
        }

        let stations = criteria.filter_stations(stations)?;
        if stations.is_empty() {
            return Ok(search_fallback(
                SOURCE_GHCNH,
                "filter_condition",
                describe_filter(criteria),
            ));
        }

        info!("Search completed.");
        let files = stations
            .iter()
            .map(|s| {
                let paths: Vec<PathBuf> = years
                    .get(&s.station_id)
                    .map(|years| {
                        years
                            .iter()
                            .map(|year| self.paths.ghcnh_file(&s.station_id, *year, var))
                            .collect()
                    })
                    .unwrap_or_default();
                (s.station_id.clone(), paths)
            })
            .collect();
        Ok(Selection {
            metadata: stations,
            files,
        })
    }
}
