use crate::config::PathConfig;
use crate::error::Result;
use crate::models::{ghcnd_variables, TableAttrs};
use crate::readers::{InventoryReader, StationReader};
use crate::sources::{describe_filter, search_fallback, GaugeSource, SearchCriteria, Selection};
use crate::utils::constants::{GHCND_PRECIPITATION, SOURCE_GHCND};
use tracing::info;

/// Daily Global Historical Climatology Network
///
/// One file per station holds every variable; the inventory gives the first
/// and last year of each (station, variable) pair.
#[derive(Debug, Clone)]
pub struct GhcndSource {
    paths: PathConfig,
}

impl GhcndSource {
    pub fn new(paths: PathConfig) -> Self {
        Self { paths }
    }
}

impl GaugeSource for GhcndSource {
    fn name(&self) -> &'static str {
        SOURCE_GHCND
    }

    fn default_var(&self) -> &'static str {
        GHCND_PRECIPITATION
    }

    fn attrs(&self, var: &str) -> Result<TableAttrs> {
        Ok(TableAttrs::from_variable(ghcnd_variables()?.get(var)?))
    }

    fn select(&self, var: &str, criteria: &SearchCriteria) -> Result<Selection> {
        let mut stations = StationReader::new().read_stations(&self.paths.ghcnd_stations())?;
        criteria.check_fields(&stations)?;

        // Only stations with an inventory entry for `var` have it in their file
        let spans = InventoryReader::new().read_year_spans(&self.paths.ghcnd_inventory(), var)?;
        stations.retain(|s| spans.contains_key(&s.station_id));

        if let Some(range) = &criteria.time_range {
            stations.retain(|s| {
                spans
                    .get(&s.station_id)
                    .is_some_and(|(first, last)| range.overlaps_years(*first, *last))
            });
            if stations.is_empty() {
                return Ok(search_fallback(
                    SOURCE_GHCND,
                    "time_range",
                    format!("{} - {}", range.start(), range.end()),
                ));
            }
        }

        let stations = criteria.filter_stations(stations)?;
        if stations.is_empty() {
            return Ok(search_fallback(
                SOURCE_GHCND,
                "filter_condition",
                describe_filter(criteria),
            ));
        }

        info!("Search completed.");
        let files = stations
            .iter()
            .map(|s| (s.station_id.clone(), vec![self.paths.ghcnd_file(&s.station_id)]))
            .collect();
        Ok(Selection {
            metadata: stations,
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeRange;
    use crate::readers::test_support::write_batch;
    use arrow::array::{ArrayRef, Float64Array, Int32Array, StringArray};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn write_stations(paths: &PathConfig) {
        let path = paths.ghcnd_stations();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_batch(
            &path,
            vec![
                (
                    "station_id",
                    Arc::new(StringArray::from(vec!["OLD", "NEW", "TEMP"])) as ArrayRef,
                ),
                ("lat", Arc::new(Float64Array::from(vec![10.0, 20.0, 30.0])) as ArrayRef),
                ("lon", Arc::new(Float64Array::from(vec![0.0, 0.0, 0.0])) as ArrayRef),
                (
                    "elevation",
                    Arc::new(Float64Array::from(vec![Some(5.0), None, Some(1.0)])) as ArrayRef,
                ),
                (
                    "station_name",
                    Arc::new(StringArray::from(vec!["OLD", "NEW", "TEMP"])) as ArrayRef,
                ),
            ],
        );
    }

    // OLD recorded PRCP until 1950, NEW since 2015, TEMP only ever recorded TMAX
    fn write_inventory(paths: &PathConfig) {
        write_batch(
            &paths.ghcnd_inventory(),
            vec![
                (
                    "station_id",
                    Arc::new(StringArray::from(vec!["OLD", "NEW", "NEW", "TEMP"])) as ArrayRef,
                ),
                (
                    "var",
                    Arc::new(StringArray::from(vec!["PRCP", "PRCP", "TMAX", "TMAX"])) as ArrayRef,
                ),
                ("start", Arc::new(Int32Array::from(vec![1900, 2015, 1950, 1990])) as ArrayRef),
                ("end", Arc::new(Int32Array::from(vec![1950, 2024, 2024, 2024])) as ArrayRef),
            ],
        );
    }

    fn data_root() -> (TempDir, PathConfig) {
        let dir = TempDir::new().unwrap();
        let paths = PathConfig::from_root(dir.path()).unwrap();
        write_stations(&paths);
        write_inventory(&paths);
        (dir, paths)
    }

    #[test]
    fn test_select_requires_inventory_entry() {
        let (_dir, paths) = data_root();

        let selection = GhcndSource::new(paths.clone())
            .select("PRCP", &SearchCriteria::new())
            .unwrap();
        assert_eq!(selection.metadata.ids(), vec!["OLD", "NEW"]);
        assert_eq!(selection.files["NEW"], vec![paths.ghcnd_file("NEW")]);
        assert!(!selection.files.contains_key("TEMP"));

        let selection = GhcndSource::new(paths)
            .select("TMAX", &SearchCriteria::new())
            .unwrap();
        assert_eq!(selection.metadata.ids(), vec!["NEW", "TEMP"]);
    }

    #[test]
    fn test_select_by_year_overlap() {
        let (_dir, paths) = data_root();

        // A range spanning the whole coverage of NEW still overlaps it
        let range = TimeRange::new(
            Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let criteria = SearchCriteria::new().with_time_range(range);
        let selection = GhcndSource::new(paths.clone()).select("PRCP", &criteria).unwrap();
        assert_eq!(selection.metadata.ids(), vec!["NEW"]);

        let range = TimeRange::new(
            Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let criteria = SearchCriteria::new().with_time_range(range);
        let selection = GhcndSource::new(paths).select("PRCP", &criteria).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_unknown_filter_field_fails_before_coverage() {
        let (_dir, paths) = data_root();

        let range = TimeRange::new(
            Utc.with_ymd_and_hms(1700, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(1700, 12, 31, 0, 0, 0).unwrap(),
        )
        .unwrap();
        let criteria = SearchCriteria::new()
            .with_filter("altitude > 3")
            .unwrap()
            .with_time_range(range);
        assert!(matches!(
            GhcndSource::new(paths).select("PRCP", &criteria),
            Err(crate::error::SeastersError::Filter { .. })
        ));
    }
}
