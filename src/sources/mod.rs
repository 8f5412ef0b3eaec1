//! Station searches and data loads, per source and across sources

pub mod gauge;
pub mod ghcnd;
pub mod ghcnh;
pub mod gsdr;

pub use gauge::{GaugeData, GaugeLoader, GaugeQuery, GaugeSearch, Period, PeriodData, Source};
pub use ghcnd::GhcndSource;
pub use ghcnh::GhcnhSource;
pub use gsdr::GsdrSource;

use crate::error::{Result, SeastersError};
use crate::models::{ObservationTable, StationTable, TableAttrs, TimeRange, TimeSeries};
use crate::processors::TimeAligner;
use crate::query::Filter;
use crate::readers::SeriesReader;
use crate::utils::memory::{estimate_files, format_memory, MemoryEstimate};
use crate::utils::progress::ProgressReporter;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{info, warn};

/// Metadata and time-coverage criteria applied before any data file is opened
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub filter: Option<Filter>,
    pub time_range: Option<TimeRange>,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, condition: &str) -> Result<Self> {
        self.filter = Some(Filter::parse(condition)?);
        Ok(self)
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.time_range = Some(time_range);
        self
    }

    /// Reject filters naming fields the station table lacks, before any row is dropped
    pub fn check_fields(&self, stations: &StationTable) -> Result<()> {
        match &self.filter {
            Some(filter) => filter.check_table(stations),
            None => Ok(()),
        }
    }

    /// Apply the filter (if any) to `stations`
    pub fn filter_stations(&self, stations: StationTable) -> Result<StationTable> {
        match &self.filter {
            Some(filter) => filter.apply(stations),
            None => Ok(stations),
        }
    }
}

/// Stations matching a search, with the data files holding their records
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub metadata: StationTable,
    pub files: BTreeMap<String, Vec<PathBuf>>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    pub fn all_files(&self) -> Vec<PathBuf> {
        self.metadata
            .iter()
            .filter_map(|s| self.files.get(&s.station_id))
            .flatten()
            .cloned()
            .collect()
    }
}

/// Result of a search: matching stations and an optional memory estimate in bytes
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    pub metadata: StationTable,
    pub memory_est: Option<u64>,
}

/// Log why a search came back empty
pub(crate) fn search_fallback(source: &str, cause: &str, provided: impl Display) -> Selection {
    warn!("No {} data meets the search criteria.", source);
    warn!("Limiting factor: `{}`. Provided: {}.", cause, provided);
    Selection::empty()
}

pub(crate) fn describe_filter(criteria: &SearchCriteria) -> String {
    criteria
        .filter
        .as_ref()
        .map(|f| f.condition().to_string())
        .unwrap_or_else(|| "None".to_string())
}

/// A dataset of station files that can be searched by metadata and time coverage
pub trait GaugeSource: Sync {
    /// Source keyword, used as station id prefix across sources
    fn name(&self) -> &'static str;

    fn default_var(&self) -> &'static str;

    /// Attributes of the data loaded for `var`; fails for unknown variables
    fn attrs(&self, var: &str) -> Result<TableAttrs>;

    /// Column holding `var` in the station data files
    fn value_column(&self, var: &str) -> String {
        var.to_string()
    }

    /// Select stations (and their files) matching `criteria`
    fn select(&self, var: &str, criteria: &SearchCriteria) -> Result<Selection>;
}

/// Runs searches and loads against any [`GaugeSource`]
pub struct SourceLoader {
    max_workers: usize,
    show_progress: bool,
}

impl SourceLoader {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    /// Select matching stations without loading their data
    pub fn search<S: GaugeSource + ?Sized>(
        &self,
        source: &S,
        var: &str,
        criteria: &SearchCriteria,
        memory: MemoryEstimate,
    ) -> Result<SearchResult> {
        source.attrs(var)?;
        let selection = source.select(var, criteria)?;

        let memory_est = match memory {
            MemoryEstimate::None => None,
            MemoryEstimate::Attrs | MemoryEstimate::NoAttrs => {
                let column = source.value_column(var);
                let usecols = [column.as_str()];
                let usecols = (memory == MemoryEstimate::NoAttrs).then_some(&usecols[..]);
                let est = estimate_files(&selection.all_files(), usecols)?;
                info!(
                    "{} memory estimate once loaded: {}.",
                    source.name(),
                    format_memory(est)
                );
                Some(est)
            }
        };

        Ok(SearchResult {
            metadata: selection.metadata,
            memory_est,
        })
    }

    /// Load one series per selected station, keyed by station id
    pub fn load_per_station<S: GaugeSource + ?Sized>(
        &self,
        source: &S,
        var: &str,
        criteria: &SearchCriteria,
    ) -> Result<(BTreeMap<String, TimeSeries>, StationTable)> {
        let (series, metadata) = self.read_selected(source, var, criteria)?;
        Ok((series.into_iter().collect(), metadata))
    }

    /// Load the selected stations as one table, columns in metadata order
    pub fn load<S: GaugeSource + ?Sized>(
        &self,
        source: &S,
        var: &str,
        criteria: &SearchCriteria,
    ) -> Result<(ObservationTable, StationTable)> {
        let attrs = source.attrs(var)?;
        let (series, metadata) = self.read_selected(source, var, criteria)?;
        let table = TimeAligner::new()
            .align(attrs, series)?
            .select_columns(&metadata.ids())?;
        Ok((table, metadata))
    }

    fn read_selected<S: GaugeSource + ?Sized>(
        &self,
        source: &S,
        var: &str,
        criteria: &SearchCriteria,
    ) -> Result<(Vec<(String, TimeSeries)>, StationTable)> {
        let attrs = source.attrs(var)?;
        let column = source.value_column(var);
        let selection = source.select(var, criteria)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| SeastersError::Config(e.to_string()))?;

        let progress = ProgressReporter::new(
            selection.metadata.len() as u64,
            &format!("Loading {} stations", source.name()),
            !self.show_progress,
        );

        let reader = SeriesReader::new();
        let series: Result<Vec<(String, TimeSeries)>> = pool.install(|| {
            selection
                .metadata
                .ids()
                .par_iter()
                .map(|station_id| {
                    let files = selection
                        .files
                        .get(*station_id)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    let parts = files
                        .iter()
                        .map(|path| reader.read_series(path, &column, attrs.clone()))
                        .collect::<Result<Vec<_>>>()?;
                    let mut series = TimeSeries::concat(attrs.clone(), parts)?;
                    if let Some(range) = &criteria.time_range {
                        series = series.slice(range);
                    }
                    progress.increment(1);
                    Ok((station_id.to_string(), series))
                })
                .collect()
        });
        let series = series?;

        progress.finish_with_message(&format!("Loaded {} stations", series.len()));
        Ok((series, selection.metadata))
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}
