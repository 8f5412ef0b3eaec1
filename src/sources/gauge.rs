//! Rain gauge data across GHCNd, GHCNh and GSDR
//!
//! Station identifiers are prefixed with their source keyword (`GHCNd:...`)
//! so that tables from several sources can be combined.

use crate::config::PathConfig;
use crate::error::{Result, SeastersError};
use crate::models::{ObservationTable, StationTable, TableAttrs, TimeBound, TimeRange, TimeSeries};
use crate::processors::{check_units, TimeAligner};
use crate::sources::{
    GaugeSource, GhcndSource, GhcnhSource, GsdrSource, SearchCriteria, SourceLoader,
};
use crate::utils::constants::{
    DEFAULT_GAUGE_UNITS, GHCND_PRECIPITATION, GSDR_PRECIPITATION_COLUMN, SOURCE_GHCND,
    SOURCE_GHCNH, SOURCE_GSDR,
};
use crate::utils::memory::{format_memory, MemoryEstimate};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// A rain gauge data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    Ghcnd,
    Ghcnh,
    Gsdr,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::Ghcnd, Source::Ghcnh, Source::Gsdr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ghcnd => SOURCE_GHCND,
            Source::Ghcnh => SOURCE_GHCNH,
            Source::Gsdr => SOURCE_GSDR,
        }
    }

    fn valid_names() -> Vec<String> {
        Self::ALL.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl FromStr for Source {
    type Err = SeastersError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| SeastersError::InvalidSource {
                source_name: s.to_string(),
                valid: Self::valid_names(),
            })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulation period of a precipitation total
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    OneDay,
    TwentyOneHours,
    EighteenHours,
    FifteenHours,
    TwelveHours,
    NineHours,
    SixHours,
    ThreeHours,
    OneHour,
}

impl Period {
    /// Every period, from the longest to the shortest
    pub const ALL: [Period; 9] = [
        Period::OneDay,
        Period::TwentyOneHours,
        Period::EighteenHours,
        Period::FifteenHours,
        Period::TwelveHours,
        Period::NineHours,
        Period::SixHours,
        Period::ThreeHours,
        Period::OneHour,
    ];

    pub fn hours(&self) -> u32 {
        match self {
            Period::OneDay => 24,
            Period::TwentyOneHours => 21,
            Period::EighteenHours => 18,
            Period::FifteenHours => 15,
            Period::TwelveHours => 12,
            Period::NineHours => 9,
            Period::SixHours => 6,
            Period::ThreeHours => 3,
            Period::OneHour => 1,
        }
    }

    pub fn name(&self) -> String {
        format!("precipitation_{}", self.label().replace(' ', "_"))
    }

    /// Human readable duration, e.g. `1 day` or `6 hour`
    pub fn label(&self) -> String {
        match self {
            Period::OneDay => "1 day".to_string(),
            other => format!("{} hour", other.hours()),
        }
    }

    /// Sources publishing totals over this period
    pub fn sources(&self) -> &'static [Source] {
        match self {
            Period::OneDay => &[Source::Ghcnd, Source::Ghcnh],
            Period::OneHour => &[Source::Ghcnh, Source::Gsdr],
            _ => &[Source::Ghcnh],
        }
    }

    pub fn attrs(&self, units: &str) -> TableAttrs {
        let name = format!("{} total liquid precipitation", self.label());
        TableAttrs::new(name.clone(), format!("{} accumulation", name), units)
    }

    /// Variable holding this period's totals in `source` files
    pub fn var(&self, source: Source) -> String {
        match source {
            Source::Ghcnd => GHCND_PRECIPITATION.to_string(),
            Source::Ghcnh => GhcnhSource::accumulation_var(self.hours()),
            Source::Gsdr => GSDR_PRECIPITATION_COLUMN.to_string(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for Period {
    type Err = SeastersError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|period| period.name() == s)
            .ok_or_else(|| {
                SeastersError::InvalidArgument(format!(
                    "'{}' is not a valid accumulation period. Accepted values are in {:?}",
                    s,
                    Self::ALL.iter().map(Period::name).collect::<Vec<_>>()
                ))
            })
    }
}

/// Search criteria, sources and output units of a gauge data request
#[derive(Debug, Clone)]
pub struct GaugeQuery {
    criteria: SearchCriteria,
    sources: Vec<Source>,
    units: String,
}

impl GaugeQuery {
    pub fn new() -> Self {
        Self {
            criteria: SearchCriteria::new(),
            sources: Source::ALL.to_vec(),
            units: DEFAULT_GAUGE_UNITS.to_string(),
        }
    }

    /// Metadata filter such as `lat > 40 & elevation < 500`
    pub fn with_filter(mut self, condition: &str) -> Result<Self> {
        self.criteria = self.criteria.with_filter(condition)?;
        Ok(self)
    }

    pub fn with_time_range(mut self, time_range: TimeRange) -> Self {
        self.criteria = self.criteria.with_time_range(time_range);
        self
    }

    /// Time range from bounds that may lack a time zone
    pub fn with_bounds(self, start: impl Into<TimeBound>, end: impl Into<TimeBound>) -> Result<Self> {
        Ok(self.with_time_range(TimeRange::localize(start, end)?))
    }

    pub fn with_sources<S: AsRef<str>>(mut self, sources: &[S]) -> Result<Self> {
        let mut parsed = Vec::with_capacity(sources.len());
        for source in sources {
            let source: Source = source.as_ref().parse()?;
            if !parsed.contains(&source) {
                parsed.push(source);
            }
        }
        self.sources = parsed;
        Ok(self)
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn uses(&self, source: Source) -> bool {
        self.sources.contains(&source)
    }
}

impl Default for GaugeQuery {
    fn default() -> Self {
        Self::new()
    }
}

/// Gauge records with station ids as columns, and the matching metadata
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeData {
    pub data: ObservationTable,
    pub metadata: StationTable,
}

/// Stations matching a gauge search
#[derive(Debug, Clone, Default)]
pub struct GaugeSearch {
    pub metadata: StationTable,
    /// Estimated memory footprint in bytes, when requested
    pub memory_est: Option<u64>,
}

/// Gauge records per accumulation period
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodData {
    pub data: BTreeMap<Period, ObservationTable>,
    /// Metadata of every station found in at least one period
    pub metadata: StationTable,
}

impl PeriodData {
    pub fn get(&self, period: Period) -> Option<&ObservationTable> {
        self.data.get(&period)
    }
}

/// Searches and loads rain gauge data from several sources at once
pub struct GaugeLoader {
    paths: PathConfig,
    loader: SourceLoader,
}

impl GaugeLoader {
    pub fn new(paths: PathConfig) -> Self {
        Self {
            paths,
            loader: SourceLoader::default(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        let show_progress = self.loader.show_progress();
        self.loader = SourceLoader::new(max_workers).with_progress(show_progress);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.loader = self.loader.with_progress(show_progress);
        self
    }

    pub fn paths(&self) -> &PathConfig {
        &self.paths
    }

    fn source(&self, source: Source) -> Box<dyn GaugeSource> {
        let paths = self.paths.clone();
        match source {
            Source::Ghcnd => Box::new(GhcndSource::new(paths)),
            Source::Ghcnh => Box::new(GhcnhSource::new(paths)),
            Source::Gsdr => Box::new(GsdrSource::new(paths)),
        }
    }

    /// Search every requested source for its default precipitation variable
    pub fn search(&self, query: &GaugeQuery, memory: MemoryEstimate) -> Result<GaugeSearch> {
        let mut tables = Vec::new();
        let mut est_bytes = 0;
        for &source in query.sources() {
            let gauge = self.source(source);
            let found = self
                .loader
                .search(gauge.as_ref(), gauge.default_var(), query.criteria(), memory)?;
            est_bytes += found.memory_est.unwrap_or(0);
            tables.push(found.metadata.with_source_prefix(source.as_str()));
        }

        let mut metadata = StationTable::concat(tables)?;
        metadata.sort_by_id();
        Ok(GaugeSearch {
            metadata,
            memory_est: report_memory(memory, est_bytes),
        })
    }

    /// Search every requested source, for all accumulation periods
    pub fn search_all(&self, query: &GaugeQuery, memory: MemoryEstimate) -> Result<GaugeSearch> {
        let mut tables = Vec::new();
        let mut est_bytes = 0;
        for period in Period::ALL {
            for &source in period.sources().iter().filter(|s| query.uses(**s)) {
                let gauge = self.source(source);
                let found =
                    self.loader
                        .search(gauge.as_ref(), &period.var(source), query.criteria(), memory)?;
                est_bytes += found.memory_est.unwrap_or(0);
                tables.push(found.metadata.with_source_prefix(source.as_str()));
            }
        }

        let mut metadata = StationTable::concat_dedup(tables);
        metadata.sort_by_id();
        Ok(GaugeSearch {
            metadata,
            memory_est: report_memory(memory, est_bytes),
        })
    }

    /// Load precipitation from every requested source as one table
    ///
    /// Data columns follow the metadata, which is sorted by prefixed id.
    pub fn load(&self, query: &GaugeQuery) -> Result<GaugeData> {
        let parts = query
            .sources()
            .iter()
            .map(|&source| {
                let gauge = self.source(source);
                self.load_source(source, gauge.default_var(), query)
            })
            .collect::<Result<Vec<_>>>()?;

        let attrs = TableAttrs::new(
            "Precipitation",
            "Total liquid precipitation",
            query.units(),
        );
        combine(attrs, parts)
    }

    /// Load precipitation as one series per station, keyed by prefixed id
    pub fn load_per_station(
        &self,
        query: &GaugeQuery,
    ) -> Result<(BTreeMap<String, TimeSeries>, StationTable)> {
        let mut all_series = BTreeMap::new();
        let mut tables = Vec::new();
        for &source in query.sources() {
            let gauge = self.source(source);
            let (series, metadata) = self.loader.load_per_station(
                gauge.as_ref(),
                gauge.default_var(),
                query.criteria(),
            )?;
            for (station_id, series) in series {
                let series = check_units(series, query.units())?;
                all_series.insert(format!("{}:{}", source, station_id), series);
            }
            tables.push(metadata.with_source_prefix(source.as_str()));
        }

        let mut metadata = StationTable::concat(tables)?;
        metadata.sort_by_id();
        Ok((all_series, metadata))
    }

    /// Load every accumulation period available in the requested sources
    ///
    /// Periods without any requested source are left out.
    pub fn load_all(&self, query: &GaugeQuery) -> Result<PeriodData> {
        let mut data = BTreeMap::new();
        let mut all_metadata = Vec::new();

        for period in Period::ALL {
            let sources: Vec<Source> = period
                .sources()
                .iter()
                .copied()
                .filter(|s| query.uses(*s))
                .collect();
            if sources.is_empty() {
                debug!("No requested source for {}", period);
                continue;
            }

            let parts = sources
                .into_iter()
                .map(|source| self.load_source(source, &period.var(source), query))
                .collect::<Result<Vec<_>>>()?;
            let combined = combine(period.attrs(query.units()), parts)?;

            info!(
                "{}: {} stations, {} time steps",
                period,
                combined.metadata.len(),
                combined.data.n_rows()
            );
            data.insert(period, combined.data);
            all_metadata.push(combined.metadata);
        }

        let mut metadata = StationTable::concat_dedup(all_metadata);
        metadata.sort_by_id();
        Ok(PeriodData { data, metadata })
    }

    /// Load `var` from one source, with prefixed ids and the query's units
    fn load_source(&self, source: Source, var: &str, query: &GaugeQuery) -> Result<GaugeData> {
        let gauge = self.source(source);
        let (data, metadata) = self.loader.load(gauge.as_ref(), var, query.criteria())?;

        let prefix = source.as_str();
        let data = data.rename_columns(|id| format!("{}:{}", prefix, id));
        let data = check_units(data, query.units())?;
        Ok(GaugeData {
            data,
            metadata: metadata.with_source_prefix(prefix),
        })
    }
}

/// Join per-source tables column-wise, sorted by station id
fn combine(attrs: TableAttrs, parts: Vec<GaugeData>) -> Result<GaugeData> {
    let (tables, metadata): (Vec<_>, Vec<_>) =
        parts.into_iter().map(|p| (p.data, p.metadata)).unzip();

    let mut metadata = StationTable::concat(metadata)?;
    metadata.sort_by_id();
    let data = TimeAligner::new()
        .concat(attrs, tables)?
        .select_columns(&metadata.ids())?;
    Ok(GaugeData { data, metadata })
}

fn report_memory(memory: MemoryEstimate, est_bytes: u64) -> Option<u64> {
    if memory == MemoryEstimate::None {
        return None;
    }
    info!("Memory estimate when loading: {}.", format_memory(est_bytes));
    Some(est_bytes)
}
