use crate::error::{Result, SeastersError};
use crate::utils::constants::{COL_ELEVATION, COL_LAT, COL_LON, COL_STATION_ID, COL_STATION_NAME};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use validator::Validate;

/// Attributes every station record carries
pub const CORE_FIELDS: [&str; 5] = [COL_STATION_ID, COL_LAT, COL_LON, COL_ELEVATION, COL_STATION_NAME];

/// Value of a station attribute, as seen by metadata filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Null => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StationRecord {
    #[validate(length(min = 1))]
    pub station_id: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: f64,

    pub elevation: Option<f64>,

    pub station_name: String,

    /// Source-specific attributes (e.g. GSDR resolution or missing-data percentage)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, FieldValue>,
}

impl StationRecord {
    pub fn new(
        station_id: impl Into<String>,
        lat: f64,
        lon: f64,
        elevation: Option<f64>,
        station_name: impl Into<String>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            lat,
            lon,
            elevation,
            station_name: station_name.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Look up an attribute by column name
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match name {
            "station_id" => Some(FieldValue::Text(self.station_id.clone())),
            "lat" => Some(FieldValue::Number(self.lat)),
            "lon" => Some(FieldValue::Number(self.lon)),
            "elevation" => Some(
                self.elevation
                    .map(FieldValue::Number)
                    .unwrap_or(FieldValue::Null),
            ),
            "station_name" => Some(FieldValue::Text(self.station_name.clone())),
            other => self.extra.get(other).cloned(),
        }
    }

    /// Identifier with the `<source>:` prefix used across multiple sources
    pub fn with_source_prefix(mut self, source: &str) -> Self {
        self.station_id = format!("{}:{}", source, self.station_id);
        self
    }

    /// Identifier without any `<source>:` prefix
    pub fn original_id(&self) -> &str {
        self.station_id
            .split_once(':')
            .map(|(_, id)| id)
            .unwrap_or(&self.station_id)
    }

    /// WMO identifier embedded in GHCN station names, if any
    pub fn wmo_id(&self) -> Option<&str> {
        self.station_name
            .split_whitespace()
            .last()
            .filter(|token| token.len() == 5 && token.chars().all(|c| c.is_ascii_digit()))
    }
}

/// Station metadata with unique identifiers, in a stable order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StationTable {
    stations: Vec<StationRecord>,
}

impl StationTable {
    pub fn new(stations: Vec<StationRecord>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(stations.len());
        for station in &stations {
            if !seen.insert(station.station_id.as_str()) {
                return Err(SeastersError::InvalidFormat(format!(
                    "Duplicate station identifier '{}'",
                    station.station_id
                )));
            }
        }
        Ok(Self { stations })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StationRecord> {
        self.stations.iter()
    }

    pub fn as_slice(&self) -> &[StationRecord] {
        &self.stations
    }

    pub fn into_inner(self) -> Vec<StationRecord> {
        self.stations
    }

    pub fn ids(&self) -> Vec<&str> {
        self.stations.iter().map(|s| s.station_id.as_str()).collect()
    }

    pub fn get(&self, station_id: &str) -> Option<&StationRecord> {
        self.stations.iter().find(|s| s.station_id == station_id)
    }

    pub fn contains(&self, station_id: &str) -> bool {
        self.get(station_id).is_some()
    }

    pub fn retain<F: FnMut(&StationRecord) -> bool>(&mut self, f: F) {
        self.stations.retain(f);
    }

    /// Keep only stations whose predicate evaluates to `Ok(true)`, propagating the first error
    pub fn try_retain<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&StationRecord) -> Result<bool>,
    {
        let mut kept = Vec::with_capacity(self.stations.len());
        for station in self.stations.drain(..) {
            if f(&station)? {
                kept.push(station);
            }
        }
        self.stations = kept;
        Ok(())
    }

    pub fn with_source_prefix(self, source: &str) -> Self {
        Self {
            stations: self
                .stations
                .into_iter()
                .map(|s| s.with_source_prefix(source))
                .collect(),
        }
    }

    pub fn sort_by_id(&mut self) {
        self.stations
            .sort_by(|a, b| a.station_id.cmp(&b.station_id));
    }

    /// Concatenate tables, rejecting duplicate identifiers
    pub fn concat(tables: Vec<StationTable>) -> Result<Self> {
        Self::new(tables.into_iter().flat_map(|t| t.stations).collect())
    }

    /// Concatenate tables, keeping the first record of every identifier
    pub fn concat_dedup(tables: Vec<StationTable>) -> Self {
        let mut seen = HashSet::new();
        let stations = tables
            .into_iter()
            .flat_map(|t| t.stations)
            .filter(|s| seen.insert(s.station_id.clone()))
            .collect();
        Self { stations }
    }

    pub fn validate_all(&self) -> Result<()> {
        for station in &self.stations {
            station.validate()?;
        }
        Ok(())
    }

    /// Whether `name` is a core attribute or an `extra` of at least one station
    pub fn has_field(&self, name: &str) -> bool {
        CORE_FIELDS.contains(&name) || self.stations.iter().any(|s| s.extra.contains_key(name))
    }

    /// Names of the `extra` attributes present on at least one station
    pub fn extra_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .stations
            .iter()
            .flat_map(|s| s.extra.keys().cloned())
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }
}

impl<'a> IntoIterator for &'a StationTable {
    type Item = &'a StationRecord;
    type IntoIter = std::slice::Iter<'a, StationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.stations.iter()
    }
}
