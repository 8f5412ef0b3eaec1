use crate::error::{Result, SeastersError};
use crate::models::{TimeRange, VariableDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Table-level attributes describing the observed quantity
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableAttrs {
    pub name: String,
    pub long_name: String,
    pub units: Option<String>,
}

impl TableAttrs {
    pub fn new(name: impl Into<String>, long_name: impl Into<String>, units: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            long_name: long_name.into(),
            units: Some(units.into()),
        }
    }

    pub fn from_variable(variable: &VariableDescriptor) -> Self {
        Self::new(&variable.name, &variable.long_name, &variable.units)
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }
}

fn check_sorted_unique(index: &[DateTime<Utc>]) -> Result<()> {
    if let Some(pos) = index.windows(2).position(|w| w[0] >= w[1]) {
        return Err(SeastersError::InvalidFormat(format!(
            "Time index is not strictly increasing at {}",
            index[pos + 1]
        )));
    }
    Ok(())
}

fn slice_bounds(index: &[DateTime<Utc>], range: &TimeRange) -> (usize, usize) {
    let lo = index.partition_point(|t| *t < range.start());
    let hi = index.partition_point(|t| *t <= range.end());
    (lo, hi.max(lo))
}

/// Observations of a single station, without missing values
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub attrs: TableAttrs,
    index: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from unordered `(time, value)` pairs
    pub fn from_pairs(attrs: TableAttrs, mut pairs: Vec<(DateTime<Utc>, f64)>) -> Result<Self> {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let (index, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        check_sorted_unique(&index)?;
        Ok(Self {
            attrs,
            index,
            values,
        })
    }

    pub fn empty(attrs: TableAttrs) -> Self {
        Self {
            attrs,
            index: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateTime<Utc>, &f64)> {
        self.index.iter().zip(self.values.iter())
    }

    pub fn value_at(&self, t: &DateTime<Utc>) -> Option<f64> {
        self.index
            .binary_search(t)
            .ok()
            .map(|i| self.values[i])
    }

    /// Keep observations inside the inclusive range
    pub fn slice(&self, range: &TimeRange) -> Self {
        let (lo, hi) = slice_bounds(&self.index, range);
        Self {
            attrs: self.attrs.clone(),
            index: self.index[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }

    /// Concatenate consecutive chunks (e.g. yearly files) of the same station
    pub fn concat(attrs: TableAttrs, parts: Vec<TimeSeries>) -> Result<Self> {
        let pairs = parts
            .into_iter()
            .flat_map(|p| p.index.into_iter().zip(p.values))
            .collect();
        Self::from_pairs(attrs, pairs)
    }

    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            attrs: self.attrs.clone(),
            index: self.index.clone(),
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }
}

/// Time-indexed table with one column per station
///
/// Missing observations are `None`. The index is strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationTable {
    pub attrs: TableAttrs,
    index: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    data: Vec<Vec<Option<f64>>>,
}

impl ObservationTable {
    pub fn empty(attrs: TableAttrs) -> Self {
        Self {
            attrs,
            index: Vec::new(),
            columns: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Build a table from column-major data
    pub fn from_columns(
        attrs: TableAttrs,
        index: Vec<DateTime<Utc>>,
        columns: Vec<String>,
        data: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        check_sorted_unique(&index)?;

        if columns.len() != data.len() {
            return Err(SeastersError::InvalidFormat(format!(
                "{} column names for {} columns",
                columns.len(),
                data.len()
            )));
        }
        if let Some((name, col)) = columns
            .iter()
            .zip(&data)
            .find(|(_, col)| col.len() != index.len())
        {
            return Err(SeastersError::InvalidFormat(format!(
                "Column '{}' has {} rows, index has {}",
                name,
                col.len(),
                index.len()
            )));
        }

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(SeastersError::InvalidFormat(format!(
                "Duplicate column '{}'",
                dup
            )));
        }

        Ok(Self {
            attrs,
            index,
            columns,
            data,
        })
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.data[i].as_slice())
    }

    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns
            .iter()
            .map(|c| c.as_str())
            .zip(self.data.iter().map(|d| d.as_slice()))
    }

    pub fn value(&self, t: &DateTime<Utc>, column: &str) -> Option<f64> {
        let row = self.index.binary_search(t).ok()?;
        self.column(column).and_then(|col| col[row])
    }

    /// Number of non-missing cells
    pub fn count_valid(&self) -> usize {
        self.data
            .iter()
            .map(|col| col.iter().filter(|v| v.is_some()).count())
            .sum()
    }

    /// Reorder (and subset) columns; every requested name must exist
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut columns = Vec::with_capacity(names.len());
        let mut data = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let col = self.column(name).ok_or_else(|| {
                SeastersError::MissingData(format!("Column '{}' not found in table", name))
            })?;
            columns.push(name.to_string());
            data.push(col.to_vec());
        }
        Self::from_columns(self.attrs.clone(), self.index.clone(), columns, data)
    }

    /// Keep rows inside the inclusive range
    pub fn slice_time(&self, range: &TimeRange) -> Self {
        let (lo, hi) = slice_bounds(&self.index, range);
        Self {
            attrs: self.attrs.clone(),
            index: self.index[lo..hi].to_vec(),
            columns: self.columns.clone(),
            data: self.data.iter().map(|c| c[lo..hi].to_vec()).collect(),
        }
    }

    pub fn rename_columns<F: Fn(&str) -> String>(mut self, f: F) -> Self {
        self.columns = self.columns.iter().map(|c| f(c.as_str())).collect();
        self
    }

    /// Apply `f` to every present value, leaving missing cells untouched
    pub fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self {
        Self {
            attrs: self.attrs.clone(),
            index: self.index.clone(),
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|col| col.iter().map(|v| v.map(&f)).collect())
                .collect(),
        }
    }

    pub fn with_attrs(mut self, attrs: TableAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn into_parts(self) -> (TableAttrs, Vec<DateTime<Utc>>, Vec<String>, Vec<Vec<Option<f64>>>) {
        (self.attrs, self.index, self.columns, self.data)
    }
}
