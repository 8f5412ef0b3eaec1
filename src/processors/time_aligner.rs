use crate::error::Result;
use crate::models::{ObservationTable, TableAttrs, TimeSeries};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

/// Outer-joins station series on time into one wide table
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeAligner;

impl TimeAligner {
    pub fn new() -> Self {
        Self
    }

    /// Align `(column, series)` pairs on the union of their time indexes
    ///
    /// Columns keep the order of `series`; cells without an observation are `None`.
    pub fn align(
        &self,
        attrs: TableAttrs,
        series: Vec<(String, TimeSeries)>,
    ) -> Result<ObservationTable> {
        let index = union_index(series.iter().map(|(_, s)| s.index()));

        let mut columns = Vec::with_capacity(series.len());
        let mut data = Vec::with_capacity(series.len());
        for (name, s) in series {
            data.push(spread(&index, s.index(), s.values().iter().map(|v| Some(*v))));
            columns.push(name);
        }

        ObservationTable::from_columns(attrs, index, columns, data)
    }

    /// Concatenate tables column-wise on the union of their time indexes
    pub fn concat(&self, attrs: TableAttrs, tables: Vec<ObservationTable>) -> Result<ObservationTable> {
        let index = union_index(tables.iter().map(|t| t.index()));

        let mut columns = Vec::new();
        let mut data = Vec::new();
        for table in tables {
            let (_, table_index, table_columns, table_data) = table.into_parts();
            for (name, values) in table_columns.into_iter().zip(table_data) {
                data.push(spread(&index, &table_index, values.into_iter()));
                columns.push(name);
            }
        }

        ObservationTable::from_columns(attrs, index, columns, data)
    }
}

fn union_index<'a, I>(indexes: I) -> Vec<DateTime<Utc>>
where
    I: Iterator<Item = &'a [DateTime<Utc>]>,
{
    let mut union = BTreeSet::new();
    for index in indexes {
        union.extend(index.iter().copied());
    }
    union.into_iter().collect()
}

/// Place sorted `(own_index, values)` onto the sorted superset `index`
fn spread<I>(index: &[DateTime<Utc>], own_index: &[DateTime<Utc>], values: I) -> Vec<Option<f64>>
where
    I: Iterator<Item = Option<f64>>,
{
    let mut out = vec![None; index.len()];
    let mut row = 0;
    for (t, v) in own_index.iter().zip(values) {
        while index[row] < *t {
            row += 1;
        }
        out[row] = v;
    }
    out
}
