use crate::error::{Result, SeastersError};
use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use std::str::FromStr;
use tracing::info;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// One end of a requested time range, with or without a UTC offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    Naive(NaiveDateTime),
    Aware(DateTime<FixedOffset>),
}

impl TimeBound {
    fn offset(&self) -> Option<FixedOffset> {
        match self {
            TimeBound::Naive(_) => None,
            TimeBound::Aware(dt) => Some(*dt.offset()),
        }
    }

    fn localize(self, offset: FixedOffset) -> Result<DateTime<Utc>> {
        match self {
            TimeBound::Aware(dt) => Ok(dt.with_timezone(&Utc)),
            TimeBound::Naive(naive) => offset
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| {
                    SeastersError::InvalidTimeRange(format!(
                        "cannot localize {} with offset {}",
                        naive, offset
                    ))
                }),
        }
    }
}

impl FromStr for TimeBound {
    type Err = SeastersError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(TimeBound::Aware(dt));
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(TimeBound::Naive(naive));
            }
        }
        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")?;
        Ok(TimeBound::Naive(date.and_time(NaiveTime::MIN)))
    }
}

impl From<NaiveDateTime> for TimeBound {
    fn from(value: NaiveDateTime) -> Self {
        TimeBound::Naive(value)
    }
}

impl From<NaiveDate> for TimeBound {
    fn from(value: NaiveDate) -> Self {
        TimeBound::Naive(value.and_time(NaiveTime::MIN))
    }
}

impl From<DateTime<FixedOffset>> for TimeBound {
    fn from(value: DateTime<FixedOffset>) -> Self {
        TimeBound::Aware(value)
    }
}

impl From<DateTime<Utc>> for TimeBound {
    fn from(value: DateTime<Utc>) -> Self {
        TimeBound::Aware(value.fixed_offset())
    }
}

/// Inclusive time window expressed in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(SeastersError::InvalidTimeRange(format!(
                "start ({}) is after end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range from bounds that may lack a time zone.
    ///
    /// Two naive bounds are taken as UTC. A single naive bound borrows the
    /// offset of the other one.
    pub fn localize(start: impl Into<TimeBound>, end: impl Into<TimeBound>) -> Result<Self> {
        let start = start.into();
        let end = end.into();

        let utc = FixedOffset::east_opt(0).ok_or_else(|| {
            SeastersError::InvalidTimeRange("invalid UTC offset".to_string())
        })?;

        let (start_offset, end_offset) = match (start.offset(), end.offset()) {
            (None, None) => {
                info!("Time range datetimes assumed to be in UTC");
                (utc, utc)
            }
            (None, Some(offset)) => {
                info!("Time range start datetime is assumed to be in the same time zone as end datetime");
                (offset, offset)
            }
            (Some(offset), None) => {
                info!("Time range end datetime is assumed to be in the same time zone as start datetime");
                (offset, offset)
            }
            (Some(a), Some(b)) => (a, b),
        };

        Self::new(start.localize(start_offset)?, end.localize(end_offset)?)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn start_year(&self) -> i32 {
        self.start.year()
    }

    pub fn end_year(&self) -> i32 {
        self.end.year()
    }

    pub fn years(&self) -> std::ops::RangeInclusive<i32> {
        self.start_year()..=self.end_year()
    }

    pub fn contains(&self, t: &DateTime<Utc>) -> bool {
        *t >= self.start && *t <= self.end
    }

    /// Whether a coverage expressed as a span of years intersects the range
    pub fn overlaps_years(&self, first: i32, last: i32) -> bool {
        first <= self.end_year() && last >= self.start_year()
    }

    /// Whether a coverage expressed as a span of instants intersects the range
    pub fn overlaps(&self, first: &DateTime<Utc>, last: &DateTime<Utc>) -> bool {
        *first <= self.end && *last >= self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(s: &str) -> TimeBound {
        s.parse().unwrap()
    }

    #[test]
    fn test_naive_bounds_are_utc() {
        let range = TimeRange::localize(naive("2020-01-01"), naive("2020-12-31T23:00")).unwrap();
        assert_eq!(range.start().to_rfc3339(), "2020-01-01T00:00:00+00:00");
        assert_eq!(range.end().to_rfc3339(), "2020-12-31T23:00:00+00:00");
    }

    #[test]
    fn test_naive_start_borrows_end_offset() {
        let end: TimeBound = "2020-01-02T00:00:00+02:00".parse().unwrap();
        let range = TimeRange::localize(naive("2020-01-01T00:00:00"), end).unwrap();
        assert_eq!(range.start().to_rfc3339(), "2019-12-31T22:00:00+00:00");
        assert_eq!(range.end().to_rfc3339(), "2020-01-01T22:00:00+00:00");
    }

    #[test]
    fn test_naive_end_borrows_start_offset() {
        let start: TimeBound = "2020-01-01T00:00:00-05:00".parse().unwrap();
        let range = TimeRange::localize(start, naive("2020-01-01T12:00:00")).unwrap();
        assert_eq!(range.end().to_rfc3339(), "2020-01-01T17:00:00+00:00");
    }

    #[test]
    fn test_reversed_range_rejected() {
        let result = TimeRange::localize(naive("2021-01-01"), naive("2020-01-01"));
        assert!(matches!(result, Err(SeastersError::InvalidTimeRange(_))));
    }

    #[test]
    fn test_year_overlap() {
        let range = TimeRange::localize(naive("2000-06-01"), naive("2002-06-01")).unwrap();
        assert!(range.overlaps_years(1990, 2000));
        assert!(range.overlaps_years(2001, 2001));
        assert!(range.overlaps_years(1950, 2020));
        assert!(!range.overlaps_years(2003, 2010));
        assert!(!range.overlaps_years(1900, 1999));
    }

    #[test]
    fn test_inclusive_contains() {
        let range = TimeRange::localize(naive("2000-01-01"), naive("2000-01-02")).unwrap();
        assert!(range.contains(&range.start()));
        assert!(range.contains(&range.end()));
    }

    #[test]
    fn test_invalid_bound() {
        assert!("yesterday".parse::<TimeBound>().is_err());
    }
}
