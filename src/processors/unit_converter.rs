use crate::error::{Result, SeastersError};
use crate::models::{ObservationTable, TableAttrs, TimeSeries};
use crate::utils::units::{standard_unit, Conversion, Unit};
use tracing::info;

/// Data carrying a `units` attribute that can be rescaled in place
pub trait UnitAware: Sized {
    fn attrs(&self) -> &TableAttrs;

    /// Apply `conversion` to every value and record `units`
    fn convert(self, conversion: &Conversion, units: &str) -> Self;
}

impl UnitAware for ObservationTable {
    fn attrs(&self) -> &TableAttrs {
        &self.attrs
    }

    fn convert(self, conversion: &Conversion, units: &str) -> Self {
        let attrs = self.attrs.clone().with_units(units);
        self.map_values(|v| conversion.apply(v)).with_attrs(attrs)
    }
}

impl UnitAware for TimeSeries {
    fn attrs(&self) -> &TableAttrs {
        &self.attrs
    }

    fn convert(self, conversion: &Conversion, units: &str) -> Self {
        let mut converted = self.map_values(|v| conversion.apply(v));
        converted.attrs = self.attrs.with_units(units);
        converted
    }
}

/// Make sure `data` is expressed in `target` units, converting it if needed
///
/// Units are compared after standardization, so `mm` and `millimeter` need no
/// conversion. Row and column counts are preserved.
pub fn check_units<T: UnitAware>(data: T, target: &str) -> Result<T> {
    let current = data
        .attrs()
        .units
        .clone()
        .ok_or(SeastersError::MissingUnits)?;

    if standard_unit(&current)? == standard_unit(target)? {
        info!("Data already in '{}', no conversion needed", target);
        return Ok(data);
    }

    let conversion = Unit::parse(&current)?.conversion_to(&Unit::parse(target)?)?;
    info!("Converting data from '{}' to '{}'", current, target);
    Ok(data.convert(&conversion, target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, d, 0, 0, 0).unwrap()
    }

    fn table(units: Option<&str>) -> ObservationTable {
        let attrs = TableAttrs {
            name: "Precipitation".to_string(),
            long_name: "Daily total liquid precipitation".to_string(),
            units: units.map(str::to_string),
        };
        ObservationTable::from_columns(
            attrs,
            vec![day(1), day(2)],
            vec!["A".to_string(), "B".to_string()],
            vec![vec![Some(25.4), None], vec![Some(0.0), Some(50.8)]],
        )
        .unwrap()
    }

    #[test]
    fn test_same_unit_is_noop() {
        let converted = check_units(table(Some("mm")), "millimeter").unwrap();
        assert_eq!(converted, table(Some("mm")));
    }

    #[test]
    fn test_conversion_preserves_shape_and_missing() {
        let converted = check_units(table(Some("mm")), "inch").unwrap();
        assert_eq!(converted.shape(), (2, 2));
        assert_eq!(converted.attrs.units.as_deref(), Some("inch"));

        let a = converted.column("A").unwrap();
        assert!((a[0].unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(a[1], None);
        let b = converted.column("B").unwrap();
        assert!((b[1].unwrap() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_units() {
        assert!(matches!(
            check_units(table(None), "mm"),
            Err(SeastersError::MissingUnits)
        ));
    }

    #[test]
    fn test_incompatible_units() {
        assert!(matches!(
            check_units(table(Some("mm")), "kg"),
            Err(SeastersError::IncompatibleUnits { .. })
        ));
        assert!(matches!(
            check_units(table(Some("mm")), "furlong"),
            Err(SeastersError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_series_conversion() {
        let series = TimeSeries::from_pairs(
            TableAttrs::new("Precipitation", "Hourly total liquid precipitation", "mm"),
            vec![(day(1), 10.0)],
        )
        .unwrap();
        let converted = check_units(series, "cm").unwrap();
        assert!((converted.values()[0] - 1.0).abs() < 1e-12);
        assert_eq!(converted.attrs.units.as_deref(), Some("cm"));
    }
}
