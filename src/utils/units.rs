//! Physical units parsed from attribute strings such as `"mm"`, `"mm/day"`,
//! `"m s^-1"` or `"degC"`.
//!
//! Every unit reduces to a scale and offset against SI plus a dimension
//! vector (length, mass, time, temperature). Two unit strings are equivalent
//! when their [`standard_unit`] forms match, so `"mm"` and `"millimeter"` need
//! no conversion.

use crate::error::{Result, SeastersError};
use std::fmt;

const LENGTH: usize = 0;
const MASS: usize = 1;
const TIME: usize = 2;
const TEMPERATURE: usize = 3;

type Dimensions = [i32; 4];

struct BaseUnit {
    canonical: &'static str,
    aliases: &'static [&'static str],
    scale: f64,
    offset: f64,
    dims: Dimensions,
}

const fn dims(axis: usize, power: i32) -> Dimensions {
    let mut d = [0; 4];
    d[axis] = power;
    d
}

const PRESSURE: Dimensions = [-1, 1, -2, 0];
const SPEED: Dimensions = [1, 0, -1, 0];
const DIMENSIONLESS: Dimensions = [0; 4];

const BASE_UNITS: &[BaseUnit] = &[
    BaseUnit {
        canonical: "meter",
        aliases: &["m", "meter", "metre", "meters", "metres"],
        scale: 1.0,
        offset: 0.0,
        dims: dims(LENGTH, 1),
    },
    BaseUnit {
        canonical: "millimeter",
        aliases: &["mm", "millimeter", "millimetre", "millimeters", "millimetres"],
        scale: 1e-3,
        offset: 0.0,
        dims: dims(LENGTH, 1),
    },
    BaseUnit {
        canonical: "centimeter",
        aliases: &["cm", "centimeter", "centimetre", "centimeters", "centimetres"],
        scale: 1e-2,
        offset: 0.0,
        dims: dims(LENGTH, 1),
    },
    BaseUnit {
        canonical: "kilometer",
        aliases: &["km", "kilometer", "kilometre", "kilometers", "kilometres"],
        scale: 1e3,
        offset: 0.0,
        dims: dims(LENGTH, 1),
    },
    BaseUnit {
        canonical: "inch",
        aliases: &["in", "inch", "inches"],
        scale: 0.0254,
        offset: 0.0,
        dims: dims(LENGTH, 1),
    },
    BaseUnit {
        canonical: "foot",
        aliases: &["ft", "foot", "feet"],
        scale: 0.3048,
        offset: 0.0,
        dims: dims(LENGTH, 1),
    },
    BaseUnit {
        canonical: "mile",
        aliases: &["mi", "mile", "miles"],
        scale: 1609.344,
        offset: 0.0,
        dims: dims(LENGTH, 1),
    },
    BaseUnit {
        canonical: "gram",
        aliases: &["g", "gram", "grams"],
        scale: 1e-3,
        offset: 0.0,
        dims: dims(MASS, 1),
    },
    BaseUnit {
        canonical: "kilogram",
        aliases: &["kg", "kilogram", "kilograms"],
        scale: 1.0,
        offset: 0.0,
        dims: dims(MASS, 1),
    },
    BaseUnit {
        canonical: "second",
        aliases: &["s", "sec", "second", "seconds"],
        scale: 1.0,
        offset: 0.0,
        dims: dims(TIME, 1),
    },
    BaseUnit {
        canonical: "minute",
        aliases: &["min", "minute", "minutes"],
        scale: 60.0,
        offset: 0.0,
        dims: dims(TIME, 1),
    },
    BaseUnit {
        canonical: "hour",
        aliases: &["h", "hr", "hour", "hours"],
        scale: 3_600.0,
        offset: 0.0,
        dims: dims(TIME, 1),
    },
    BaseUnit {
        canonical: "day",
        aliases: &["d", "day", "days"],
        scale: 86_400.0,
        offset: 0.0,
        dims: dims(TIME, 1),
    },
    BaseUnit {
        canonical: "week",
        aliases: &["week", "weeks"],
        scale: 604_800.0,
        offset: 0.0,
        dims: dims(TIME, 1),
    },
    BaseUnit {
        canonical: "year",
        aliases: &["a", "yr", "year", "years"],
        scale: 31_557_600.0,
        offset: 0.0,
        dims: dims(TIME, 1),
    },
    BaseUnit {
        canonical: "kelvin",
        aliases: &["K", "kelvin"],
        scale: 1.0,
        offset: 0.0,
        dims: dims(TEMPERATURE, 1),
    },
    BaseUnit {
        canonical: "degree_Celsius",
        aliases: &["degC", "celsius", "Celsius", "degree_Celsius", "°C"],
        scale: 1.0,
        offset: 273.15,
        dims: dims(TEMPERATURE, 1),
    },
    BaseUnit {
        canonical: "degree_Fahrenheit",
        aliases: &["degF", "fahrenheit", "Fahrenheit", "degree_Fahrenheit", "°F"],
        scale: 5.0 / 9.0,
        offset: 459.67 * 5.0 / 9.0,
        dims: dims(TEMPERATURE, 1),
    },
    BaseUnit {
        canonical: "pascal",
        aliases: &["Pa", "pascal"],
        scale: 1.0,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "hectopascal",
        aliases: &["hPa", "hectopascal"],
        scale: 100.0,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "kilopascal",
        aliases: &["kPa", "kilopascal"],
        scale: 1_000.0,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "millibar",
        aliases: &["mbar", "millibar", "mb"],
        scale: 100.0,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "bar",
        aliases: &["bar"],
        scale: 100_000.0,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "standard_atmosphere",
        aliases: &["atm", "atmosphere"],
        scale: 101_325.0,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "inch_Hg",
        aliases: &["inHg", "inch_Hg"],
        scale: 3_386.389,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "millimeter_Hg",
        aliases: &["mmHg", "millimeter_Hg"],
        scale: 133.322_387_415,
        offset: 0.0,
        dims: PRESSURE,
    },
    BaseUnit {
        canonical: "knot",
        aliases: &["kn", "kt", "knot", "knots"],
        scale: 1_852.0 / 3_600.0,
        offset: 0.0,
        dims: SPEED,
    },
    BaseUnit {
        canonical: "mile_per_hour",
        aliases: &["mph", "mile_per_hour"],
        scale: 0.44704,
        offset: 0.0,
        dims: SPEED,
    },
    BaseUnit {
        canonical: "percent",
        aliases: &["%", "percent"],
        scale: 0.01,
        offset: 0.0,
        dims: DIMENSIONLESS,
    },
    BaseUnit {
        canonical: "dimensionless",
        aliases: &["1", "dimensionless", "fraction"],
        scale: 1.0,
        offset: 0.0,
        dims: DIMENSIONLESS,
    },
];

fn lookup(name: &str) -> Option<&'static BaseUnit> {
    BASE_UNITS
        .iter()
        .find(|unit| unit.aliases.contains(&name))
}

/// A parsed unit expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    factors: Vec<(&'static str, i32)>,
    scale: f64,
    offset: f64,
    dims: Dimensions,
}

/// Affine map `target = value * scale + offset` between two units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    pub scale: f64,
    pub offset: f64,
}

impl Conversion {
    pub fn apply(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.offset == 0.0
    }
}

impl Unit {
    pub fn parse(expr: &str) -> Result<Self> {
        let normalized = expr.trim().replace("**", "^");
        if normalized.is_empty() {
            return Err(SeastersError::UnknownUnit(expr.to_string()));
        }

        let mut factors: Vec<(&'static BaseUnit, i32)> = Vec::new();
        let mut divide_next = false;
        let mut word = String::new();

        let mut flush = |word: &mut String, divide: bool| -> Result<()> {
            if word.is_empty() {
                return Ok(());
            }
            let (name, power) = split_power(word, expr)?;
            let base = lookup(name).ok_or_else(|| SeastersError::UnknownUnit(expr.to_string()))?;
            let power = if divide { -power } else { power };
            match factors.iter_mut().find(|(b, _)| b.canonical == base.canonical) {
                Some((_, p)) => *p += power,
                None => factors.push((base, power)),
            }
            word.clear();
            Ok(())
        };

        for c in normalized.chars() {
            match c {
                '*' => {
                    flush(&mut word, divide_next)?;
                    divide_next = false;
                }
                '/' => {
                    flush(&mut word, divide_next)?;
                    divide_next = true;
                }
                c if c.is_whitespace() => {
                    if !word.is_empty() {
                        flush(&mut word, divide_next)?;
                        divide_next = false;
                    }
                }
                c => word.push(c),
            }
        }
        flush(&mut word, divide_next)?;

        factors.retain(|(_, p)| *p != 0);

        let has_offset = factors.iter().any(|(b, _)| b.offset != 0.0);
        if has_offset && (factors.len() > 1 || factors[0].1 != 1) {
            return Err(SeastersError::InvalidArgument(format!(
                "offset unit in '{}' cannot be combined with other units",
                expr
            )));
        }

        let mut scale = 1.0;
        let mut offset = 0.0;
        let mut dims = DIMENSIONLESS;
        for (base, power) in &factors {
            scale *= base.scale.powi(*power);
            offset += base.offset;
            for (axis, d) in dims.iter_mut().enumerate() {
                *d += base.dims[axis] * power;
            }
        }

        Ok(Self {
            factors: factors.iter().map(|(b, p)| (b.canonical, *p)).collect(),
            scale,
            offset,
            dims,
        })
    }

    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dims == other.dims
    }

    /// Conversion from `self` to `target`
    pub fn conversion_to(&self, target: &Unit) -> Result<Conversion> {
        if !self.is_compatible(target) {
            return Err(SeastersError::IncompatibleUnits {
                from: self.to_string(),
                to: target.to_string(),
            });
        }

        Ok(Conversion {
            scale: self.scale / target.scale,
            offset: (self.offset - target.offset) / target.scale,
        })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |name: &str, power: i32| {
            if power == 1 {
                name.to_string()
            } else {
                format!("{} ** {}", name, power)
            }
        };

        let numerator: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, p)| *p > 0)
            .map(|(n, p)| render(n, *p))
            .collect();
        let denominator: Vec<String> = self
            .factors
            .iter()
            .filter(|(_, p)| *p < 0)
            .map(|(n, p)| render(n, -p))
            .collect();

        match (numerator.is_empty(), denominator.is_empty()) {
            (true, true) => write!(f, "dimensionless"),
            (false, true) => write!(f, "{}", numerator.join(" * ")),
            (true, false) => write!(f, "1 / {}", denominator.join(" / ")),
            (false, false) => write!(f, "{} / {}", numerator.join(" * "), denominator.join(" / ")),
        }
    }
}

fn split_power<'a>(word: &'a str, expr: &str) -> Result<(&'a str, i32)> {
    match word.split_once('^') {
        Some((name, power)) => {
            let power = power
                .parse::<i32>()
                .map_err(|_| SeastersError::UnknownUnit(expr.to_string()))?;
            Ok((name, power))
        }
        None => Ok((word, 1)),
    }
}

/// Return the canonical long form of `unit`, e.g. `"mm/d"` -> `"millimeter / day"`
pub fn standard_unit(unit: &str) -> Result<String> {
    Ok(Unit::parse(unit)?.to_string())
}

/// Build the conversion between two unit strings
pub fn conversion(from: &str, to: &str) -> Result<Conversion> {
    Unit::parse(from)?.conversion_to(&Unit::parse(to)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_standard_unit_aliases() {
        assert_eq!(standard_unit("mm").unwrap(), "millimeter");
        assert_eq!(standard_unit("millimetre").unwrap(), "millimeter");
        assert_eq!(standard_unit("mm/day").unwrap(), "millimeter / day");
        assert_eq!(standard_unit("mm / d").unwrap(), "millimeter / day");
        assert_eq!(standard_unit("m s^-1").unwrap(), "meter / second");
        assert_eq!(standard_unit("kg*m**-2").unwrap(), "kilogram / meter ** 2");
    }

    #[test]
    fn test_length_conversion() {
        let c = conversion("mm", "inch").unwrap();
        assert_close(c.apply(25.4), 1.0);

        let c = conversion("cm", "mm").unwrap();
        assert_close(c.apply(1.5), 15.0);
    }

    #[test]
    fn test_rate_conversion() {
        let c = conversion("mm/day", "mm/h").unwrap();
        assert_close(c.apply(24.0), 1.0);
    }

    #[test]
    fn test_temperature_conversion() {
        let c = conversion("degC", "K").unwrap();
        assert_close(c.apply(0.0), 273.15);

        let c = conversion("degC", "degF").unwrap();
        assert_close(c.apply(100.0), 212.0);
        assert_close(c.apply(-40.0), -40.0);
    }

    #[test]
    fn test_pressure_conversion() {
        let c = conversion("hPa", "Pa").unwrap();
        assert_close(c.apply(1013.25), 101_325.0);

        let c = conversion("mbar", "hPa").unwrap();
        assert!(c.is_identity());
    }

    #[test]
    fn test_incompatible_units() {
        let err = conversion("mm", "mm/day").unwrap_err();
        assert!(matches!(err, SeastersError::IncompatibleUnits { .. }));
    }

    #[test]
    fn test_unknown_unit() {
        assert!(matches!(
            Unit::parse("furlong"),
            Err(SeastersError::UnknownUnit(_))
        ));
        assert!(Unit::parse("").is_err());
        assert!(Unit::parse("m^x").is_err());
    }

    #[test]
    fn test_offset_units_rejected_in_compounds() {
        assert!(Unit::parse("degC/day").is_err());
        assert!(Unit::parse("K/day").is_ok());
    }
}
