pub mod time_aligner;
pub mod unit_converter;

pub use time_aligner::TimeAligner;
pub use unit_converter::{check_units, UnitAware};
