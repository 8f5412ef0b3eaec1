pub mod constants;
pub mod memory;
pub mod progress;
pub mod units;

pub use constants::*;
pub use memory::{estimate_file, estimate_files, format_memory, MemoryEstimate};
pub use progress::ProgressReporter;
pub use units::{conversion, standard_unit, Conversion, Unit};
