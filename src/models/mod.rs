pub mod observation;
pub mod station;
pub mod time_range;
pub mod variable;

pub use observation::{ObservationTable, TableAttrs, TimeSeries};
pub use station::{FieldValue, StationRecord, StationTable};
pub use time_range::{TimeBound, TimeRange};
pub use variable::{ghcnd_variables, ghcnh_variables, VariableDescriptor, VariableRegistry};
