use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SeastersError>;

#[derive(Error, Debug)]
pub enum SeastersError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("'{source_name}' is not a valid source. Please provide one of {valid:?}")]
    InvalidSource {
        source_name: String,
        valid: Vec<String>,
    },

    #[error("Provided variable ('{var}') is not valid. Accepted values are in {valid:?}")]
    InvalidVariable { var: String, valid: Vec<String> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Error applying filter `{condition}`: {message}")]
    Filter { condition: String, message: String },

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("No 'units' attribute found in the data")]
    MissingUnits,

    #[error("Unknown unit: '{0}'")]
    UnknownUnit(String),

    #[error("Cannot convert from '{from}' to '{to}': incompatible dimensions")]
    IncompatibleUnits { from: String, to: String },

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("No data root configured. Set SEASTERS_DATA_ROOT or pass a data root explicitly")]
    PathNotConfigured,

    #[error("Data root directory '{}' does not exist", .0.display())]
    DataRootNotFound(PathBuf),
}
