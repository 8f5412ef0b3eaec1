pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod processors;
pub mod query;
pub mod readers;
pub mod sources;
pub mod utils;
pub mod writers;

pub use error::{Result, SeastersError};
pub use sources::{GaugeData, GaugeLoader, GaugeQuery, Source};
