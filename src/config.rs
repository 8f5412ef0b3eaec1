use crate::error::{Result, SeastersError};
use crate::utils::constants::{
    CONFIG_BASENAME, ENV_PREFIX, KEY_DATA_ROOT, SOURCE_GHCND, SOURCE_GHCNH, SOURCE_GSDR,
};
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an extra configuration file
pub const CONFIG_FILE_ENV: &str = "SEASTERS_CONFIG";

/// Locations of the station, inventory and observation files under a data root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathConfig {
    root: PathBuf,
}

impl PathConfig {
    pub fn from_root(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(SeastersError::DataRootNotFound(root));
        }
        Ok(Self { root })
    }

    /// Resolve the data root from `seasters.*` in the working directory,
    /// the file named by `SEASTERS_CONFIG`, then `SEASTERS_*` variables
    pub fn discover() -> Result<Self> {
        let mut builder =
            Config::builder().add_source(File::with_name(CONFIG_BASENAME).required(false));

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            debug!("Reading configuration from {}", path);
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Self::from_settings(&settings)
    }

    /// Resolve the data root from already-built settings
    pub fn from_settings(settings: &Config) -> Result<Self> {
        match settings.get_string(KEY_DATA_ROOT) {
            Ok(root) => Self::from_root(root),
            Err(ConfigError::NotFound(_)) => Err(SeastersError::PathNotConfigured),
            Err(e) => Err(e.into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ghcnd(&self) -> PathBuf {
        self.root.join(SOURCE_GHCND)
    }

    pub fn ghcnd_stations(&self) -> PathBuf {
        self.ghcnd().join("metadata").join("ghcnd-stations.parquet")
    }

    pub fn ghcnd_inventory(&self) -> PathBuf {
        self.ghcnd().join("metadata").join("ghcnd-inventory.parquet")
    }

    pub fn ghcnd_file(&self, station_id: &str) -> PathBuf {
        self.ghcnd().join("data").join(format!("{}.parquet", station_id))
    }

    pub fn ghcnh(&self) -> PathBuf {
        self.root.join(SOURCE_GHCNH)
    }

    pub fn ghcnh_station_list(&self) -> PathBuf {
        self.ghcnh().join("metadata").join("ghcnh-station-list.parquet")
    }

    pub fn ghcnh_inventory(&self, var: &str) -> PathBuf {
        self.ghcnh()
            .join("metadata")
            .join(format!("ghcnh-inventory-{}.parquet", var))
    }

    /// Yearly file of one GHCNh variable
    pub fn ghcnh_file(&self, station_id: &str, year: i32, var: &str) -> PathBuf {
        self.ghcnh()
            .join("data")
            .join(var)
            .join(year.to_string())
            .join(format!("GHCNh_{}_{}-{}.parquet", station_id, year, var))
    }

    pub fn gsdr(&self) -> PathBuf {
        self.root.join(SOURCE_GSDR)
    }

    pub fn gsdr_stations(&self) -> PathBuf {
        self.gsdr().join("metadata").join("gsdr-stations.parquet")
    }

    pub fn gsdr_inventory(&self) -> PathBuf {
        self.gsdr().join("metadata").join("gsdr-inventory.parquet")
    }

    pub fn gsdr_file(&self, station_id: &str) -> PathBuf {
        self.gsdr().join("data").join(format!("{}.parquet", station_id))
    }
}
