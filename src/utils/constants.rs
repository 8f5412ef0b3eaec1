/// Source keywords
pub const SOURCE_GHCND: &str = "GHCNd";
pub const SOURCE_GHCNH: &str = "GHCNh";
pub const SOURCE_GSDR: &str = "GSDR";

/// Default variables
pub const GHCND_PRECIPITATION: &str = "PRCP";
pub const GHCNH_PRECIPITATION: &str = "precipitation";
pub const GSDR_PRECIPITATION_COLUMN: &str = "Precipitation";

/// Default output unit for rain gauge data
pub const DEFAULT_GAUGE_UNITS: &str = "mm";

/// Column names shared by every station table
pub const COL_STATION_ID: &str = "station_id";
pub const COL_LAT: &str = "lat";
pub const COL_LON: &str = "lon";
pub const COL_ELEVATION: &str = "elevation";
pub const COL_STATION_NAME: &str = "station_name";

/// Column names of inventory and series files
pub const COL_TIME: &str = "time";
pub const COL_VAR: &str = "var";
pub const COL_START: &str = "start";
pub const COL_END: &str = "end";
pub const COL_YEAR: &str = "year";
pub const COL_COUNT: &str = "count";

/// Table attribute keys stored in Parquet schema metadata
pub const ATTR_NAME: &str = "name";
pub const ATTR_LONG_NAME: &str = "long_name";
pub const ATTR_UNITS: &str = "units";

/// Configuration
pub const ENV_PREFIX: &str = "SEASTERS";
pub const CONFIG_BASENAME: &str = "seasters";
pub const KEY_DATA_ROOT: &str = "data_root";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_READ_BATCH_SIZE: usize = 8192;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
