use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "seasters")]
#[command(about = "Search and load rain gauge station data stored as Parquet files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Data root directory [default: SEASTERS_DATA_ROOT or a seasters config file]
    #[arg(long, global = true, env = "SEASTERS_DATA_ROOT")]
    pub data_root: Option<PathBuf>,
}

/// Station selection shared by `search` and `load`
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Metadata filter, e.g. "lat > 40 & elevation < 500"
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Start of the time range (RFC 3339, "YYYY-MM-DD" or "YYYY-MM-DD HH:MM")
    #[arg(long, requires = "end")]
    pub start: Option<String>,

    /// End of the time range, inclusive
    #[arg(long, requires = "start")]
    pub end: Option<String>,

    /// Sources to include [default: all]
    #[arg(short, long, value_delimiter = ',')]
    pub sources: Vec<String>,

    /// Load every accumulation period instead of the default variables
    #[arg(long, default_value = "false")]
    pub all_periods: bool,

    #[arg(long, default_value_t = num_cpus::get())]
    pub max_workers: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Parquet,
    Csv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariableSource {
    Ghcnd,
    Ghcnh,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search stations matching the criteria without loading their data
    Search {
        #[command(flatten)]
        query: QueryArgs,

        /// Memory estimate: none, attrs or noattrs
        #[arg(short, long, default_value = "none")]
        memory_est: String,

        /// Write the matching stations to this Parquet file
        #[arg(short, long)]
        output_file: Option<PathBuf>,

        /// Print stations as JSON lines
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Load gauge data and write it with its station metadata
    Load {
        #[command(flatten)]
        query: QueryArgs,

        /// Output unit of the gauge data
        #[arg(short, long, default_value = "mm")]
        units: String,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        #[arg(long, value_enum, default_value = "parquet")]
        format: OutputFormat,

        #[arg(short, long, default_value = "snappy")]
        compression: String,
    },

    /// List the variables of a source
    Variables {
        #[arg(value_enum)]
        source: VariableSource,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Display information about a Parquet file
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}
