use crate::cli::args::{Cli, Commands, OutputFormat, QueryArgs, VariableSource};
use crate::config::PathConfig;
use crate::error::Result;
use crate::logging;
use crate::models::{ghcnd_variables, ghcnh_variables, ObservationTable, StationTable, TimeBound};
use crate::sources::{GaugeLoader, GaugeQuery};
use crate::utils::memory::{format_memory, MemoryEstimate};
use crate::writers::{get_file_info, CsvWriter, ParquetWriter};
use std::path::{Path, PathBuf};

const STATIONS_FILE: &str = "stations.parquet";
const GAUGE_DATA_STEM: &str = "gauge_data";

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.verbose);

    match cli.command {
        Commands::Search {
            query,
            memory_est,
            output_file,
            json,
        } => {
            let memory: MemoryEstimate = memory_est.parse()?;
            let loader = gauge_loader(cli.data_root, &query)?;
            let gauge_query = build_query(&query)?;

            let found = if query.all_periods {
                loader.search_all(&gauge_query, memory)?
            } else {
                loader.search(&gauge_query, memory)?
            };

            if json {
                for station in &found.metadata {
                    let line = serde_json::to_string(station)?;
                    println!("{}", line);
                }
            } else {
                print_stations(&found.metadata);
                println!("\n{} stations found", found.metadata.len());
            }
            if let Some(bytes) = found.memory_est {
                println!("Memory estimate once loaded: {}", format_memory(bytes));
            }

            if let Some(path) = output_file {
                create_parent(&path)?;
                ParquetWriter::new().write_stations(&found.metadata, &path)?;
                println!("Stations written to {}", path.display());
            }
        }

        Commands::Load {
            query,
            units,
            output_dir,
            format,
            compression,
        } => {
            let loader = gauge_loader(cli.data_root, &query)?.with_progress(true);
            let gauge_query = build_query(&query)?.with_units(units);
            let writer = ParquetWriter::new().with_compression(&compression)?;
            std::fs::create_dir_all(&output_dir)?;

            let metadata = if query.all_periods {
                let loaded = loader.load_all(&gauge_query)?;
                for (period, table) in &loaded.data {
                    let path = write_table(table, &output_dir, &period.name(), format, &writer)?;
                    println!(
                        "{}: {} stations, {} time steps -> {}",
                        period,
                        table.n_columns(),
                        table.n_rows(),
                        path.display()
                    );
                }
                loaded.metadata
            } else {
                let loaded = loader.load(&gauge_query)?;
                let path = write_table(&loaded.data, &output_dir, GAUGE_DATA_STEM, format, &writer)?;
                println!(
                    "{} stations, {} time steps ({} valid values) -> {}",
                    loaded.data.n_columns(),
                    loaded.data.n_rows(),
                    loaded.data.count_valid(),
                    path.display()
                );
                loaded.metadata
            };

            let stations_path = output_dir.join(STATIONS_FILE);
            writer.write_stations(&metadata, &stations_path)?;
            println!("Stations written to {}", stations_path.display());
        }

        Commands::Variables { source, json } => {
            let registry = match source {
                VariableSource::Ghcnd => ghcnd_variables()?,
                VariableSource::Ghcnh => ghcnh_variables()?,
            };
            for variable in registry.iter() {
                if json {
                    let line = serde_json::to_string(variable)?;
                    println!("{}", line);
                } else {
                    println!(
                        "{:<24} {:<14} {}",
                        variable.code, variable.units, variable.long_name
                    );
                }
            }
        }

        Commands::Info { file } => {
            println!("Analyzing Parquet file: {}", file.display());
            let file_info = get_file_info(&file)?;
            println!("{}", file_info.summary());
            println!("\nColumns:");
            for column in &file_info.columns {
                println!("  {}", column);
            }
        }
    }

    Ok(())
}

fn gauge_loader(data_root: Option<PathBuf>, query: &QueryArgs) -> Result<GaugeLoader> {
    let paths = match data_root {
        Some(root) => PathConfig::from_root(root)?,
        None => PathConfig::discover()?,
    };
    Ok(GaugeLoader::new(paths).with_max_workers(query.max_workers))
}

fn build_query(args: &QueryArgs) -> Result<GaugeQuery> {
    let mut query = GaugeQuery::new();
    if let Some(filter) = &args.filter {
        query = query.with_filter(filter)?;
    }
    if let (Some(start), Some(end)) = (&args.start, &args.end) {
        query = query.with_bounds(start.parse::<TimeBound>()?, end.parse::<TimeBound>()?)?;
    }
    if !args.sources.is_empty() {
        query = query.with_sources(&args.sources[..])?;
    }
    Ok(query)
}

fn write_table(
    table: &ObservationTable,
    dir: &Path,
    stem: &str,
    format: OutputFormat,
    writer: &ParquetWriter,
) -> Result<PathBuf> {
    let path = match format {
        OutputFormat::Parquet => {
            let path = dir.join(format!("{}.parquet", stem));
            writer.write_observations(table, &path)?;
            path
        }
        OutputFormat::Csv => {
            let path = dir.join(format!("{}.csv", stem));
            CsvWriter::new().write_observations(table, &path)?;
            path
        }
    };
    Ok(path)
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn print_stations(stations: &StationTable) {
    println!(
        "{:<28} {:>9} {:>10} {:>9}  {}",
        "station_id", "lat", "lon", "elevation", "station_name"
    );
    for station in stations {
        let elevation = station
            .elevation
            .map(|e| format!("{:.1}", e))
            .unwrap_or_default();
        println!(
            "{:<28} {:>9.4} {:>10.4} {:>9}  {}",
            station.station_id, station.lat, station.lon, elevation, station.station_name
        );
    }
}
