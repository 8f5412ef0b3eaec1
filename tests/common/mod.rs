//! Small data root with GHCNd, GHCNh and GSDR files

#![allow(dead_code)]

use arrow::array::{
    ArrayRef, Date32Array, Float64Array, Int32Array, Int64Array, StringArray, TimestampSecondArray,
};
use arrow::record_batch::RecordBatch;
use chrono::{TimeZone, Utc};
use parquet::arrow::ArrowWriter;
use seasters::config::PathConfig;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const NEW_YORK: &str = "USW00094728";
pub const SYDNEY: &str = "ASN00066062";
pub const ALERT: &str = "CA002400306";
/// Temperature-only GHCNd station: no PRCP inventory row, no PRCP column
pub const TORONTO: &str = "CA006158355";
pub const HEATHROW: &str = "UKM00003772";
pub const BERLIN: &str = "DE_00001";

/// Hourly GHCNh accumulation variables other than 1 and 24 hours
pub const GHCNH_EMPTY_VARS: [&str; 7] = [
    "precipitation_3_hour",
    "precipitation_6_hour",
    "precipitation_9_hour",
    "precipitation_12_hour",
    "precipitation_15_hour",
    "precipitation_18_hour",
    "precipitation_21_hour",
];

pub struct Fixture {
    // Keeps the directory alive for the duration of the test
    _dir: TempDir,
    pub paths: PathConfig,
}

pub fn write_parquet(path: &Path, columns: Vec<(&str, ArrayRef)>) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let batch = RecordBatch::try_from_iter(columns).unwrap();
    let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), batch.schema(), None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

pub fn ts(y: i32, m: u32, d: u32, h: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp()
}

fn days(y: i32, m: u32, d: u32) -> i32 {
    (ts(y, m, d, 0) / 86_400) as i32
}

fn strings(values: &[&str]) -> ArrayRef {
    Arc::new(StringArray::from(values.to_vec()))
}

fn floats(values: Vec<Option<f64>>) -> ArrayRef {
    Arc::new(Float64Array::from(values))
}

fn stations(ids: &[&str], lats: &[f64], lons: &[f64], names: &[&str]) -> Vec<(&'static str, ArrayRef)> {
    vec![
        ("station_id", strings(ids)),
        ("lat", Arc::new(Float64Array::from(lats.to_vec())) as ArrayRef),
        ("lon", Arc::new(Float64Array::from(lons.to_vec())) as ArrayRef),
        ("elevation", floats(ids.iter().map(|_| Some(30.0)).collect())),
        ("station_name", strings(names)),
    ]
}

pub fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let paths = PathConfig::from_root(dir.path()).unwrap();

    write_ghcnd(&paths);
    write_ghcnh(&paths);
    write_gsdr(&paths);

    Fixture { _dir: dir, paths }
}

fn write_ghcnd(paths: &PathConfig) {
    write_parquet(
        &paths.ghcnd_stations(),
        stations(
            &[NEW_YORK, SYDNEY, ALERT, TORONTO],
            &[40.7789, -33.8607, 82.5, 43.6667],
            &[-73.9692, 151.205, -62.3333, -79.4],
            &["NEW YORK CNTRL PK TWR", "SYDNEY (OBSERVATORY HILL)", "ALERT", "TORONTO"],
        ),
    );
    write_parquet(
        &paths.ghcnd_inventory(),
        vec![
            ("station_id", strings(&[NEW_YORK, SYDNEY, ALERT, SYDNEY, TORONTO])),
            ("var", strings(&["PRCP", "PRCP", "PRCP", "TMAX", "TMAX"])),
            (
                "start",
                Arc::new(Int32Array::from(vec![1869, 1858, 2000, 1859, 1840])) as ArrayRef,
            ),
            (
                "end",
                Arc::new(Int32Array::from(vec![2023, 2023, 2001, 2023, 2023])) as ArrayRef,
            ),
        ],
    );

    // No data file for ALERT: it must always be excluded before reading
    write_parquet(
        &paths.ghcnd_file(NEW_YORK),
        vec![
            (
                "time",
                Arc::new(Date32Array::from(
                    (1..=5).map(|d| days(2020, 1, d)).collect::<Vec<_>>(),
                )) as ArrayRef,
            ),
            (
                "PRCP",
                floats(vec![Some(0.0), Some(3.3), Some(12.7), None, Some(1.0)]),
            ),
            ("TMAX", floats(vec![Some(2.0); 5])),
        ],
    );
    write_parquet(
        &paths.ghcnd_file(SYDNEY),
        vec![
            (
                "time",
                Arc::new(Date32Array::from(
                    (2..=6).map(|d| days(2020, 1, d)).collect::<Vec<_>>(),
                )) as ArrayRef,
            ),
            ("PRCP", floats(vec![Some(0.2); 5])),
        ],
    );
    write_parquet(
        &paths.ghcnd_file(TORONTO),
        vec![
            (
                "time",
                Arc::new(Date32Array::from(
                    (1..=3).map(|d| days(2020, 1, d)).collect::<Vec<_>>(),
                )) as ArrayRef,
            ),
            ("TMAX", floats(vec![Some(-3.0); 3])),
        ],
    );
}

fn write_ghcnh(paths: &PathConfig) {
    write_parquet(
        &paths.ghcnh_station_list(),
        stations(
            &[NEW_YORK, HEATHROW],
            &[40.7789, 51.4778],
            &[-73.9692, -0.4614],
            &["NEW YORK CNTRL PK TWR", "LONDON HEATHROW"],
        ),
    );

    let counts = |ids: &[&str], years: Vec<i64>, counts: Vec<i64>| {
        vec![
            ("station_id", strings(ids)),
            ("year", Arc::new(Int64Array::from(years)) as ArrayRef),
            ("count", Arc::new(Int64Array::from(counts)) as ArrayRef),
        ]
    };

    write_parquet(
        &paths.ghcnh_inventory("precipitation"),
        counts(&[NEW_YORK, HEATHROW, HEATHROW], vec![2020, 2019, 2020], vec![100, 50, 0]),
    );
    write_parquet(
        &paths.ghcnh_inventory("precipitation_24_hour"),
        counts(&[NEW_YORK], vec![2020], vec![3]),
    );
    for var in GHCNH_EMPTY_VARS {
        write_parquet(
            &paths.ghcnh_inventory(var),
            counts(&[NEW_YORK], vec![2020], vec![0]),
        );
    }

    write_parquet(
        &paths.ghcnh_file(NEW_YORK, 2020, "precipitation"),
        vec![
            (
                "time",
                Arc::new(TimestampSecondArray::from(vec![
                    ts(2020, 1, 1, 0),
                    ts(2020, 1, 1, 1),
                    ts(2020, 1, 1, 2),
                ])) as ArrayRef,
            ),
            ("precipitation", floats(vec![Some(0.0), Some(1.2), None])),
        ],
    );
    write_parquet(
        &paths.ghcnh_file(HEATHROW, 2019, "precipitation"),
        vec![
            (
                "time",
                Arc::new(TimestampSecondArray::from(vec![ts(2019, 12, 31, 23)])) as ArrayRef,
            ),
            ("precipitation", floats(vec![Some(0.4)])),
        ],
    );
    write_parquet(
        &paths.ghcnh_file(NEW_YORK, 2020, "precipitation_24_hour"),
        vec![
            (
                "time",
                Arc::new(TimestampSecondArray::from(vec![
                    ts(2020, 1, 1, 0),
                    ts(2020, 1, 2, 0),
                ])) as ArrayRef,
            ),
            ("precipitation_24_hour", floats(vec![Some(5.1), Some(0.0)])),
        ],
    );
}

fn write_gsdr(paths: &PathConfig) {
    let mut columns = stations(&[BERLIN], &[52.4537], &[13.3017], &["BERLIN-DAHLEM"]);
    columns.push(("resolution", floats(vec![Some(0.1)])));
    write_parquet(&paths.gsdr_stations(), columns);

    write_parquet(
        &paths.gsdr_inventory(),
        vec![
            ("station_id", strings(&[BERLIN])),
            (
                "start",
                Arc::new(TimestampSecondArray::from(vec![ts(2019, 6, 1, 0)])) as ArrayRef,
            ),
            (
                "end",
                Arc::new(TimestampSecondArray::from(vec![ts(2020, 12, 31, 23)])) as ArrayRef,
            ),
        ],
    );

    write_parquet(
        &paths.gsdr_file(BERLIN),
        vec![
            (
                "time",
                Arc::new(TimestampSecondArray::from(vec![
                    ts(2020, 1, 1, 0),
                    ts(2020, 1, 1, 1),
                    ts(2020, 1, 1, 2),
                ])) as ArrayRef,
            ),
            ("Precipitation", floats(vec![Some(0.1), Some(0.0), Some(2.54)])),
        ],
    );
}
