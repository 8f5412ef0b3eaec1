use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use seasters::models::{FieldValue, StationRecord, StationTable, TableAttrs, TimeSeries};
use seasters::processors::{check_units, TimeAligner};
use seasters::query::Filter;

// Create test stations spread over the globe
fn create_test_stations(station_count: usize) -> StationTable {
    let stations = (0..station_count)
        .map(|i| {
            StationRecord::new(
                format!("TEST{:07}", i),
                -80.0 + (i as f64 * 7.3) % 160.0,
                -170.0 + (i as f64 * 13.1) % 340.0,
                Some((i % 3000) as f64),
                format!("TEST STATION {}", i),
            )
            .with_extra("resolution", FieldValue::Number(0.1 * (i % 5) as f64))
        })
        .collect();
    StationTable::new(stations).unwrap()
}

// Hourly series with shifted starts so the union index grows with the station count
fn create_test_series(station_count: usize, hours: usize) -> Vec<(String, TimeSeries)> {
    let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    (0..station_count)
        .map(|i| {
            let pairs = (0..hours)
                .filter(|h| (h + i) % 7 != 0)
                .map(|h| {
                    let t = start + Duration::hours((h + i * 3) as i64);
                    (t, ((h * 31 + i) % 17) as f64 * 0.2)
                })
                .collect();
            let attrs = TableAttrs::new("Precipitation", "Precipitation", "mm");
            (format!("TEST{:07}", i), TimeSeries::from_pairs(attrs, pairs).unwrap())
        })
        .collect()
}

fn benchmark_filter(c: &mut Criterion) {
    let stations = create_test_stations(10_000);
    let filter =
        Filter::parse("lat > 30 & lat < 60 & (elevation < 500 | resolution <= 0.2) & not station_name.str.endswith('7')")
            .unwrap();

    c.bench_function("metadata_filter", |b| {
        b.iter(|| {
            let selected = filter.apply(black_box(stations.clone())).unwrap();
            black_box(selected.len())
        })
    });
}

fn benchmark_filter_parse(c: &mut Criterion) {
    c.bench_function("filter_parse", |b| {
        b.iter(|| {
            black_box(
                Filter::parse(black_box(
                    "lat >= -10 and lon in [1, 2, 3] or station_id.str.startswith('USW')",
                ))
                .unwrap(),
            )
        })
    });
}

fn benchmark_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("time_alignment_by_size");

    for &size in &[10, 50, 200] {
        group.bench_with_input(BenchmarkId::new("stations", size), &size, |b, &station_count| {
            let series = create_test_series(station_count, 24 * 30);
            let attrs = TableAttrs::new("Precipitation", "Precipitation", "mm");

            b.iter(|| {
                let table = TimeAligner::new()
                    .align(attrs.clone(), series.clone())
                    .unwrap();
                black_box(table.shape())
            })
        });
    }

    group.finish();
}

fn benchmark_unit_conversion(c: &mut Criterion) {
    let series = create_test_series(50, 24 * 30);
    let attrs = TableAttrs::new("Precipitation", "Precipitation", "mm");
    let table = TimeAligner::new().align(attrs, series).unwrap();

    c.bench_function("unit_conversion_mm_to_inch", |b| {
        b.iter(|| {
            let converted = check_units(black_box(table.clone()), "inch").unwrap();
            black_box(converted.count_valid())
        })
    });
}

criterion_group!(
    benches,
    benchmark_filter,
    benchmark_filter_parse,
    benchmark_alignment,
    benchmark_unit_conversion
);
criterion_main!(benches);
