//! Benchmarks for column type inference
//!
//! Run with: cargo bench -p dataloom-core

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use dataloom_core::inference::{ColumnTypeInferrer, parse_explicit, parse_permissive};
use dataloom_core::staging::Dataset;

/// Generate a sales-like dataset with one column per inference rule
fn generate_dataset(rows: usize) -> Dataset {
    let columns = ["id", "account", "amount", "booked_on", "updated_at", "customer"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let rows = (0..rows)
        .map(|i| {
            vec![
                Some(i.to_string()),
                Some((5_000_000_000u64 + i as u64).to_string()),
                Some(format!("{:.2}", 10.0 + i as f64 * 1.25)),
                Some(format!("2024-{:02}-{:02}", 1 + i % 12, 1 + i % 28)),
                Some(format!("2024-03-{:02} {:02}:15:00", 1 + i % 28, i % 24)),
                Some(format!("Customer {}", i % 97)),
            ]
        })
        .collect();
    Dataset::new(columns, rows)
}

/// Benchmark whole-dataset inference with varying row counts
fn bench_dataset_inference(c: &mut Criterion) {
    let mut group = c.benchmark_group("dataset_inference");

    for count in [100, 1_000, 10_000].iter() {
        let dataset = generate_dataset(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(
            BenchmarkId::new("infer_dataset", count),
            &dataset,
            |b, dataset| {
                let inferrer = ColumnTypeInferrer::new();
                b.iter(|| black_box(inferrer.infer_dataset(dataset)));
            },
        );
    }

    group.finish();
}

/// Benchmark the date parsers on typical inputs
fn bench_date_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("date_parsing");

    let test_cases = vec![
        ("iso_date", "2024-01-15"),
        ("iso_datetime", "2024-01-15 10:30:00"),
        ("day_first", "15/01/2024"),
        ("rfc3339", "2024-01-15T10:30:00Z"),
        ("month_name", "15 Jan 2024"),
        ("not_a_date", "hello world"),
    ];

    for (name, value) in test_cases {
        group.bench_with_input(BenchmarkId::new("explicit", name), &value, |b, value| {
            b.iter(|| black_box(parse_explicit(value)));
        });
        group.bench_with_input(BenchmarkId::new("permissive", name), &value, |b, value| {
            b.iter(|| black_box(parse_permissive(value)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dataset_inference, bench_date_parsing);
criterion_main!(benches);
