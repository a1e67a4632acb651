//! Benchmarks for the response pipeline: parse, convert, normalize, write.
//!
//! Run with: `cargo bench --package moexiss-bench`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use moexiss_bench::{FixtureConfig, candles_body};
use moexiss_lib::{
    CsvFormatter, Formatter, NormalizationSpec, infer_types, parse_body, to_tables,
};
use std::hint::black_box;

const SIZES: [usize; 3] = [100, 1_000, 10_000];

fn candle_spec() -> NormalizationSpec {
    NormalizationSpec::new()
        .with_dates(["begin", "end"])
        .with_numeric(["open", "close", "high", "low", "value", "volume"])
        .with_index("begin")
}

fn parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for rows in SIZES {
        let body = candles_body(&FixtureConfig {
            rows,
            ..Default::default()
        });
        group.throughput(Throughput::Bytes(body.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &body, |b, body| {
            b.iter(|| parse_body(black_box(body)).unwrap());
        });
    }

    group.finish();
}

fn pipeline_benchmark(c: &mut Criterion) {
    let spec = candle_spec();
    let mut group = c.benchmark_group("pipeline");

    for rows in SIZES {
        let body = candles_body(&FixtureConfig {
            rows,
            text_prices: true,
            with_cursor: true,
        });
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("normalize", rows), &body, |b, body| {
            b.iter(|| {
                let blocks = parse_body(black_box(body)).unwrap();
                let table = to_tables(blocks, Some("candles")).unwrap().into_single().unwrap();
                table.normalize(&spec)
            });
        });

        group.bench_with_input(BenchmarkId::new("infer", rows), &body, |b, body| {
            b.iter(|| {
                let blocks = parse_body(black_box(body)).unwrap();
                let table = to_tables(blocks, Some("candles")).unwrap().into_single().unwrap();
                infer_types(&table)
            });
        });

        let blocks = parse_body(&body).unwrap();
        let table = to_tables(blocks, Some("candles"))
            .unwrap()
            .into_single()
            .unwrap()
            .normalize(&spec);
        group.bench_with_input(BenchmarkId::new("csv", rows), &table, |b, table| {
            b.iter(|| {
                let mut out = Vec::with_capacity(rows * 80);
                CsvFormatter::new().write_table(black_box(table), &mut out).unwrap();
                out
            });
        });
    }

    group.finish();
}

criterion_group!(benches, parse_benchmark, pipeline_benchmark);
criterion_main!(benches);
