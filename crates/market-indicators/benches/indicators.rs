//! Benchmarks for the analysis transforms.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use market_core::traits::{Indicator, MultiOutputIndicator};
use market_indicators::{technical_snapshot, LinearTrend, Macd, Rsi, Sma};

fn generate_closes(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicators");

    for size in [250, 2_500, 25_000].iter() {
        let closes = generate_closes(*size);

        group.bench_with_input(BenchmarkId::new("sma20", size), &closes, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("rsi14", size), &closes, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("macd", size), &closes, |b, data| {
            let macd = Macd::new();
            b.iter(|| macd.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");

    for size in [30, 365, 5_000].iter() {
        let closes = generate_closes(*size);

        group.bench_with_input(BenchmarkId::new("linear_trend", size), &closes, |b, data| {
            b.iter(|| LinearTrend::fit(black_box(data)).forecast(5))
        });

        group.bench_with_input(BenchmarkId::new("snapshot", size), &closes, |b, data| {
            b.iter(|| technical_snapshot(black_box(data)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_indicators, benchmark_analysis);
criterion_main!(benches);
