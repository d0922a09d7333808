//! Benchmarks for indicator kernels and the composite analyzer.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use stockscope_core::traits::{Indicator, OhlcIndicator};
use stockscope_core::types::Bar;
use stockscope_indicators::{returns, Atr, Ema, Rsi, Sma, TechnicalAnalyzer};

fn generate_closes(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn generate_bars(size: usize) -> Vec<Bar> {
    generate_closes(size)
        .into_iter()
        .enumerate()
        .map(|(i, c)| Bar::new(i as i64 * 86_400_000, c, c + 1.0, c - 1.0, c, 1_000.0))
        .collect()
}

fn benchmark_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("MovingAverage");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_closes(*size);

        group.bench_with_input(BenchmarkId::new("sma", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("ema", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_closes(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_atr(c: &mut Criterion) {
    let mut group = c.benchmark_group("ATR");

    for size in [1000, 10000].iter() {
        let closes = generate_closes(*size);
        let highs: Vec<f64> = closes.iter().map(|c| c + 1.0).collect();
        let lows: Vec<f64> = closes.iter().map(|c| c - 1.0).collect();

        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            let atr = Atr::new(14);
            b.iter(|| atr.calculate_ohlc(black_box(&highs), black_box(&lows), black_box(&closes)))
        });
    }

    group.finish();
}

fn benchmark_return_stats(c: &mut Criterion) {
    let mut group = c.benchmark_group("ReturnStats");

    for size in [1000, 10000, 100000].iter() {
        let rets = returns::pct_returns(&generate_closes(*size));
        group.bench_with_input(BenchmarkId::new("std_dev_simd", size), &rets, |b, rets| {
            b.iter(|| returns::std_dev_simd(black_box(rets)))
        });
    }

    group.finish();
}

fn benchmark_analyzer(c: &mut Criterion) {
    let bars = generate_bars(250);
    let analyzer = TechnicalAnalyzer::default();

    c.bench_function("analyze_one_year", |b| {
        b.iter(|| analyzer.analyze(black_box(&bars)))
    });
}

criterion_group!(
    benches,
    benchmark_moving_averages,
    benchmark_rsi,
    benchmark_atr,
    benchmark_return_stats,
    benchmark_analyzer,
);
criterion_main!(benches);
