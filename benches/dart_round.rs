//! DART round benchmarks: one full round and the drop/renormalize bookkeeping.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use lightgbm_dart::{Boosting, ConfigBuilder, Dataset, VerbosityLevel, DART};
use ndarray::{Array1, Array2};
use rand::prelude::*;

fn dataset(rows: usize, cols: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let features = Array2::from_shape_fn((rows, cols), |_| rng.gen_range(-1.0f32..1.0));
    let labels = Array1::from_shape_fn(rows, |i| {
        features.row(i).iter().enumerate().map(|(j, v)| v * (j as f32 + 1.0)).sum::<f32>()
    });
    Dataset::new(features, labels, None).unwrap()
}

fn warmed_booster(drop_rate: f64, xgboost: bool, rounds: usize) -> DART {
    let config = ConfigBuilder::new()
        .num_leaves(15)
        .min_data_in_leaf(20)
        .drop_rate(drop_rate)
        .skip_drop(0.0)
        .xgboost_dart_mode(xgboost)
        .verbosity(VerbosityLevel::Warning)
        .build()
        .unwrap();
    let mut booster = DART::new(config, dataset(5_000, 10, 42)).unwrap();
    booster.add_valid_dataset(dataset(1_000, 10, 7)).unwrap();
    for _ in 0..rounds {
        booster.train_one_iter(None, false).unwrap();
    }
    booster
}

fn bench_dart_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("dart/round");
    group.sample_size(10);

    for (name, xgboost) in [("standard", false), ("xgboost", true)] {
        group.bench_function(name, |b| {
            b.iter_batched(
                || warmed_booster(0.1, xgboost, 20),
                |mut booster| {
                    let stop = booster.train_one_iter(None, false).unwrap();
                    black_box(stop)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_drop_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("dart/drop");
    group.sample_size(10);

    group.bench_function("ensure_dropped_full_rate", |b| {
        b.iter_batched(
            || warmed_booster(1.0, false, 20),
            |mut booster| black_box(booster.ensure_dropped()),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_dart_round, bench_drop_step);
criterion_main!(benches);
