//! Common test utilities for the DART integration tests.

#![allow(dead_code)]

use lightgbm_dart::*;
use ndarray::{Array1, Array2};
use rand::prelude::*;

/// Create test features for regression tasks
pub fn create_test_features_regression(num_samples: usize, num_features: usize) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(42);

    let mut features = Array2::zeros((num_samples, num_features));

    for i in 0..num_samples {
        for j in 0..num_features {
            features[[i, j]] = rng.gen_range(-5.0..5.0);
        }
    }

    features
}

/// Create test labels for regression based on features
pub fn create_test_labels_regression(features: &Array2<f32>) -> Array1<f32> {
    let num_samples = features.nrows();
    let mut labels = Array1::zeros(num_samples);

    for i in 0..num_samples {
        // Linear part plus a step so trees have something to split on
        let mut label = 0.0;
        for j in 0..features.ncols() {
            label += features[[i, j]] * ((j + 1) as f32 * 0.1);
        }
        if features[[i, 0]] > 1.0 {
            label += 2.0;
        }
        labels[i] = label;
    }

    labels
}

/// Create test labels for multiclass classification
pub fn create_test_labels_multiclass(features: &Array2<f32>, num_classes: usize) -> Array1<f32> {
    let num_samples = features.nrows();
    let mut labels = Array1::zeros(num_samples);

    for i in 0..num_samples {
        let mut max_score = f32::NEG_INFINITY;
        let mut best_class = 0;

        for class in 0..num_classes {
            let mut score = 0.0;
            for j in 0..features.ncols() {
                let sign = if (class + j) % 2 == 0 { 1.0 } else { -1.0 };
                score += features[[i, j]] * sign * ((class + j + 1) as f32 * 0.1);
            }

            if score > max_score {
                max_score = score;
                best_class = class;
            }
        }

        labels[i] = best_class as f32;
    }

    labels
}

/// Create test weights
pub fn create_test_weights(num_samples: usize) -> Array1<f32> {
    let mut rng = StdRng::seed_from_u64(789);
    Array1::from_shape_fn(num_samples, |_| rng.gen_range(0.5..2.0))
}

/// Regression dataset with `num_samples` rows, seeded by `seed`
pub fn regression_dataset(num_samples: usize, num_features: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let features =
        Array2::from_shape_fn((num_samples, num_features), |_| rng.gen_range(-5.0f32..5.0));
    let labels = create_test_labels_regression(&features);
    Dataset::new(features, labels, None).unwrap()
}

/// Multiclass dataset with `num_classes` classes
pub fn multiclass_dataset(num_samples: usize, num_features: usize, num_classes: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(456);
    let features =
        Array2::from_shape_fn((num_samples, num_features), |_| rng.gen_range(-2.0f32..2.0));
    let labels = create_test_labels_multiclass(&features, num_classes);
    Dataset::new(features, labels, None).unwrap()
}

/// Small-tree DART configuration for fast tests
pub fn dart_config(drop_rate: f64, skip_drop: f64) -> ConfigBuilder {
    ConfigBuilder::new()
        .boosting_type(BoostingType::DART)
        .num_leaves(7)
        .min_data_in_leaf(5)
        .learning_rate(0.1)
        .drop_rate(drop_rate)
        .skip_drop(skip_drop)
        .drop_seed(4)
        .verbosity(VerbosityLevel::Warning)
}

/// Sum of every tree's current scaled output for one example and class.
pub fn ensemble_output(models: &[Tree], num_class: usize, data: &Dataset, row: usize, class: usize) -> f64 {
    let features = data.features();
    models
        .iter()
        .enumerate()
        .filter(|(t, _)| t % num_class == class)
        .map(|(_, tree)| tree.predict(&features.row(row)))
        .sum()
}

/// Assert that a class-major score buffer equals the ensemble sum.
pub fn assert_accumulator_consistent(
    score: &[f64],
    models: &[Tree],
    num_class: usize,
    data: &Dataset,
) {
    let n = data.num_data();
    assert_eq!(score.len(), n * num_class);
    for class in 0..num_class {
        for i in 0..n {
            let expected = ensemble_output(models, num_class, data, i, class);
            let actual = score[class * n + i];
            assert!(
                (actual - expected).abs() <= 1e-9 * (1.0 + expected.abs()),
                "class {} row {}: accumulator {} vs ensemble {}",
                class,
                i,
                actual,
                expected
            );
        }
    }
}
