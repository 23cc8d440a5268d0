//! End-to-end training, evaluation and persistence tests.

use lightgbm_dart::*;
use ndarray::{Array1, Array2};
use tempfile::TempDir;

mod common;
use common::*;

fn mse(predictions: &Array2<f64>, labels: &Array1<f32>) -> f64 {
    predictions
        .column(0)
        .iter()
        .zip(labels.iter())
        .map(|(p, &y)| (p - f64::from(y)).powi(2))
        .sum::<f64>()
        / labels.len() as f64
}

#[test]
fn test_regression_loss_decreases() {
    for boosting_type in [BoostingType::GBDT, BoostingType::DART] {
        let features = create_test_features_regression(300, 4);
        let labels = create_test_labels_regression(&features);
        let train = Dataset::new(features.clone(), labels.clone(), None).unwrap();

        let config = dart_config(0.1, 0.5)
            .boosting_type(boosting_type)
            .num_iterations(30)
            .build()
            .unwrap();
        let mut booster = create_boosting(config, train).unwrap();

        let baseline = mse(&Array2::zeros((300, 1)), &labels);
        assert_eq!(booster.train().unwrap(), 30);
        let predictions = booster.predict_raw(&features.view(), None).unwrap();
        assert!(mse(&predictions, &labels) < baseline * 0.5);
    }
}

#[test]
fn test_binary_dart_training() {
    let features = create_test_features_regression(200, 3);
    let labels = Array1::from_shape_fn(200, |i| if features[[i, 0]] > 0.0 { 1.0 } else { 0.0 });
    let train = Dataset::new(features.clone(), labels.clone(), None).unwrap();
    let config = dart_config(0.2, 0.0)
        .objective(ObjectiveType::Binary)
        .num_iterations(20)
        .build()
        .unwrap();
    let mut booster = create_boosting(config, train).unwrap();
    booster.train().unwrap();

    let raw = booster.predict_raw(&features.view(), None).unwrap();
    let correct = raw
        .column(0)
        .iter()
        .zip(labels.iter())
        .filter(|(&s, &y)| (s > 0.0) == (y > 0.5))
        .count();
    assert!(correct > 180);
}

#[test]
fn test_weighted_training_runs() {
    let features = create_test_features_regression(100, 2);
    let labels = create_test_labels_regression(&features);
    let weights = create_test_weights(100);
    let train = Dataset::new(features, labels, Some(weights)).unwrap();
    let config = dart_config(0.2, 0.0).num_iterations(5).build().unwrap();
    let mut booster = create_boosting(config, train.clone()).unwrap();
    booster.train().unwrap();
    assert_eq!(booster.current_iteration(), 5);
}

#[test]
fn test_dart_early_stopping_keeps_trees() {
    let train = regression_dataset(200, 3, 21);
    // Unrelated labels: validation loss cannot keep improving.
    let valid_features = create_test_features_regression(80, 3);
    let valid_labels = Array1::from_shape_fn(80, |i| if i % 2 == 0 { 10.0 } else { -10.0 });
    let valid = Dataset::new(valid_features, valid_labels, None).unwrap();

    let config = dart_config(0.1, 0.5)
        .num_iterations(200)
        .early_stopping_rounds(Some(3))
        .build()
        .unwrap();
    let mut booster = DART::new(config, train).unwrap();
    booster.add_valid_dataset(valid.clone()).unwrap();
    let rounds = booster.train().unwrap();

    assert!(rounds < 200);
    assert_eq!(booster.models().len(), rounds);
    assert!(booster.last_round().unwrap().stopped);
    let best = booster.gbdt().best_iteration().unwrap();
    assert!(best <= rounds);
    let gbdt = booster.gbdt();
    assert_accumulator_consistent(gbdt.valid_score(0).unwrap(), gbdt.models(), 1, &valid);
}

#[test]
fn test_model_round_trip_predictions() {
    let train = regression_dataset(150, 3, 22);
    let config = dart_config(0.3, 0.0).num_iterations(10).build().unwrap();
    let mut booster = DART::new(config, train.clone()).unwrap();
    booster.train().unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dart_model.json");
    let model = booster.to_model();
    model.save_to_file(&path).unwrap();
    let loaded = Model::load_from_file(&path).unwrap();
    assert_eq!(loaded, model);
    assert_eq!(loaded.boosting_type, BoostingType::DART);
    assert_eq!(loaded.num_iterations(), 10);

    // Predictions on the training data reproduce the training accumulator.
    let predictions = loaded.predict_raw(&train.features(), None).unwrap();
    for (i, &score) in booster.gbdt().training_score().iter().enumerate() {
        assert!((predictions[[i, 0]] - score).abs() < 1e-9);
    }

    let partial = loaded.predict_raw(&train.features(), Some(3)).unwrap();
    let direct = booster.predict_raw(&train.features(), Some(3)).unwrap();
    assert_eq!(partial, direct);
}

#[test]
fn test_config_file_drives_boosting() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dart.toml");
    std::fs::write(
        &path,
        r#"
boosting_type = "dart"
num_iterations = 4
num_leaves = 5
min_data_in_leaf = 5
drop_rate = 1.0
skip_drop = 0.0
xgboost_dart_mode = true
"#,
    )
    .unwrap();

    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(config.dart_params().mode, NormalizationMode::Xgboost);
    let mut booster = create_boosting(config, regression_dataset(100, 2, 23)).unwrap();
    assert_eq!(booster.name(), "dart");
    assert_eq!(booster.train().unwrap(), 4);

    // Round 2 dropped round 1 with k = 1: final factor 1 / (lr + 1), then round 3 (k = 2).
    let w0 = booster.models()[0].shrinkage();
    let expected = 0.1 * (1.0 / 1.1) * (2.0 / 2.1) * (3.0 / 3.1);
    assert!((w0 - expected).abs() < 1e-12);
}

#[test]
fn test_invalid_probability_rejected_at_build() {
    assert!(dart_config(1.2, 0.0).build().is_err());
    assert!(dart_config(0.1, -0.5).build().is_err());
}

#[test]
fn test_logging_init_is_idempotent() {
    init_with_verbosity(VerbosityLevel::Debug);
    init();
    assert!(is_initialized());
}
