//! Core data types for the DART booster.
//!
//! Type aliases keep the LightGBM naming (`data_size_t`, `score_t`, `label_t`)
//! so the boosting code reads close to the reference algorithm, while the
//! enumerations give the configuration layer strongly typed choices.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Data indexing type, equivalent to `data_size_t` in LightGBM.
pub type DataSize = usize;

/// Score, gradient and hessian value type.
///
/// Score accumulators are repeatedly mutated in place as trees are dropped
/// and renormalized, so they are kept in double precision.
pub type Score = f64;

/// Target value and sample weight type, equivalent to `label_t` in LightGBM.
pub type Label = f32;

/// Feature index type for identifying features in the dataset.
pub type FeatureIndex = usize;

/// Tree node identifier type.
pub type NodeIndex = usize;

/// Iteration number type for boosting iterations.
pub type IterationIndex = usize;

/// Objective function types supported by the base trainer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectiveType {
    /// Squared loss
    #[default]
    Regression,
    /// Log loss on `{0, 1}` labels
    Binary,
    /// Softmax cross entropy, one tree per class and round
    Multiclass,
}

impl ObjectiveType {
    /// Name used in config files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectiveType::Regression => "regression",
            ObjectiveType::Binary => "binary",
            ObjectiveType::Multiclass => "multiclass",
        }
    }
}

/// Boosting strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostingType {
    /// Plain gradient boosting
    GBDT,
    /// Gradient boosting with tree dropout
    #[default]
    DART,
}

impl BoostingType {
    /// Name used in config files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostingType::GBDT => "gbdt",
            BoostingType::DART => "dart",
        }
    }
}

/// Evaluation metrics available to the base trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// Mean squared error
    L2,
    /// Root mean squared error
    #[serde(rename = "rmse")]
    RMSE,
    /// Mean log loss of the sigmoid output
    BinaryLogloss,
    /// Mean log loss of the softmax output
    MultiLogloss,
}

impl MetricType {
    /// Name used in config files and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::L2 => "l2",
            MetricType::RMSE => "rmse",
            MetricType::BinaryLogloss => "binary_logloss",
            MetricType::MultiLogloss => "multi_logloss",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_as_str!(ObjectiveType, BoostingType, MetricType);

/// Logging verbosity, mapped onto an `env_logger` default filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Errors only
    Fatal = -1,
    /// Warnings and errors
    Warning = 0,
    /// Round-level progress
    #[default]
    Info = 1,
    /// Per-round dropout details
    Debug = 2,
}

impl VerbosityLevel {
    /// Default `env_logger` filter string for this verbosity.
    pub fn as_filter(&self) -> &'static str {
        match self {
            VerbosityLevel::Fatal => "error",
            VerbosityLevel::Warning => "warn",
            VerbosityLevel::Info => "info",
            VerbosityLevel::Debug => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names() {
        assert_eq!(ObjectiveType::Multiclass.to_string(), "multiclass");
        assert_eq!(BoostingType::DART.to_string(), "dart");
        assert_eq!(MetricType::BinaryLogloss.to_string(), "binary_logloss");
    }

    #[test]
    fn test_verbosity_filter() {
        assert_eq!(VerbosityLevel::Debug.as_filter(), "debug");
        assert!(VerbosityLevel::Warning < VerbosityLevel::Info);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&MetricType::MultiLogloss).unwrap();
        assert_eq!(json, "\"multi_logloss\"");
        let parsed: BoostingType = serde_json::from_str("\"gbdt\"").unwrap();
        assert_eq!(parsed, BoostingType::GBDT);
    }
}
