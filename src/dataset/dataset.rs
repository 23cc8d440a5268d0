//! Dense in-memory dataset.

use crate::core::error::{LightGBMError, Result};
use crate::core::types::{DataSize, Label};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Dense dataset: a `num_data x num_features` feature matrix with labels
/// and optional per-example weights.
#[derive(Debug, Clone)]
pub struct Dataset {
    features: Array2<f32>,
    labels: Array1<Label>,
    weights: Option<Array1<Label>>,
    feature_names: Option<Vec<String>>,
}

impl Dataset {
    /// Create a new dataset from arrays
    pub fn new(
        features: Array2<f32>,
        labels: Array1<Label>,
        weights: Option<Array1<Label>>,
    ) -> Result<Self> {
        let num_data = features.nrows();

        if num_data == 0 {
            return Err(LightGBMError::dataset("Empty dataset provided"));
        }

        if features.ncols() == 0 {
            return Err(LightGBMError::dataset("Dataset has no features"));
        }

        if labels.len() != num_data {
            return Err(LightGBMError::dimension_mismatch(
                format!("features rows: {}", num_data),
                format!("labels length: {}", labels.len()),
            ));
        }

        if let Some(position) = labels.iter().position(|l| !l.is_finite()) {
            return Err(LightGBMError::dataset(format!(
                "Label at index {} is not finite",
                position
            )));
        }

        if let Some(ref weights) = weights {
            if weights.len() != num_data {
                return Err(LightGBMError::dimension_mismatch(
                    format!("features rows: {}", num_data),
                    format!("weights length: {}", weights.len()),
                ));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(LightGBMError::dataset(
                    "Weights must be finite and non-negative",
                ));
            }
        }

        Ok(Dataset {
            features,
            labels,
            weights,
            feature_names: None,
        })
    }

    /// Attach feature names
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.num_features() {
            return Err(LightGBMError::dimension_mismatch(
                format!("features columns: {}", self.num_features()),
                format!("feature names length: {}", names.len()),
            ));
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    /// Number of data points
    pub fn num_data(&self) -> DataSize {
        self.features.nrows()
    }

    /// Number of features
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// Feature matrix view
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    /// Label view
    pub fn labels(&self) -> ArrayView1<'_, Label> {
        self.labels.view()
    }

    /// Weight view, if weights were provided
    pub fn weights(&self) -> Option<ArrayView1<'_, Label>> {
        self.weights.as_ref().map(|w| w.view())
    }

    /// Weight of one example (1.0 when unweighted)
    #[inline]
    pub fn weight(&self, index: usize) -> f64 {
        self.weights
            .as_ref()
            .map_or(1.0, |w| f64::from(w[index]))
    }

    /// Feature names, if set
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }
}
