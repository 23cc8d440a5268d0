//! Objective functions producing first and second order gradients.

use crate::config::Config;
use crate::core::error::{LightGBMError, Result};
use crate::core::types::{ObjectiveType, Score};
use crate::dataset::Dataset;
use rayon::prelude::*;
use std::fmt::Debug;

/// Loss whose gradients drive tree fitting.
///
/// Gradient buffers share the class-major layout of the score buffer.
pub trait ObjectiveFunction: Send + Sync + Debug {
    /// Objective name.
    fn name(&self) -> &'static str;

    /// Number of score columns the objective consumes.
    fn num_class(&self) -> usize;

    /// Fills `gradients` and `hessians` from the current `score`.
    fn get_gradients(&self, score: &[Score], gradients: &mut [Score], hessians: &mut [Score]);
}

/// Builds the objective selected by `config` for `data`, validating labels.
pub fn create_objective(config: &Config, data: &Dataset) -> Result<Box<dyn ObjectiveFunction>> {
    let labels: Vec<f64> = data.labels().iter().map(|&l| f64::from(l)).collect();
    let weights: Option<Vec<f64>> = data
        .weights()
        .map(|w| w.iter().map(|&v| f64::from(v)).collect());

    let objective: Box<dyn ObjectiveFunction> = match config.objective {
        ObjectiveType::Regression => Box::new(RegressionL2 { labels, weights }),
        ObjectiveType::Binary => {
            if let Some(i) = labels.iter().position(|&l| l != 0.0 && l != 1.0) {
                return Err(LightGBMError::dataset(format!(
                    "Binary objective requires labels in {{0, 1}}, got {} at index {}",
                    labels[i], i
                )));
            }
            Box::new(BinaryLogloss { labels, weights })
        }
        ObjectiveType::Multiclass => {
            let num_class = config.num_class;
            let classes = labels
                .iter()
                .enumerate()
                .map(|(i, &l)| {
                    if l < 0.0 || l.fract() != 0.0 || l as usize >= num_class {
                        Err(LightGBMError::dataset(format!(
                            "Multiclass label {} at index {} is not in [0, {})",
                            l, i, num_class
                        )))
                    } else {
                        Ok(l as usize)
                    }
                })
                .collect::<Result<Vec<_>>>()?;
            Box::new(MulticlassSoftmax {
                labels: classes,
                weights,
                num_class,
            })
        }
    };
    log::debug!("Using objective {}", objective.name());
    Ok(objective)
}

#[inline]
fn weight_of(weights: &Option<Vec<f64>>, i: usize) -> f64 {
    weights.as_ref().map_or(1.0, |w| w[i])
}

/// Squared loss: `g = s - y`, `h = 1`.
#[derive(Debug, Clone)]
pub struct RegressionL2 {
    labels: Vec<f64>,
    weights: Option<Vec<f64>>,
}

impl ObjectiveFunction for RegressionL2 {
    fn name(&self) -> &'static str {
        "regression"
    }

    fn num_class(&self) -> usize {
        1
    }

    fn get_gradients(&self, score: &[Score], gradients: &mut [Score], hessians: &mut [Score]) {
        gradients
            .par_iter_mut()
            .zip(hessians.par_iter_mut())
            .enumerate()
            .for_each(|(i, (g, h))| {
                let w = weight_of(&self.weights, i);
                *g = (score[i] - self.labels[i]) * w;
                *h = w;
            });
    }
}

/// Log loss on the sigmoid of the raw score, labels in `{0, 1}`.
#[derive(Debug, Clone)]
pub struct BinaryLogloss {
    labels: Vec<f64>,
    weights: Option<Vec<f64>>,
}

impl ObjectiveFunction for BinaryLogloss {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn num_class(&self) -> usize {
        1
    }

    fn get_gradients(&self, score: &[Score], gradients: &mut [Score], hessians: &mut [Score]) {
        gradients
            .par_iter_mut()
            .zip(hessians.par_iter_mut())
            .enumerate()
            .for_each(|(i, (g, h))| {
                let w = weight_of(&self.weights, i);
                let p = sigmoid(score[i]);
                *g = (p - self.labels[i]) * w;
                *h = p * (1.0 - p) * w;
            });
    }
}

/// Softmax cross entropy over `num_class` score columns.
#[derive(Debug, Clone)]
pub struct MulticlassSoftmax {
    labels: Vec<usize>,
    weights: Option<Vec<f64>>,
    num_class: usize,
}

impl ObjectiveFunction for MulticlassSoftmax {
    fn name(&self) -> &'static str {
        "multiclass"
    }

    fn num_class(&self) -> usize {
        self.num_class
    }

    fn get_gradients(&self, score: &[Score], gradients: &mut [Score], hessians: &mut [Score]) {
        let n = self.labels.len();
        let k = self.num_class;
        let factor = k as f64 / (k as f64 - 1.0);

        let per_row: Vec<(Vec<f64>, Vec<f64>)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let row: Vec<f64> = (0..k).map(|c| score[c * n + i]).collect();
                let probs = softmax(&row);
                let w = weight_of(&self.weights, i);
                let grads = probs
                    .iter()
                    .enumerate()
                    .map(|(c, &p)| {
                        let target = if c == self.labels[i] { 1.0 } else { 0.0 };
                        (p - target) * w
                    })
                    .collect();
                let hess = probs.iter().map(|&p| factor * p * (1.0 - p) * w).collect();
                (grads, hess)
            })
            .collect();

        for (i, (grads, hess)) in per_row.into_iter().enumerate() {
            for c in 0..k {
                gradients[c * n + i] = grads[c];
                hessians[c * n + i] = hess[c];
            }
        }
    }
}

/// Logistic function.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax of one row.
pub fn softmax(row: &[f64]) -> Vec<f64> {
    let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = row.iter().map(|&v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_regression_gradients() {
        let data = Dataset::new(
            array![[0.0f32], [1.0]],
            array![1.0f32, -2.0],
            Some(array![1.0f32, 2.0]),
        )
        .unwrap();
        let objective = create_objective(&Config::default(), &data).unwrap();
        let mut g = vec![0.0; 2];
        let mut h = vec![0.0; 2];
        objective.get_gradients(&[0.5, 0.0], &mut g, &mut h);
        assert_eq!(g, vec![-0.5, 4.0]);
        assert_eq!(h, vec![1.0, 2.0]);
    }

    #[test]
    fn test_binary_gradients_and_label_check() {
        let config = ConfigBuilder::new()
            .objective(ObjectiveType::Binary)
            .build()
            .unwrap();
        let data = Dataset::new(array![[0.0f32], [1.0]], array![1.0f32, 0.0], None).unwrap();
        let objective = create_objective(&config, &data).unwrap();
        let mut g = vec![0.0; 2];
        let mut h = vec![0.0; 2];
        objective.get_gradients(&[0.0, 0.0], &mut g, &mut h);
        assert_relative_eq!(g[0], -0.5);
        assert_relative_eq!(g[1], 0.5);
        assert_relative_eq!(h[0], 0.25);

        let bad = Dataset::new(array![[0.0f32]], array![2.0f32], None).unwrap();
        assert!(create_objective(&config, &bad).is_err());
    }

    #[test]
    fn test_multiclass_gradients() {
        let config = ConfigBuilder::new()
            .objective(ObjectiveType::Multiclass)
            .num_class(3)
            .build()
            .unwrap();
        let data = Dataset::new(array![[0.0f32], [1.0]], array![0.0f32, 2.0], None).unwrap();
        let objective = create_objective(&config, &data).unwrap();
        let mut g = vec![0.0; 6];
        let mut h = vec![0.0; 6];
        objective.get_gradients(&[0.0; 6], &mut g, &mut h);

        let third = 1.0 / 3.0;
        assert_relative_eq!(g[0], third - 1.0, epsilon = 1e-12);
        assert_relative_eq!(g[2], third, epsilon = 1e-12);
        assert_relative_eq!(g[5], third - 1.0, epsilon = 1e-12);
        assert_relative_eq!(h[3], 1.5 * third * (1.0 - third), epsilon = 1e-12);

        let bad = Dataset::new(array![[0.0f32]], array![3.0f32], None).unwrap();
        assert!(create_objective(&config, &bad).is_err());
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1000.0, 1000.0, -5.0]);
        assert_relative_eq!(probs.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(probs[0], probs[1]);
    }
}
