//! Serializable snapshot of a trained ensemble.

use crate::core::error::{LightGBMError, Result};
use crate::core::types::{BoostingType, ObjectiveType, Score};
use crate::tree::Tree;
use ndarray::{Array2, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trained ensemble with the trees in their current weighted form.
///
/// Trees are stored round-major: tree `round * num_class + class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Library version that wrote the model
    pub version: String,
    /// Booster that produced the trees
    pub boosting_type: BoostingType,
    /// Objective the trees were fit for
    pub objective: ObjectiveType,
    /// Trees per round
    pub num_class: usize,
    /// Number of input features
    pub num_features: usize,
    /// Fitted trees
    pub trees: Vec<Tree>,
}

impl Model {
    /// Number of complete rounds.
    pub fn num_iterations(&self) -> usize {
        self.trees.len() / self.num_class.max(1)
    }

    /// Raw scores (`num_rows x num_class`) using the first `num_iteration`
    /// rounds, or all of them.
    pub fn predict_raw(
        &self,
        features: &ArrayView2<'_, f32>,
        num_iteration: Option<usize>,
    ) -> Result<Array2<Score>> {
        predict_raw(
            &self.trees,
            self.num_class,
            self.num_features,
            features,
            num_iteration,
        )
    }

    /// Writes the model as pretty JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reads and validates a model written by [`Model::save_to_file`].
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let model: Model = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.num_class == 0 || self.trees.len() % self.num_class != 0 {
            return Err(LightGBMError::serialization(format!(
                "{} trees cannot be grouped into rounds of {}",
                self.trees.len(),
                self.num_class
            )));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate().map_err(|e| {
                LightGBMError::serialization(format!("Tree {} is invalid: {}", i, e))
            })?;
            if let Some(feature) = tree.max_feature_index() {
                if feature >= self.num_features {
                    return Err(LightGBMError::index_out_of_bounds(feature, self.num_features));
                }
            }
        }
        Ok(())
    }
}

/// Sums the scaled outputs of the first `num_iteration` rounds of `trees`.
pub(crate) fn predict_raw(
    trees: &[Tree],
    num_class: usize,
    num_features: usize,
    features: &ArrayView2<'_, f32>,
    num_iteration: Option<usize>,
) -> Result<Array2<Score>> {
    if features.ncols() != num_features {
        return Err(LightGBMError::dimension_mismatch(
            format!("{} features", num_features),
            format!("{} features", features.ncols()),
        ));
    }
    let total_rounds = trees.len() / num_class;
    let rounds = num_iteration.map_or(total_rounds, |n| n.min(total_rounds));
    let used = &trees[..rounds * num_class];

    let mut output = Array2::zeros((features.nrows(), num_class));
    Zip::from(output.rows_mut())
        .and(features.rows())
        .par_for_each(|mut out, row| {
            for (t, tree) in used.iter().enumerate() {
                out[t % num_class] += tree.predict(&row);
            }
        });
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    fn model() -> Model {
        let mut a = Tree::new(0.0, 2);
        a.split_leaf(0, 0, 0.5, false, 1.0, (1.0, 1), (2.0, 1))
            .unwrap();
        let mut b = Tree::new(4.0, 2);
        b.shrink(0.5);
        Model {
            version: crate::core::constants::LIGHTGBM_DART_VERSION.to_string(),
            boosting_type: BoostingType::DART,
            objective: ObjectiveType::Regression,
            num_class: 1,
            num_features: 1,
            trees: vec![a, b],
        }
    }

    #[test]
    fn test_predict_raw_limits_iterations() {
        let model = model();
        let x = array![[0.0f32], [1.0]];
        let all = model.predict_raw(&x.view(), None).unwrap();
        assert_eq!(all[[0, 0]], 3.0);
        assert_eq!(all[[1, 0]], 4.0);
        let first = model.predict_raw(&x.view(), Some(1)).unwrap();
        assert_eq!(first[[1, 0]], 2.0);
        assert!(model.predict_raw(&array![[0.0f32, 1.0]].view(), None).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = model();
        model.save_to_file(&path).unwrap();
        let loaded = Model::load_from_file(&path).unwrap();
        assert_eq!(model, loaded);
        assert_eq!(loaded.num_iterations(), 2);
    }

    #[test]
    fn test_save_and_load_is_bit_exact() {
        let mut tree = Tree::new(0.0, 2);
        tree.split_leaf(
            0,
            0,
            1.7238588333129885,
            false,
            0.1 + 0.2,
            (1.0 / 3.0, 1),
            (-2.0 / 7.0, 1),
        )
        .unwrap();
        tree.shrink(0.1 / 1.1);
        tree.shrink(2.0 / 2.1);
        let model = Model {
            trees: vec![tree],
            ..model()
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("exact.json");
        model.save_to_file(&path).unwrap();
        let loaded = Model::load_from_file(&path).unwrap();
        assert_eq!(loaded, model);
        let x = array![[1.0f32], [2.0]];
        let before = model.predict_raw(&x.view(), None).unwrap();
        let after = loaded.predict_raw(&x.view(), None).unwrap();
        for (a, b) in before.iter().zip(after.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_load_rejects_ragged_rounds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.json");
        let mut model = model();
        model.num_class = 3;
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        assert!(Model::load_from_file(&path).is_err());
    }
}
