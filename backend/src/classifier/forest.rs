//! Random forest outbreak classifier

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::tree::{DecisionTree, TrainingSet, TreeParams, N_CLASSES};
use super::{read_json, write_json, ArtifactError, OutbreakClassifier};
use crate::services::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

/// Hyperparameters of the forest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split; `None` means `ceil(sqrt(n_features))`
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    /// Reweight classes inversely to their frequency
    pub balanced_class_weight: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            max_features: None,
            bootstrap: true,
            balanced_class_weight: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn tree_params(&self) -> TreeParams {
        let default_features = (FEATURE_COUNT as f64).sqrt().ceil() as usize;
        TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split.max(2),
            min_samples_leaf: self.min_samples_leaf.max(1),
            max_features: self
                .max_features
                .unwrap_or(default_features)
                .clamp(1, FEATURE_COUNT),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FitError {
    #[error("cannot fit a forest on an empty dataset")]
    EmptyDataset,

    #[error("{features} feature rows but {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("labels must be 0 or 1, found {0}")]
    InvalidLabel(u8),

    #[error("n_estimators must be at least 1")]
    NoEstimators,
}

/// Bagged ensemble of CART trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
    feature_importances: Vec<f64>,
}

impl RandomForest {
    pub const MODEL_TYPE: &'static str = "RandomForestClassifier";

    /// Fit the forest. Labels are 0 (no outbreak) or 1 (outbreak).
    pub fn fit(
        features: &[[f64; FEATURE_COUNT]],
        labels: &[u8],
        params: ForestParams,
    ) -> Result<Self, FitError> {
        if features.len() != labels.len() {
            return Err(FitError::LengthMismatch {
                features: features.len(),
                labels: labels.len(),
            });
        }
        if features.is_empty() {
            return Err(FitError::EmptyDataset);
        }
        if params.n_estimators == 0 {
            return Err(FitError::NoEstimators);
        }
        if let Some(bad) = labels.iter().find(|l| **l as usize >= N_CLASSES) {
            return Err(FitError::InvalidLabel(*bad));
        }

        let n = labels.len();
        let class_weights = class_weights(labels, params.balanced_class_weight);
        let tree_params = params.tree_params();
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importances = [0.0; FEATURE_COUNT];

        for _ in 0..params.n_estimators {
            let mut tree_rng = StdRng::seed_from_u64(rng.gen());

            let mut counts = vec![0u32; n];
            if params.bootstrap {
                for _ in 0..n {
                    counts[tree_rng.gen_range(0..n)] += 1;
                }
            } else {
                counts.iter_mut().for_each(|c| *c = 1);
            }

            let weights: Vec<f64> = counts
                .iter()
                .zip(labels)
                .map(|(count, label)| *count as f64 * class_weights[*label as usize])
                .collect();
            let mut samples: Vec<usize> = (0..n).filter(|i| weights[*i] > 0.0).collect();
            if samples.is_empty() {
                continue;
            }

            let data = TrainingSet {
                features,
                labels,
                weights: &weights,
            };
            let (tree, tree_importances) =
                DecisionTree::fit(&data, &mut samples, &tree_params, &mut tree_rng);

            let total: f64 = tree_importances.iter().sum();
            if total > 0.0 {
                for (acc, value) in importances.iter_mut().zip(tree_importances) {
                    *acc += value / total;
                }
            }
            trees.push(tree);
        }

        let total: f64 = importances.iter().sum();
        let feature_importances = importances
            .iter()
            .map(|v| if total > 0.0 { v / total } else { 0.0 })
            .collect();

        tracing::debug!(
            "Fit random forest: {} trees on {} samples",
            trees.len(),
            n
        );

        Ok(Self {
            params,
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            trees,
            feature_importances,
        })
    }

    /// Hard class prediction; ties go to "no outbreak"
    pub fn predict(&self, features: &FeatureVector) -> u8 {
        let [no_outbreak, outbreak] = self.predict_proba(features);
        u8::from(outbreak > no_outbreak)
    }

    /// Normalized mean impurity decrease, in feature order
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn save(&self, path: &Path) -> Result<(), ArtifactError> {
        write_json(path, self)
    }

    /// Load a persisted forest, rejecting models trained on another
    /// feature layout
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let forest: RandomForest = read_json(path)?;
        let invalid = |reason: &str| ArtifactError::Invalid {
            path: path.display().to_string(),
            reason: reason.to_string(),
        };

        if forest.feature_names != FEATURE_NAMES {
            return Err(invalid("feature names do not match the serving feature order"));
        }
        if forest.trees.is_empty() {
            return Err(invalid("forest has no trees"));
        }
        if !forest.trees.iter().all(DecisionTree::is_well_formed) {
            return Err(invalid("forest contains a malformed tree"));
        }
        Ok(forest)
    }
}

impl OutbreakClassifier for RandomForest {
    fn predict_proba(&self, features: &FeatureVector) -> [f64; 2] {
        let x = features.as_array();
        let mut sum = [0.0; N_CLASSES];
        for tree in &self.trees {
            let dist = tree.predict_distribution(&x);
            sum[0] += dist[0];
            sum[1] += dist[1];
        }
        let n = self.trees.len().max(1) as f64;
        [sum[0] / n, sum[1] / n]
    }

    fn model_type(&self) -> &str {
        Self::MODEL_TYPE
    }

    fn n_estimators(&self) -> Option<usize> {
        Some(self.trees.len())
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

fn class_weights(labels: &[u8], balanced: bool) -> [f64; N_CLASSES] {
    if !balanced {
        return [1.0; N_CLASSES];
    }
    let mut counts = [0usize; N_CLASSES];
    for label in labels {
        counts[*label as usize] += 1;
    }
    let n = labels.len() as f64;
    let mut weights = [0.0; N_CLASSES];
    for (weight, count) in weights.iter_mut().zip(counts) {
        if count > 0 {
            *weight = n / (N_CLASSES as f64 * count as f64);
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_dataset() -> (Vec<[f64; FEATURE_COUNT]>, Vec<u8>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..60 {
            let rainfall = 20.0 + i as f64 * 5.0;
            features.push([rainfall, 27.0 + (i % 5) as f64 * 0.5, 70.0 + (i % 7) as f64, (i % 5) as f64]);
            labels.push(u8::from(rainfall > 170.0));
        }
        (features, labels)
    }

    fn vector(rainfall: f64) -> FeatureVector {
        FeatureVector::new(rainfall, 28.0, 75.0, 2)
    }

    #[test]
    fn test_class_weights_balanced() {
        let weights = class_weights(&[0, 0, 0, 1], true);
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[1] - 2.0).abs() < 1e-12);
        assert_eq!(class_weights(&[0, 1], false), [1.0, 1.0]);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        assert_eq!(
            RandomForest::fit(&[], &[], ForestParams::default()).unwrap_err(),
            FitError::EmptyDataset
        );
        assert_eq!(
            RandomForest::fit(&[[0.0; FEATURE_COUNT]], &[0, 1], ForestParams::default())
                .unwrap_err(),
            FitError::LengthMismatch {
                features: 1,
                labels: 2
            }
        );
        assert_eq!(
            RandomForest::fit(&[[0.0; FEATURE_COUNT]], &[3], ForestParams::default())
                .unwrap_err(),
            FitError::InvalidLabel(3)
        );
    }

    #[test]
    fn test_probabilities_are_distributions() {
        let (features, labels) = separable_dataset();
        let forest = RandomForest::fit(
            &features,
            &labels,
            ForestParams {
                n_estimators: 15,
                ..ForestParams::default()
            },
        )
        .unwrap();

        for rainfall in [0.0, 50.0, 150.0, 250.0, 400.0] {
            let [p0, p1] = forest.predict_proba(&vector(rainfall));
            assert!((0.0..=1.0).contains(&p0));
            assert!((0.0..=1.0).contains(&p1));
            assert!((p0 + p1 - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_learns_rainfall_threshold() {
        let (features, labels) = separable_dataset();
        let forest = RandomForest::fit(&features, &labels, ForestParams::default()).unwrap();

        assert_eq!(forest.predict(&vector(30.0)), 0);
        assert_eq!(forest.predict(&vector(300.0)), 1);
        assert_eq!(forest.n_estimators(), Some(100));

        let importances = forest.feature_importances();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[3]);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let (features, labels) = separable_dataset();
        let params = ForestParams {
            n_estimators: 10,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&features, &labels, params.clone()).unwrap();
        let b = RandomForest::fit(&features, &labels, params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_save_and_load() {
        let (features, labels) = separable_dataset();
        let forest = RandomForest::fit(
            &features,
            &labels,
            ForestParams {
                n_estimators: 5,
                ..ForestParams::default()
            },
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        forest.save(&path).unwrap();
        let loaded = RandomForest::load(&path).unwrap();
        assert_eq!(loaded.predict_proba(&vector(200.0)), forest.predict_proba(&vector(200.0)));
    }

    #[test]
    fn test_load_rejects_other_feature_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let json = serde_json::json!({
            "params": ForestParams::default(),
            "feature_names": ["temperature", "rainfall", "humidity", "barangay_encoded"],
            "trees": [{"nodes": [{"Leaf": {"distribution": [0.5, 0.5]}}]}],
            "feature_importances": [0.25, 0.25, 0.25, 0.25]
        });
        std::fs::write(&path, json.to_string()).unwrap();
        assert!(matches!(
            RandomForest::load(&path),
            Err(ArtifactError::Invalid { .. })
        ));
    }
}
