//! Random forest classifier
//!
//! Bootstrap-aggregated Gini trees with per-node feature subsampling. Exposes the
//! two operations the dashboard relies on: [`RandomForestClassifier::predict_proba`]
//! and [`RandomForestClassifier::feature_importances`].

mod tree;

pub use tree::{DecisionTree, TreeNode};

use crate::error::{PredictorError, Result};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Strategy for the number of features drawn at each split
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    /// Square root of n_features
    Sqrt,
    /// Log2 of n_features
    Log2,
    /// Fixed number
    Fixed(usize),
    /// All features
    All,
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2() as usize,
            MaxFeatures::Fixed(n) => n.min(n_features),
            MaxFeatures::All => n_features,
        }
        .max(1)
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 150,
            max_depth: Some(15),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestParams {
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    /// Sorted distinct label values; column `j` of `predict_proba` is `classes[j]`
    classes: Vec<f64>,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            classes: Vec::new(),
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Fit the forest. Tree `i` draws from an RNG seeded with `seed + i`, so the
    /// result does not depend on how rayon schedules the trees.
    pub fn fit(&mut self, x: &Array2<f64>, y: &[f64]) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PredictorError::SchemaMismatch(format!(
                "{} feature rows but {} labels",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 || n_features == 0 {
            return Err(PredictorError::InvalidData(format!(
                "cannot fit on a {}x{} matrix",
                n_samples, n_features
            )));
        }
        if self.params.n_estimators == 0 {
            return Err(PredictorError::InvalidData("n_estimators must be at least 1".to_string()));
        }
        if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
            return Err(PredictorError::InvalidData(format!("non-finite label {}", bad)));
        }
        if x.iter().any(|v| v.is_nan()) {
            return Err(PredictorError::InvalidData(
                "feature matrix contains missing values".to_string(),
            ));
        }

        let mut classes: Vec<f64> = y.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();
        let class_idx: Vec<usize> = y
            .iter()
            .map(|v| classes.iter().position(|c| c == v).unwrap_or(0))
            .collect();
        let n_classes = classes.len();

        let max_features = self.params.max_features.resolve(n_features);
        let params = &self.params;

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(tree_idx as u64));

                let rows: Vec<usize> = if params.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };

                let mut tree = DecisionTree::new()
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_samples_split)
                    .with_min_samples_leaf(params.min_samples_leaf)
                    .with_max_features(max_features);
                tree.fit(x, &class_idx, &rows, n_classes, &mut rng)?;
                Ok(tree)
            })
            .collect::<Result<_>>()?;

        debug!(
            trees = trees.len(),
            max_features,
            max_tree_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "forest grown"
        );

        self.trees = trees;
        self.classes = classes;
        self.n_features = n_features;
        self.compute_feature_importances();

        Ok(self)
    }

    fn compute_feature_importances(&mut self) {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, &val) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += val;
            }
        }

        let n_trees = self.trees.len() as f64;
        for imp in &mut total {
            *imp /= n_trees;
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            for imp in &mut total {
                *imp /= sum;
            }
        }

        self.feature_importances = total;
    }

    /// Class probabilities, one row per input row, one column per entry of [`classes`](Self::classes)
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(PredictorError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PredictorError::SchemaMismatch(format!(
                "model expects {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }

        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, row) in x.rows().into_iter().enumerate() {
            for tree in &self.trees {
                let dist = tree.predict_distribution(row)?;
                for (j, &p) in dist.iter().enumerate() {
                    proba[[i, j]] += p;
                }
            }
        }
        proba /= self.trees.len() as f64;

        Ok(proba)
    }

    /// Probability of the class labelled `1.0` for each row (0 when that class was never seen)
    pub fn predict_positive(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(match self.classes.iter().position(|&c| c == 1.0) {
            Some(j) => proba.column(j).to_owned(),
            None => Array1::zeros(x.nrows()),
        })
    }

    /// Most probable class label per row
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        let labels = proba
            .rows()
            .into_iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(j, _)| j)
                    .unwrap_or(0);
                self.classes[best]
            })
            .collect();
        Ok(labels)
    }

    /// Global mean-decrease-in-impurity importances; sums to 1 unless no tree split
    pub fn feature_importances(&self) -> Result<&[f64]> {
        if self.trees.is_empty() {
            return Err(PredictorError::ModelNotFitted);
        }
        Ok(&self.feature_importances)
    }

    pub fn classes(&self) -> &[f64] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let model: Self = bincode::deserialize(bytes)?;
        if model.trees.is_empty() {
            return Err(PredictorError::ModelNotFitted);
        }
        Ok(model)
    }
}
