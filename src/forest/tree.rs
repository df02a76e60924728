//! Gini decision tree, the forest's base learner

use crate::error::{PredictorError, Result};
use ndarray::{Array2, ArrayView1};
use rand::seq::index::sample;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf holding the class distribution of the training rows that reached it
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node; rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Classification tree grown on class indices `0..n_classes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at each node (all features when `None`)
    pub max_features: Option<usize>,
    n_classes: usize,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            n_classes: 0,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Grow the tree on the rows of `x` listed in `rows`.
    ///
    /// `rows` may repeat indices (bootstrap samples). `y[i]` is the class index of row `i`.
    pub fn fit<R: Rng>(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        n_classes: usize,
        rng: &mut R,
    ) -> Result<&mut Self> {
        if x.nrows() != y.len() {
            return Err(PredictorError::SchemaMismatch(format!(
                "{} feature rows but {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if rows.is_empty() {
            return Err(PredictorError::InvalidData("cannot grow a tree on zero rows".to_string()));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(PredictorError::InvalidData(format!(
                "class index {} out of range for {} classes",
                bad, n_classes
            )));
        }

        self.n_classes = n_classes;
        self.n_features = x.ncols();

        let mut importances = vec![0.0; self.n_features];
        let root = self.build_tree(x, y, rows.to_vec(), 0, &mut importances, rng);
        self.root = Some(root);

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = importances;

        Ok(self)
    }

    fn build_tree<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: Vec<usize>,
        depth: usize,
        importances: &mut [f64],
        rng: &mut R,
    ) -> TreeNode {
        let n_samples = rows.len();
        let counts = self.class_counts(y, &rows);
        let impurity = gini(&counts, n_samples);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= 0.0;

        if should_stop {
            return self.leaf(&counts, n_samples);
        }

        let Some((feature_idx, threshold)) = self.find_best_split(x, y, &rows, &counts, impurity, rng)
        else {
            return self.leaf(&counts, n_samples);
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        let left_counts = self.class_counts(y, &left_rows);
        let right_counts = self.class_counts(y, &right_rows);
        importances[feature_idx] += n_samples as f64 * impurity
            - left_rows.len() as f64 * gini(&left_counts, left_rows.len())
            - right_rows.len() as f64 * gini(&right_counts, right_rows.len());

        let left = Box::new(self.build_tree(x, y, left_rows, depth + 1, importances, rng));
        let right = Box::new(self.build_tree(x, y, right_rows, depth + 1, importances, rng));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    /// Best (feature, threshold) among a random draw of candidate features.
    ///
    /// Features are visited in a random order. At least `max_features` are
    /// scanned; if none of those splits the node, scanning continues down the
    /// same order until one does, so constant candidates never force a leaf.
    fn find_best_split<R: Rng>(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        counts: &[usize],
        parent_impurity: f64,
        rng: &mut R,
    ) -> Option<(usize, f64)> {
        let n_try = self.max_features.unwrap_or(self.n_features).clamp(1, self.n_features);
        let order = sample(rng, self.n_features, self.n_features);

        let mut best_gain = 0.0f64;
        let mut best: Option<(usize, f64)> = None;

        for (visited, feature_idx) in order.iter().enumerate() {
            if visited >= n_try && best.is_some() {
                break;
            }
            if let Some((gain, threshold)) = self.best_threshold(x, y, rows, counts, parent_impurity, feature_idx) {
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, threshold));
                }
            }
        }

        best
    }

    /// Highest-gain threshold on one feature, scanned once in sorted order with
    /// running class counts. `None` when the feature is constant on `rows` or no
    /// cut respects `min_samples_leaf`.
    fn best_threshold(
        &self,
        x: &Array2<f64>,
        y: &[usize],
        rows: &[usize],
        counts: &[usize],
        parent_impurity: f64,
        feature_idx: usize,
    ) -> Option<(f64, f64)> {
        let n = rows.len();
        let mut column: Vec<(f64, usize)> = rows.iter().map(|&i| (x[[i, feature_idx]], y[i])).collect();
        column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut left = vec![0usize; self.n_classes];
        let mut right = counts.to_vec();
        let mut best: Option<(f64, f64)> = None;

        for pos in 0..n - 1 {
            let (value, class) = column[pos];
            left[class] += 1;
            right[class] -= 1;

            let next = column[pos + 1].0;
            if next <= value {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            let weighted =
                (n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right)) / n as f64;
            let gain = parent_impurity - weighted;
            if gain > best.map_or(0.0, |(g, _)| g) {
                let mut threshold = value / 2.0 + next / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some((gain, threshold));
            }
        }

        best
    }

    fn class_counts(&self, y: &[usize], rows: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in rows {
            counts[y[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], n_samples: usize) -> TreeNode {
        let distribution = counts
            .iter()
            .map(|&c| if n_samples > 0 { c as f64 / n_samples as f64 } else { 0.0 })
            .collect();
        TreeNode::Leaf {
            distribution,
            n_samples,
        }
    }

    /// Class distribution of the leaf reached by `row`
    pub fn predict_distribution(&self, row: ArrayView1<f64>) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(PredictorError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Normalized impurity decrease per feature; all zeros when the root is a leaf
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        self.root.as_ref().map_or(0, walk)
    }
}

/// Gini impurity of a class-count vector
fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}
