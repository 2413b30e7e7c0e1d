//! Random forest regressor
//!
//! Bagged CART trees; the prediction is the mean over trees. Per-tree seeds are
//! drawn up front from one seeded generator, so a forest is reproducible for a
//! given `random_state` whether trees are fitted sequentially or in parallel.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::features::FeatureFrame;
use crate::model::tree::{RegressionTree, TreeParams};
use crate::training::Parallelism;
use crate::{GradeError, Result, TrainingConfig};

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub random_state: u64,
    pub bootstrap: bool,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            random_state: 42,
            bootstrap: true,
            tree: TreeParams::default(),
        }
    }
}

impl From<&TrainingConfig> for ForestParams {
    fn from(config: &TrainingConfig) -> Self {
        ForestParams {
            n_estimators: config.n_estimators,
            random_state: config.random_state,
            bootstrap: config.bootstrap,
            tree: TreeParams {
                max_depth: config.max_depth,
                min_samples_split: config.min_samples_split,
                min_samples_leaf: config.min_samples_leaf,
                max_features: None,
            },
        }
    }
}

/// Fitted random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    params: ForestParams,
    n_features: usize,
    /// Column names seen at fit time, when fitted from a frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    /// Fit a forest on row-major features `x` and targets `y`
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        params: ForestParams,
        parallelism: Parallelism,
    ) -> Result<Self> {
        if params.n_estimators == 0 {
            return Err(GradeError::Config(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if x.is_empty() {
            return Err(GradeError::EmptyDataset);
        }
        if x.len() != y.len() {
            return Err(GradeError::LengthMismatch {
                rows: x.len(),
                targets: y.len(),
            });
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|r| r.len() != n_features) {
            return Err(GradeError::FeatureMismatch {
                expected: n_features,
                found: row.len(),
            });
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(GradeError::NonFiniteTarget { row });
        }
        for (row, values) in x.iter().enumerate() {
            if let Some(column) = values.iter().position(|v| !v.is_finite()) {
                return Err(GradeError::NonFiniteFeature { row, column });
            }
        }

        let mut master = StdRng::seed_from_u64(params.random_state);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| master.random()).collect();

        let parallelism = parallelism.correct_for_workload(seeds.len());
        log::debug!(
            "Fitting {} trees on {} rows x {} features ({} threads)",
            seeds.len(),
            x.len(),
            n_features,
            parallelism.n_threads()
        );

        let fit_one = |(i, seed): (usize, &u64)| {
            let tree = fit_tree(x, y, &params, *seed);
            log::debug!(
                "  tree {}: {} nodes, depth {}",
                i + 1,
                tree.n_nodes(),
                tree.depth()
            );
            tree
        };

        let trees: Vec<RegressionTree> = parallelism.install(|parallel| {
            if parallel {
                seeds.par_iter().enumerate().map(fit_one).collect()
            } else {
                seeds.iter().enumerate().map(fit_one).collect()
            }
        })?;

        Ok(RandomForestRegressor {
            params,
            n_features,
            feature_names: None,
            trees,
        })
    }

    /// Fit on a named-column frame; the names are checked again at predict time
    pub fn fit_frame(
        frame: &FeatureFrame,
        y: &[f64],
        params: ForestParams,
        parallelism: Parallelism,
    ) -> Result<Self> {
        let mut forest = Self::fit(frame.rows(), y, params, parallelism)?;
        forest.feature_names = Some(frame.columns().to_vec());
        Ok(forest)
    }

    /// Predict one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(GradeError::FeatureMismatch {
                expected: self.n_features,
                found: row.len(),
            });
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        Ok(sum / self.trees.len().max(1) as f64)
    }

    /// Predict every row, in order
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>> {
        rows.iter().map(|r| self.predict_row(r)).collect()
    }

    /// Mean of per-tree normalised impurity decreases
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }

        let sum: f64 = total.iter().sum();
        if sum > 0.0 {
            total.iter_mut().for_each(|v| *v /= sum);
        }
        total
    }

    /// True when no tree holds an infinite or NaN value
    pub fn is_finite(&self) -> bool {
        self.trees.iter().all(RegressionTree::is_finite)
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(|t| t.n_nodes()).sum()
    }
}

fn fit_tree(x: &[Vec<f64>], y: &[f64], params: &ForestParams, seed: u64) -> RegressionTree {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = x.len();
    let indices: Vec<usize> = if params.bootstrap {
        (0..n).map(|_| rng.random_range(0..n)).collect()
    } else {
        (0..n).collect()
    };
    RegressionTree::fit(x, y, indices, &params.tree, &mut rng)
}
