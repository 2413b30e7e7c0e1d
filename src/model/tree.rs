//! CART regression tree
//!
//! Trees are grown depth-first with squared-error splits and stored as a flat
//! node arena. Rows go left when `x[feature] <= threshold`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Tolerance for impurity and split score comparisons
const IMPROVEMENT_EPS: f64 = 1e-12;

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features examined per split (None = all)
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// A node in the tree arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        n_samples: usize,
        impurity: f64,
    },
    Leaf {
        value: f64,
        n_samples: usize,
        impurity: f64,
    },
}

impl Node {
    fn placeholder() -> Self {
        Node::Leaf {
            value: 0.0,
            n_samples: 0,
            impurity: 0.0,
        }
    }

    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    pub fn impurity(&self) -> f64 {
        match self {
            Node::Split { impurity, .. } | Node::Leaf { impurity, .. } => *impurity,
        }
    }
}

/// Fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

/// Mean and variance of targets at a node
#[derive(Debug, Clone, Copy)]
struct NodeStats {
    mean: f64,
    impurity: f64,
}

impl NodeStats {
    fn of(y: &[f64], indices: &[usize]) -> Self {
        let n = indices.len().max(1) as f64;
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let mean = sum / n;
        let impurity = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum::<f64>() / n;
        NodeStats { mean, impurity }
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Proxy score: sum_l^2 / n_l + sum_r^2 / n_r
    score: f64,
}

impl RegressionTree {
    /// Grow a tree on the rows named by `indices` (duplicates allowed for bootstrap samples)
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        indices: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = x.first().map(|r| r.len()).unwrap_or(0);
        let mut nodes = vec![Node::placeholder()];
        let mut stack = vec![(0usize, indices, 0usize)];

        while let Some((slot, indices, depth)) = stack.pop() {
            let stats = NodeStats::of(y, &indices);
            let n_samples = indices.len();

            let can_split = n_samples >= params.min_samples_split.max(2)
                && n_samples >= 2 * params.min_samples_leaf.max(1)
                && params.max_depth.map_or(true, |d| depth < d)
                && stats.impurity > IMPROVEMENT_EPS;

            let split = if can_split {
                best_split(x, y, &indices, n_features, params, rng)
            } else {
                None
            };

            match split {
                None => {
                    nodes[slot] = Node::Leaf {
                        value: stats.mean,
                        n_samples,
                        impurity: stats.impurity,
                    };
                }
                Some(split) => {
                    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                        .iter()
                        .partition(|&&i| x[i][split.feature] <= split.threshold);

                    let left = nodes.len();
                    nodes.push(Node::placeholder());
                    let right = nodes.len();
                    nodes.push(Node::placeholder());

                    nodes[slot] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left,
                        right,
                        n_samples,
                        impurity: stats.impurity,
                    };

                    stack.push((right, right_idx, depth + 1));
                    stack.push((left, left_idx, depth + 1));
                }
            }
        }

        RegressionTree { nodes, n_features }
    }

    /// Predict a single row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value, .. } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    let v = row.get(*feature).copied().unwrap_or(f64::NAN);
                    // NaN compares false and goes right
                    idx = if v <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Weighted impurity decrease per feature, normalised to sum to 1
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut importances = vec![0.0; self.n_features];

        for node in &self.nodes {
            if let Node::Split {
                feature,
                left,
                right,
                n_samples,
                impurity,
                ..
            } = node
            {
                let l = &self.nodes[*left];
                let r = &self.nodes[*right];
                let decrease = *n_samples as f64 * impurity
                    - l.n_samples() as f64 * l.impurity()
                    - r.n_samples() as f64 * r.impurity();
                importances[*feature] += decrease.max(0.0);
            }
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            importances.iter_mut().for_each(|v| *v /= total);
        }
        importances
    }

    /// True when every threshold, leaf value and impurity is finite
    pub fn is_finite(&self) -> bool {
        self.nodes.iter().all(|node| match node {
            Node::Split {
                threshold,
                impurity,
                ..
            } => threshold.is_finite() && impurity.is_finite(),
            Node::Leaf {
                value, impurity, ..
            } => value.is_finite() && impurity.is_finite(),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((*left, depth + 1));
                    stack.push((*right, depth + 1));
                }
            }
        }
        max_depth
    }
}

/// Search the candidate features for the split with the best squared-error reduction
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    indices: &[usize],
    n_features: usize,
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let min_leaf = params.min_samples_leaf.max(1);

    let mut features: Vec<usize> = (0..n_features).collect();
    features.shuffle(rng);
    let n_candidates = params
        .max_features
        .map_or(n_features, |m| m.clamp(1, n_features.max(1)));

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = indices.to_vec();

    for &feature in features.iter().take(n_candidates) {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for k in 0..n - 1 {
            left_sum += y[sorted[k]];

            let current = x[sorted[k]][feature];
            let next = x[sorted[k + 1]][feature];
            // Skips ties and NaN boundaries
            if !(next > current) {
                continue;
            }

            let n_left = k + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
            if best.map_or(true, |b| score > b.score + IMPROVEMENT_EPS) {
                let mut threshold = current + (next - current) / 2.0;
                if threshold >= next || !threshold.is_finite() {
                    threshold = current;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    score,
                });
            }
        }
    }

    best
}
