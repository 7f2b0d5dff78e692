//! CART decision tree for binary labels.
//!
//! Splits minimise weighted Gini impurity. Candidate thresholds are the
//! midpoints between consecutive distinct feature values; a row goes left when
//! `x[feature] <= threshold`. Among equally good splits the first one found
//! (lowest feature index, then lowest threshold) wins, so fitting is
//! deterministic for a given input order.

use serde::{Deserialize, Serialize};

use crate::error::LoanError;
use crate::LoanResult;

const N_CLASSES: usize = 2;

/// Growth limits for the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeParams {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
}

fn default_max_depth() -> usize {
    6
}

fn default_min_samples_split() -> usize {
    2
}

fn default_min_samples_leaf() -> usize {
    1
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: default_max_depth(),
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        counts: [u64; N_CLASSES],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        counts: [u64; N_CLASSES],
    },
}

/// A fitted tree. Nodes live in a flat arena; index 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    pub params: TreeParams,
    pub n_features: usize,
    pub nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTreeClassifier {
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: TreeParams) -> LoanResult<Self> {
        validate_fit_input(x, y, &params)?;
        let n_features = x[0].len();
        let mut tree = DecisionTreeClassifier {
            params,
            n_features,
            nodes: Vec::new(),
        };
        let indices: Vec<usize> = (0..x.len()).collect();
        tree.grow(x, y, indices, 0);
        Ok(tree)
    }

    /// Depth of the deepest leaf (a lone root leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Structural check for trees that did not come from `fit`: non-empty,
    /// every split feature in range, every child after its parent and inside
    /// the arena. The last two rule out cycles.
    pub fn validate(&self) -> LoanResult<()> {
        if self.nodes.is_empty() {
            return Err(LoanError::SerializationError("tree has no nodes".into()));
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } = node
            {
                if *feature >= self.n_features {
                    return Err(LoanError::SerializationError(format!(
                        "node {idx} splits on feature {feature}, tree has {}",
                        self.n_features
                    )));
                }
                if threshold.is_nan() {
                    return Err(LoanError::SerializationError(format!(
                        "node {idx} has a NaN threshold"
                    )));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(LoanError::SerializationError(format!(
                            "node {idx} has invalid child {child}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Class probabilities for one encoded row, indexed by label.
    pub fn predict_proba(&self, x: &[f64]) -> LoanResult<Vec<f64>> {
        let counts = self.leaf_counts(x)?;
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return Err(LoanError::Inference("reached an empty leaf".into()));
        }
        Ok(counts.iter().map(|&c| c as f64 / total as f64).collect())
    }

    /// Majority label for one encoded row. Ties resolve to label 0.
    pub fn predict(&self, x: &[f64]) -> LoanResult<u8> {
        let counts = self.leaf_counts(x)?;
        Ok(if counts[1] > counts[0] { 1 } else { 0 })
    }

    fn leaf_counts(&self, x: &[f64]) -> LoanResult<[u64; N_CLASSES]> {
        if x.len() != self.n_features {
            return Err(LoanError::Inference(format!(
                "expected {} features, got {}",
                self.n_features,
                x.len()
            )));
        }
        let mut idx = 0usize;
        // A well-formed path visits each node at most once.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { counts }) => return Ok(*counts),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                }) => {
                    let value = x.get(*feature).ok_or_else(|| {
                        LoanError::Inference(format!("split on missing feature {feature}"))
                    })?;
                    idx = if *value <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(LoanError::Inference(format!(
                        "tree references missing node {idx}"
                    )))
                }
            }
        }
        Err(LoanError::Inference("tree traversal did not reach a leaf".into()))
    }

    /// Append the subtree for `indices` and return its node id.
    fn grow(&mut self, x: &[Vec<f64>], y: &[u8], indices: Vec<usize>, depth: usize) -> usize {
        let counts = class_counts(y, &indices);
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { counts });

        let parent_impurity = gini(&counts);
        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
            || parent_impurity == 0.0
        {
            return id;
        }

        let best = match self.best_split(x, y, &indices) {
            Some(b) if b.impurity < parent_impurity => b,
            _ => return id,
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][best.feature] <= best.threshold);

        let left = self.grow(x, y, left_idx, depth + 1);
        let right = self.grow(x, y, right_idx, depth + 1);
        self.nodes[id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
            counts,
        };
        id
    }

    fn best_split(&self, x: &[Vec<f64>], y: &[u8], indices: &[usize]) -> Option<BestSplit> {
        let n = indices.len();
        let total = class_counts(y, indices);
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<BestSplit> = None;

        for feature in 0..self.n_features {
            let mut sorted = indices.to_vec();
            sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

            let mut left = [0u64; N_CLASSES];
            for k in 0..n - 1 {
                left[y[sorted[k]] as usize] += 1;
                let here = x[sorted[k]][feature];
                let next = x[sorted[k + 1]][feature];
                if here == next {
                    continue;
                }
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right = [total[0] - left[0], total[1] - left[1]];
                let impurity = (n_left as f64 * gini(&left) + n_right as f64 * gini(&right))
                    / n as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    best = Some(BestSplit {
                        feature,
                        threshold: midpoint(here, next),
                        impurity,
                    });
                }
            }
        }
        best
    }
}

fn validate_fit_input(x: &[Vec<f64>], y: &[u8], params: &TreeParams) -> LoanResult<()> {
    if x.is_empty() {
        return Err(LoanError::InsufficientData(
            "At least one training row is required.".into(),
        ));
    }
    if x.len() != y.len() {
        return Err(LoanError::InvalidInput {
            field: "y".into(),
            reason: format!("{} labels for {} rows", y.len(), x.len()),
        });
    }
    let width = x[0].len();
    if width == 0 || x.iter().any(|row| row.len() != width) {
        return Err(LoanError::InvalidInput {
            field: "x".into(),
            reason: "All rows must have the same non-zero number of features.".into(),
        });
    }
    if x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(LoanError::InvalidInput {
            field: "x".into(),
            reason: "Features must be finite.".into(),
        });
    }
    if y.iter().any(|&label| label as usize >= N_CLASSES) {
        return Err(LoanError::InvalidInput {
            field: "y".into(),
            reason: "Labels must be 0 or 1.".into(),
        });
    }
    if params.max_depth == 0 {
        return Err(LoanError::InvalidInput {
            field: "max_depth".into(),
            reason: "Must be at least 1.".into(),
        });
    }
    if params.min_samples_split < 2 {
        return Err(LoanError::InvalidInput {
            field: "min_samples_split".into(),
            reason: "Must be at least 2.".into(),
        });
    }
    Ok(())
}

fn class_counts(y: &[u8], indices: &[usize]) -> [u64; N_CLASSES] {
    let mut counts = [0u64; N_CLASSES];
    for &i in indices {
        counts[y[i] as usize] += 1;
    }
    counts
}

fn gini(counts: &[u64; N_CLASSES]) -> f64 {
    let total: u64 = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / t).powi(2)).sum::<f64>()
}

fn midpoint(a: f64, b: f64) -> f64 {
    let mid = a + (b - a) / 2.0;
    // Adjacent floats can round the midpoint up onto `b`.
    if mid >= b {
        a
    } else {
        mid
    }
}
