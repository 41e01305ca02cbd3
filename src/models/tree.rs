//! Decision trees: the single-tree families and the building blocks reused
//! by the forest and boosting ensembles.
//!
//! `ClassificationTree` grows greedy gini splits; whether a candidate split
//! is accepted is decided by a pluggable gate: a cost-complexity penalty
//! (CART pruning) or a chi-square association test (conditional-inference
//! splitting). `RegressionTree` fits weighted residual targets for the
//! boosted ensemble.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::PipelineError;
use crate::math::Array2;
use crate::models::Classifier;

/// Split acceptance rule.
#[derive(Debug, Clone, Copy)]
pub enum SplitGate {
    /// Keep a split only if its impurity decrease, relative to the root
    /// risk, exceeds `cp`.
    CostComplexity { cp: f64 },
    /// Keep a split only if the chi-square test of the split/outcome table
    /// is significant at `alpha`.
    ChiSquare { alpha: f64 },
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { value: f64 },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, x: &Array2<f64>, row: usize) -> f64 {
        match self {
            Node::Leaf { value } => *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[(row, *feature)] <= *threshold {
                    left.predict(x, row)
                } else {
                    right.predict(x, row)
                }
            }
        }
    }
}

fn gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    left: Vec<usize>,
    right: Vec<usize>,
    impurity_decrease: f64,
}

/// Greedy gini split search over the candidate features.
fn best_gini_split(
    x: &Array2<f64>,
    y: &[u8],
    indices: &[usize],
    candidates: &[usize],
    min_leaf: usize,
) -> Option<BestSplit> {
    let n = indices.len();
    let pos_total: usize = indices.iter().filter(|&&i| y[i] == 1).count();
    let parent_impurity = gini(pos_total, n);
    let mut best: Option<BestSplit> = None;

    for &feature in candidates {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[(a, feature)]
                .partial_cmp(&x[(b, feature)])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut pos_left = 0usize;
        for cut in 1..n {
            if y[order[cut - 1]] == 1 {
                pos_left += 1;
            }
            let lo = x[(order[cut - 1], feature)];
            let hi = x[(order[cut], feature)];
            if lo == hi || cut < min_leaf || n - cut < min_leaf {
                continue;
            }
            let n_left = cut;
            let n_right = n - cut;
            let weighted = (n_left as f64 * gini(pos_left, n_left)
                + n_right as f64 * gini(pos_total - pos_left, n_right))
                / n as f64;
            let decrease = parent_impurity - weighted;
            if best
                .as_ref()
                .map(|b| decrease > b.impurity_decrease)
                .unwrap_or(decrease > 0.0)
            {
                best = Some(BestSplit {
                    feature,
                    threshold: (lo + hi) / 2.0,
                    left: order[..cut].to_vec(),
                    right: order[cut..].to_vec(),
                    impurity_decrease: decrease,
                });
            }
        }
    }
    best
}

/// Two-sided chi-square p-value for the 2x2 split/outcome table.
fn split_p_value(y: &[u8], left: &[usize], right: &[usize]) -> f64 {
    let a = left.iter().filter(|&&i| y[i] == 1).count() as f64;
    let b = left.len() as f64 - a;
    let c = right.iter().filter(|&&i| y[i] == 1).count() as f64;
    let d = right.len() as f64 - c;
    let n = a + b + c + d;

    let row1 = a + b;
    let row2 = c + d;
    let col1 = a + c;
    let col2 = b + d;
    if row1 == 0.0 || row2 == 0.0 || col1 == 0.0 || col2 == 0.0 {
        return 1.0;
    }
    let statistic = n * (a * d - b * c).powi(2) / (row1 * row2 * col1 * col2);
    let dist = ChiSquared::new(1.0).expect("chi-square with 1 dof");
    1.0 - dist.cdf(statistic)
}

pub struct TreeParams {
    pub max_depth: usize,
    pub min_leaf: usize,
    pub gate: SplitGate,
}

pub struct ClassificationTree {
    params: TreeParams,
    root: Option<Node>,
    name: &'static str,
}

impl ClassificationTree {
    pub fn cart(cp: f64, max_depth: usize) -> Self {
        ClassificationTree {
            params: TreeParams {
                max_depth,
                min_leaf: 5,
                gate: SplitGate::CostComplexity { cp },
            },
            root: None,
            name: "tree_cart",
        }
    }

    pub fn conditional(alpha: f64, max_depth: usize) -> Self {
        ClassificationTree {
            params: TreeParams {
                max_depth,
                min_leaf: 5,
                gate: SplitGate::ChiSquare { alpha },
            },
            root: None,
            name: "tree_conditional",
        }
    }

    pub fn set_min_leaf(&mut self, min_leaf: usize) {
        self.params.min_leaf = min_leaf.max(1);
    }

    /// Grow on a row subset with optional per-split feature subsampling;
    /// this is the entry point the forest uses for its bootstrap replicas.
    pub fn fit_subset(
        &mut self,
        x: &Array2<f64>,
        y: &[u8],
        indices: &[usize],
        mtry: Option<usize>,
        rng: Option<&mut StdRng>,
    ) -> Result<(), PipelineError> {
        if indices.is_empty() {
            return Err(PipelineError::FitFailure {
                family: self.name.into(),
                detail: "empty training subset".into(),
            });
        }
        let pos_total = indices.iter().filter(|&&i| y[i] == 1).count();
        let root_risk = gini(pos_total, indices.len()).max(1e-12);
        let mut grower = Grower {
            x,
            y,
            params: &self.params,
            root_risk,
            n_total: indices.len(),
            mtry,
            rng,
        };
        self.root = Some(grower.grow(indices, 0));
        Ok(())
    }

    fn leaf_value(y: &[u8], indices: &[usize]) -> f64 {
        let pos = indices.iter().filter(|&&i| y[i] == 1).count();
        pos as f64 / indices.len() as f64
    }
}

struct Grower<'a> {
    x: &'a Array2<f64>,
    y: &'a [u8],
    params: &'a TreeParams,
    root_risk: f64,
    n_total: usize,
    mtry: Option<usize>,
    rng: Option<&'a mut StdRng>,
}

impl<'a> Grower<'a> {
    fn grow(&mut self, indices: &[usize], depth: usize) -> Node {
        let leaf = Node::Leaf {
            value: ClassificationTree::leaf_value(self.y, indices),
        };
        if depth >= self.params.max_depth || indices.len() < 2 * self.params.min_leaf {
            return leaf;
        }

        let all: Vec<usize> = (0..self.x.ncols()).collect();
        let candidates = match (self.mtry, self.rng.as_deref_mut()) {
            (Some(m), Some(rng)) => {
                let mut picked = all;
                picked.shuffle(rng);
                picked.truncate(m.min(self.x.ncols()));
                picked
            }
            _ => all,
        };

        let split = match best_gini_split(
            self.x,
            self.y,
            indices,
            &candidates,
            self.params.min_leaf,
        ) {
            Some(s) => s,
            None => return leaf,
        };

        let accepted = match self.params.gate {
            SplitGate::CostComplexity { cp } => {
                let relative_gain = split.impurity_decrease * indices.len() as f64
                    / (self.root_risk * self.n_total as f64);
                relative_gain > cp
            }
            SplitGate::ChiSquare { alpha } => {
                split_p_value(self.y, &split.left, &split.right) <= alpha
            }
        };
        if !accepted {
            return leaf;
        }

        Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.grow(&split.left, depth + 1)),
            right: Box::new(self.grow(&split.right, depth + 1)),
        }
    }
}

impl Classifier for ClassificationTree {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError> {
        if x.nrows() != y.len() {
            return Err(PipelineError::Shape(format!(
                "tree fit: {} rows vs {} labels",
                x.nrows(),
                y.len()
            )));
        }
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_subset(x, y, &indices, None, None)
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64> {
        let root = self.root.as_ref().expect("predict before fit");
        (0..x.nrows()).map(|row| root.predict(x, row)).collect()
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Weighted regression tree on residual targets, used by the boosted
/// ensemble. Splits minimize squared error; leaf values are the Newton step
/// `sum(residual) / sum(weight)`.
pub struct RegressionTree {
    max_depth: usize,
    min_leaf: usize,
    root: Option<Node>,
}

impl RegressionTree {
    pub fn new(max_depth: usize, min_leaf: usize) -> Self {
        RegressionTree {
            max_depth,
            min_leaf,
            root: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, residuals: &[f64], weights: &[f64]) {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.grow(x, residuals, weights, &indices, 0));
    }

    fn leaf_value(residuals: &[f64], weights: &[f64], indices: &[usize]) -> f64 {
        let num: f64 = indices.iter().map(|&i| residuals[i]).sum();
        let den: f64 = indices.iter().map(|&i| weights[i]).sum();
        num / den.max(1e-12)
    }

    fn grow(
        &self,
        x: &Array2<f64>,
        residuals: &[f64],
        weights: &[f64],
        indices: &[usize],
        depth: usize,
    ) -> Node {
        let leaf = Node::Leaf {
            value: Self::leaf_value(residuals, weights, indices),
        };
        if depth >= self.max_depth || indices.len() < 2 * self.min_leaf {
            return leaf;
        }

        let n = indices.len();
        let sum_total: f64 = indices.iter().map(|&i| residuals[i]).sum();
        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> = None;

        for feature in 0..x.ncols() {
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[(a, feature)]
                    .partial_cmp(&x[(b, feature)])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut sum_left = 0.0f64;
            for cut in 1..n {
                sum_left += residuals[order[cut - 1]];
                let lo = x[(order[cut - 1], feature)];
                let hi = x[(order[cut], feature)];
                if lo == hi || cut < self.min_leaf || n - cut < self.min_leaf {
                    continue;
                }
                // Variance reduction is equivalent to maximizing this score.
                let sum_right = sum_total - sum_left;
                let score = sum_left * sum_left / cut as f64
                    + sum_right * sum_right / (n - cut) as f64;
                if best.as_ref().map(|b| score > b.4).unwrap_or(true) {
                    best = Some((
                        feature,
                        (lo + hi) / 2.0,
                        order[..cut].to_vec(),
                        order[cut..].to_vec(),
                        score,
                    ));
                }
            }
        }

        match best {
            Some((feature, threshold, left, right, score)) => {
                let parent_score = sum_total * sum_total / n as f64;
                if score - parent_score <= 1e-12 {
                    return leaf;
                }
                Node::Split {
                    feature,
                    threshold,
                    left: Box::new(self.grow(x, residuals, weights, &left, depth + 1)),
                    right: Box::new(self.grow(x, residuals, weights, &right, depth + 1)),
                }
            }
            None => leaf,
        }
    }

    pub fn predict_row(&self, x: &Array2<f64>, row: usize) -> f64 {
        self.root
            .as_ref()
            .expect("predict before fit")
            .predict(x, row)
    }
}
