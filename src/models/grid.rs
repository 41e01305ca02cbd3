//! Hyperparameter surfaces for each model family.
//!
//! Grids are enumerated simplest-first (heavier regularization, smoother
//! neighborhoods, shallower and fewer trees first). The trainer keeps the
//! earliest grid point on a mean-accuracy tie, so ties always resolve to
//! the simplest model in the family.
use serde::Serialize;

/// One point of a family's hyperparameter surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum HyperPoint {
    Baseline,
    Logistic,
    /// Shared by lasso (`l1_ratio` 1), ridge (0) and elastic net (grid).
    Penalized { l1_ratio: f64, lambda: f64 },
    Lda,
    Knn { k: usize },
    Cart { cp: f64, max_depth: usize },
    Conditional { alpha: f64, max_depth: usize },
    Forest {
        n_trees: usize,
        mtry: usize,
        min_leaf: usize,
    },
    Boost {
        n_trees: usize,
        depth: usize,
        learning_rate: f64,
    },
}

impl HyperPoint {
    /// Human-readable form for the leaderboard and logs.
    pub fn label(&self) -> String {
        match self {
            HyperPoint::Baseline => "single-rule".to_string(),
            HyperPoint::Logistic => "unregularized".to_string(),
            HyperPoint::Penalized { l1_ratio, lambda } => {
                format!("l1_ratio={}, lambda={}", l1_ratio, lambda)
            }
            HyperPoint::Lda => "pooled-covariance".to_string(),
            HyperPoint::Knn { k } => format!("k={}", k),
            HyperPoint::Cart { cp, max_depth } => {
                format!("cp={}, max_depth={}", cp, max_depth)
            }
            HyperPoint::Conditional { alpha, max_depth } => {
                format!("alpha={}, max_depth={}", alpha, max_depth)
            }
            HyperPoint::Forest {
                n_trees,
                mtry,
                min_leaf,
            } => format!("n_trees={}, mtry={}, min_leaf={}", n_trees, mtry, min_leaf),
            HyperPoint::Boost {
                n_trees,
                depth,
                learning_rate,
            } => format!(
                "n_trees={}, depth={}, learning_rate={}",
                n_trees, depth, learning_rate
            ),
        }
    }
}

const LAMBDA_GRID: [f64; 6] = [0.3, 0.1, 0.03, 0.01, 0.003, 0.001];

/// Lambda grid shared by the lasso and ridge families, strongest first.
pub fn penalized_grid(l1_ratio: f64) -> Vec<HyperPoint> {
    LAMBDA_GRID
        .iter()
        .map(|&lambda| HyperPoint::Penalized { l1_ratio, lambda })
        .collect()
}

/// Mixing-parameter x lambda grid for the elastic net.
pub fn elastic_net_grid() -> Vec<HyperPoint> {
    let mut grid = Vec::new();
    for &l1_ratio in &[0.25, 0.5, 0.75] {
        for &lambda in &LAMBDA_GRID {
            grid.push(HyperPoint::Penalized { l1_ratio, lambda });
        }
    }
    grid
}

/// Neighbor counts, smoothest (largest k) first.
pub fn knn_grid() -> Vec<HyperPoint> {
    [25, 21, 17, 13, 9, 7, 5, 3, 1]
        .iter()
        .map(|&k| HyperPoint::Knn { k })
        .collect()
}

/// Cost-complexity penalties, heaviest pruning first.
pub fn cart_grid() -> Vec<HyperPoint> {
    [0.1, 0.03, 0.01, 0.003, 0.001, 0.0]
        .iter()
        .map(|&cp| HyperPoint::Cart { cp, max_depth: 8 })
        .collect()
}

/// Split-test significance levels, strictest (smallest tree) first.
pub fn conditional_grid() -> Vec<HyperPoint> {
    [0.01, 0.05, 0.1, 0.25]
        .iter()
        .map(|&alpha| HyperPoint::Conditional {
            alpha,
            max_depth: 8,
        })
        .collect()
}

/// Candidate-feature-count x minimum-leaf-size grid.
pub fn forest_grid(n_features: usize) -> Vec<HyperPoint> {
    let sqrt_p = ((n_features as f64).sqrt().round() as usize).max(1);
    let third_p = (n_features / 3).max(1);
    let half_p = (n_features / 2).max(1);
    let mut mtrys = vec![sqrt_p, third_p, half_p];
    mtrys.sort_unstable();
    mtrys.dedup();

    let mut grid = Vec::new();
    for &min_leaf in &[10, 5, 1] {
        for &mtry in &mtrys {
            grid.push(HyperPoint::Forest {
                n_trees: 40,
                mtry,
                min_leaf,
            });
        }
    }
    grid
}

/// Tree count x depth x learning-rate grid, smallest ensembles first.
pub fn boost_grid() -> Vec<HyperPoint> {
    let mut grid = Vec::new();
    for &n_trees in &[30usize, 60] {
        for &depth in &[1usize, 2, 3] {
            for &learning_rate in &[0.05f64, 0.1] {
                grid.push(HyperPoint::Boost {
                    n_trees,
                    depth,
                    learning_rate,
                });
            }
        }
    }
    grid
}
