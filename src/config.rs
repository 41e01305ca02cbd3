use serde::{Deserialize, Serialize};

/// Central configuration for the preparation and comparison pipeline.
///
/// Every stochastic step derives its generator from `seed`, so two runs with
/// the same configuration and input produce identical folds, fits, and
/// leaderboards.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PipelineConfig {
    /// Seed threaded through fold planning and every stochastic fit.
    pub seed: u64,
    /// Number of cross-validation folds shared by all model families.
    pub n_folds: usize,
    /// Minimum observed-age rows required to fit the age regression;
    /// below this the imputer falls back to the observed median.
    pub min_age_obs: usize,
    /// Minimum support for a categorical level before it is collapsed
    /// into the catch-all level.
    pub min_level_support: usize,
    /// Near-zero-variance test: top/second level frequency ratio bound.
    pub nzv_freq_ratio: f64,
    /// Near-zero-variance test: percent-unique bound.
    pub nzv_unique_pct: f64,
    /// Significance level for the baseline comparison.
    pub alpha: f64,
    /// Shuffle repeats per predictor for permutation importance.
    pub permutation_repeats: usize,
    /// Percentile trimmed from each tail of a partial-dependence sweep.
    pub pd_trim_pct: f64,
    /// Grid points per partial-dependence sweep of a continuous predictor.
    pub pd_grid_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_folds: 5,
            min_age_obs: 50,
            min_level_support: 25,
            nzv_freq_ratio: 19.0,
            nzv_unique_pct: 10.0,
            alpha: 0.05,
            permutation_repeats: 8,
            pd_trim_pct: 2.5,
            pd_grid_size: 20,
        }
    }
}

/// The model families entered into the comparison.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Baseline,
    Logistic,
    Lasso,
    Ridge,
    ElasticNet,
    Lda,
    Knn,
    TreeCart,
    TreeConditional,
    Forest,
    Boost,
}

impl ModelFamily {
    /// All families, in the order they are trained and reported.
    pub fn all() -> &'static [ModelFamily] {
        &[
            ModelFamily::Baseline,
            ModelFamily::Logistic,
            ModelFamily::Lasso,
            ModelFamily::Ridge,
            ModelFamily::ElasticNet,
            ModelFamily::Lda,
            ModelFamily::Knn,
            ModelFamily::TreeCart,
            ModelFamily::TreeConditional,
            ModelFamily::Forest,
            ModelFamily::Boost,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::Baseline => "baseline",
            ModelFamily::Logistic => "logistic",
            ModelFamily::Lasso => "lasso",
            ModelFamily::Ridge => "ridge",
            ModelFamily::ElasticNet => "elastic_net",
            ModelFamily::Lda => "lda",
            ModelFamily::Knn => "knn",
            ModelFamily::TreeCart => "tree_cart",
            ModelFamily::TreeConditional => "tree_conditional",
            ModelFamily::Forest => "forest",
            ModelFamily::Boost => "boost",
        }
    }
}
