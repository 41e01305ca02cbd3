//! Ranked comparison of the trained families.
//!
//! Each family's fold-accuracy vector is summarized and the panel is ordered
//! by descending mean accuracy. Because all vectors are aligned on the same
//! folds, the top model is compared against the baseline with a paired
//! t-test on the per-fold differences.
use serde::Serialize;

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::config::ModelFamily;
use crate::math::Array1;
use crate::trainer::TrainedModel;

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub model_name: String,
    pub params: String,
    pub mean_accuracy: f64,
    pub std_accuracy: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Paired fold-aligned comparison between the top model and the baseline.
#[derive(Debug, Clone, Serialize)]
pub struct BaselineComparison {
    pub top_model: String,
    pub mean_difference: f64,
    pub t_statistic: f64,
    pub p_value: f64,
    pub alpha: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub rows: Vec<LeaderboardRow>,
    pub comparison: Option<BaselineComparison>,
}

impl Leaderboard {
    /// Name of the top-ranked family.
    pub fn winner(&self) -> &str {
        &self.rows[0].model_name
    }
}

/// Linear-interpolation quantile of a sorted sample.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

fn summarize(model: &TrainedModel) -> LeaderboardRow {
    let mut sorted = model.fold_accuracies.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let accuracies = Array1::from_vec(sorted.clone());
    let mean = accuracies.mean().unwrap_or(0.0);
    let std = accuracies.std_dev();
    LeaderboardRow {
        model_name: model.family.name().to_string(),
        params: model.params.label(),
        mean_accuracy: mean,
        std_accuracy: std,
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

/// Two-sided paired t-test on fold-aligned accuracy differences.
///
/// Zero variance in the differences reports p = 1.0 (indistinguishable)
/// rather than a NaN statistic.
pub fn paired_t_test(a: &[f64], b: &[f64]) -> (f64, f64) {
    assert_eq!(a.len(), b.len(), "paired test requires aligned vectors");
    let k = a.len();
    let diffs: Vec<f64> = a.iter().zip(b.iter()).map(|(x, y)| x - y).collect();
    let mean = diffs.iter().sum::<f64>() / k as f64;
    let var = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / (k - 1) as f64;
    if var <= 1e-18 {
        return (0.0, 1.0);
    }
    let t = mean / (var / k as f64).sqrt();
    let dist = StudentsT::new(0.0, 1.0, (k - 1) as f64).expect("t distribution");
    let p = 2.0 * (1.0 - dist.cdf(t.abs()));
    (t, p)
}

pub struct LeaderboardBuilder;

impl LeaderboardBuilder {
    /// Order the panel by descending mean accuracy and attach the paired
    /// baseline comparison when a baseline row is present.
    pub fn build(models: &[TrainedModel], alpha: f64) -> Leaderboard {
        assert!(!models.is_empty(), "leaderboard requires at least one model");
        let mut order: Vec<usize> = (0..models.len()).collect();
        order.sort_by(|&a, &b| {
            models[b]
                .mean_accuracy
                .partial_cmp(&models[a].mean_accuracy)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let rows: Vec<LeaderboardRow> = order.iter().map(|&i| summarize(&models[i])).collect();

        let baseline = models
            .iter()
            .find(|m| m.family == ModelFamily::Baseline);
        let comparison = baseline.map(|base| {
            let top = &models[order[0]];
            let (t_statistic, p_value) =
                paired_t_test(&top.fold_accuracies, &base.fold_accuracies);
            let comparison = BaselineComparison {
                top_model: top.family.name().to_string(),
                mean_difference: top.mean_accuracy - base.mean_accuracy,
                t_statistic,
                p_value,
                alpha,
                significant: p_value < alpha,
            };
            log::info!(
                "top model {} vs baseline: mean diff {:+.4}, t = {:.3}, p = {:.4} ({})",
                comparison.top_model,
                comparison.mean_difference,
                t_statistic,
                p_value,
                if comparison.significant {
                    "significant"
                } else {
                    "not significant"
                }
            );
            comparison
        });

        Leaderboard { rows, comparison }
    }
}
