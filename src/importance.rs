//! Post-hoc interpretation of the winning model.
//!
//! The selected family is refit on the full design matrix and interrogated
//! two ways: grouped permutation importance (shuffle a predictor, measure
//! the error increase) and partial dependence (sweep a predictor over its
//! trimmed observed range, average the predictions). Both operate on
//! feature groups, so a one-hot block is shuffled or swept as a unit under
//! the original column's name.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::frame::{DesignMatrix, FeatureGroup, GroupKind};
use crate::math::Array2;
use crate::models::factory::build_model;
use crate::models::Classifier;
use crate::preprocessing::{fit_scaler, transform_all, Scaler};
use crate::trainer::TrainedModel;

/// One predictor's permutation-importance score, clamped at zero.
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceScore {
    pub predictor: String,
    pub score: f64,
}

/// A swept value: numeric for continuous predictors, a level name for
/// categorical ones.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PdValue {
    Number(f64),
    Level(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PartialDependencePoint {
    pub values: Vec<PdValue>,
    pub mean_probability: f64,
}

/// The marginal response of the final model along one or two predictors.
#[derive(Debug, Clone, Serialize)]
pub struct PartialDependence {
    pub predictors: Vec<String>,
    pub points: Vec<PartialDependencePoint>,
}

/// The winning family refit on the full design matrix, with the scaler it
/// was fit under.
pub struct FinalModel {
    model: Box<dyn Classifier>,
    scaler: Scaler,
}

impl FinalModel {
    /// Predictions for raw (unscaled) feature rows.
    fn predict_raw(&self, x_raw: &Array2<f64>) -> Vec<f64> {
        self.model.predict_proba(&transform_all(x_raw, &self.scaler))
    }
}

fn misclassification_rate(probs: &[f64], y: &[u8]) -> f64 {
    let wrong = probs
        .iter()
        .zip(y.iter())
        .filter(|(p, &label)| ((**p >= 0.5) as u8) != label)
        .count();
    wrong as f64 / y.len() as f64
}

/// One value assignment for every column of a group during a sweep.
struct SweepStep {
    value: PdValue,
    assignments: Vec<(usize, f64)>,
}

pub struct ImportanceAnalyzer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ImportanceAnalyzer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        ImportanceAnalyzer { config }
    }

    /// Refit the selected family and hyperparameters on the entire matrix.
    ///
    /// The refit uses its own scaler over all rows; the model is held only
    /// for interpretation and is never scored against held-out data.
    pub fn refit(
        &self,
        winner: &TrainedModel,
        dm: &DesignMatrix,
    ) -> Result<FinalModel, PipelineError> {
        let scaler = fit_scaler(&dm.x);
        let x = transform_all(&dm.x, &scaler);
        let mut model = build_model(winner.family, &winner.params, &dm.groups, self.config.seed);
        model.fit(&x, &dm.y)?;
        log::info!(
            "refit {} [{}] on all {} rows for interpretation",
            winner.family.name(),
            winner.params.label(),
            dm.x.nrows()
        );
        Ok(FinalModel { model, scaler })
    }

    /// Grouped permutation importance over every predictor.
    ///
    /// One shared row permutation is applied to all columns of a group per
    /// repeat, so a one-hot block stays internally consistent while it is
    /// decoupled from the outcome. Scores are mean error increases over the
    /// repeats, clamped at zero, sorted descending.
    pub fn permutation_importance(
        &self,
        final_model: &FinalModel,
        dm: &DesignMatrix,
    ) -> Vec<ImportanceScore> {
        let x_scaled = transform_all(&dm.x, &final_model.scaler);
        let base_error =
            misclassification_rate(&final_model.model.predict_proba(&x_scaled), &dm.y);
        let n = dm.x.nrows();

        let mut scores: Vec<ImportanceScore> = dm
            .groups
            .iter()
            .enumerate()
            .map(|(g, group)| {
                let mut rng =
                    StdRng::seed_from_u64(self.config.seed.wrapping_add(((g as u64) + 1) << 32));
                let mut total_increase = 0.0;
                for _ in 0..self.config.permutation_repeats {
                    let mut perm: Vec<usize> = (0..n).collect();
                    perm.shuffle(&mut rng);

                    let mut shuffled = x_scaled.clone();
                    for &col in &group.cols {
                        let values = x_scaled.column(col).select(&perm);
                        shuffled.set_column(col, values.as_slice());
                    }
                    let error = misclassification_rate(
                        &final_model.model.predict_proba(&shuffled),
                        &dm.y,
                    );
                    total_increase += error - base_error;
                }
                let score =
                    (total_increase / self.config.permutation_repeats as f64).max(0.0);
                log::debug!("permutation importance {}: {:.4}", group.name, score);
                ImportanceScore {
                    predictor: group.name.clone(),
                    score,
                }
            })
            .collect();

        scores.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scores
    }

    /// One-way partial dependence for a named predictor.
    pub fn partial_dependence(
        &self,
        final_model: &FinalModel,
        dm: &DesignMatrix,
        predictor: &str,
    ) -> Result<PartialDependence, PipelineError> {
        let group = self.group_by_name(dm, predictor)?;
        let points = self
            .sweep_steps(dm, group)
            .into_iter()
            .map(|step| {
                let mean = self.mean_response(final_model, dm, &step.assignments);
                PartialDependencePoint {
                    values: vec![step.value],
                    mean_probability: mean,
                }
            })
            .collect();
        Ok(PartialDependence {
            predictors: vec![predictor.to_string()],
            points,
        })
    }

    /// Two-way partial dependence over the cross product of two sweeps.
    pub fn partial_dependence_pair(
        &self,
        final_model: &FinalModel,
        dm: &DesignMatrix,
        first: &str,
        second: &str,
    ) -> Result<PartialDependence, PipelineError> {
        let group_a = self.group_by_name(dm, first)?;
        let group_b = self.group_by_name(dm, second)?;
        let steps_a = self.sweep_steps(dm, group_a);
        let steps_b = self.sweep_steps(dm, group_b);

        let mut points = Vec::with_capacity(steps_a.len() * steps_b.len());
        for a in &steps_a {
            for b in &steps_b {
                let mut assignments = a.assignments.clone();
                assignments.extend_from_slice(&b.assignments);
                let mean = self.mean_response(final_model, dm, &assignments);
                points.push(PartialDependencePoint {
                    values: vec![a.value.clone(), b.value.clone()],
                    mean_probability: mean,
                });
            }
        }
        Ok(PartialDependence {
            predictors: vec![first.to_string(), second.to_string()],
            points,
        })
    }

    fn group_by_name<'d>(
        &self,
        dm: &'d DesignMatrix,
        predictor: &str,
    ) -> Result<&'d FeatureGroup, PipelineError> {
        dm.groups.iter().find(|g| g.name == predictor).ok_or_else(|| {
            PipelineError::Schema(format!(
                "partial dependence requested for unknown predictor {}",
                predictor
            ))
        })
    }

    /// Fix a group's columns at the swept values in every row, then average
    /// the predictions over the otherwise-unchanged rows.
    fn mean_response(
        &self,
        final_model: &FinalModel,
        dm: &DesignMatrix,
        assignments: &[(usize, f64)],
    ) -> f64 {
        let n = dm.x.nrows();
        let mut x = dm.x.clone();
        for &(col, value) in assignments {
            x.set_column(col, &vec![value; n]);
        }
        let probs = final_model.predict_raw(&x);
        probs.iter().sum::<f64>() / n as f64
    }

    /// The swept values for one group: an evenly spaced grid over the
    /// percentile-trimmed observed range for a continuous predictor, or one
    /// step per level for a categorical block.
    fn sweep_steps(&self, dm: &DesignMatrix, group: &FeatureGroup) -> Vec<SweepStep> {
        match &group.kind {
            GroupKind::Continuous => {
                let col = group.cols[0];
                let mut observed = dm.x.column(col).to_vec();
                observed
                    .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let trim = self.config.pd_trim_pct / 100.0;
                let lo = trimmed_value(&observed, trim);
                let hi = trimmed_value(&observed, 1.0 - trim);
                let size = self.config.pd_grid_size.max(2);
                if hi <= lo {
                    return vec![SweepStep {
                        value: PdValue::Number(lo),
                        assignments: vec![(col, lo)],
                    }];
                }
                (0..size)
                    .map(|i| {
                        let v = lo + (hi - lo) * i as f64 / (size - 1) as f64;
                        SweepStep {
                            value: PdValue::Number(v),
                            assignments: vec![(col, v)],
                        }
                    })
                    .collect()
            }
            GroupKind::Categorical { levels } => levels
                .iter()
                .enumerate()
                .map(|(idx, level)| SweepStep {
                    value: PdValue::Level(level.clone()),
                    assignments: group
                        .cols
                        .iter()
                        .enumerate()
                        .map(|(j, &col)| (col, if j == idx { 1.0 } else { 0.0 }))
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Value at a fractional position of a sorted sample, linear interpolation.
fn trimmed_value(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelFamily;
    use crate::models::grid::HyperPoint;

    fn signal_and_noise() -> DesignMatrix {
        // Column 0 decides the label; column 1 cycles independently of it.
        let n = 80;
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..n {
            let signal = (i % 2) as f64;
            data.extend_from_slice(&[signal, (i % 7) as f64]);
            y.push(signal as u8);
        }
        DesignMatrix {
            x: Array2::from_shape_vec((n, 2), data).unwrap(),
            y,
            feature_names: vec!["signal".into(), "noise".into()],
            groups: vec![
                FeatureGroup {
                    name: "signal".into(),
                    cols: vec![0],
                    kind: GroupKind::Continuous,
                },
                FeatureGroup {
                    name: "noise".into(),
                    cols: vec![1],
                    kind: GroupKind::Continuous,
                },
            ],
        }
    }

    fn logistic_winner() -> TrainedModel {
        TrainedModel {
            family: ModelFamily::Logistic,
            params: HyperPoint::Logistic,
            fold_accuracies: vec![1.0; 5],
            mean_accuracy: 1.0,
        }
    }

    #[test]
    fn signal_outranks_noise_and_scores_are_non_negative() {
        let dm = signal_and_noise();
        let config = PipelineConfig::default();
        let analyzer = ImportanceAnalyzer::new(&config);
        let final_model = analyzer.refit(&logistic_winner(), &dm).unwrap();

        let scores = analyzer.permutation_importance(&final_model, &dm);
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|s| s.score >= 0.0));
        assert_eq!(scores[0].predictor, "signal");
        assert!(scores[0].score > scores[1].score);
    }

    #[test]
    fn importance_is_deterministic_for_a_fixed_seed() {
        let dm = signal_and_noise();
        let config = PipelineConfig::default();
        let analyzer = ImportanceAnalyzer::new(&config);
        let final_model = analyzer.refit(&logistic_winner(), &dm).unwrap();

        let a = analyzer.permutation_importance(&final_model, &dm);
        let b = analyzer.permutation_importance(&final_model, &dm);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.predictor, y.predictor);
            assert_eq!(x.score, y.score);
        }
    }

    #[test]
    fn continuous_sweep_is_monotone_for_a_positive_effect() {
        let dm = signal_and_noise();
        let config = PipelineConfig::default();
        let analyzer = ImportanceAnalyzer::new(&config);
        let final_model = analyzer.refit(&logistic_winner(), &dm).unwrap();

        let pd = analyzer
            .partial_dependence(&final_model, &dm, "signal")
            .unwrap();
        assert_eq!(pd.points.len(), config.pd_grid_size);
        let first = pd.points.first().unwrap().mean_probability;
        let last = pd.points.last().unwrap().mean_probability;
        assert!(last > first, "expected rising curve: {} -> {}", first, last);
    }

    #[test]
    fn categorical_sweep_yields_one_point_per_level() {
        let n = 40;
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..n {
            let female = (i % 2) as f64;
            data.extend_from_slice(&[female, 1.0 - female]);
            y.push(female as u8);
        }
        let dm = DesignMatrix {
            x: Array2::from_shape_vec((n, 2), data).unwrap(),
            y,
            feature_names: vec!["sex=female".into(), "sex=male".into()],
            groups: vec![FeatureGroup {
                name: "sex".into(),
                cols: vec![0, 1],
                kind: GroupKind::Categorical {
                    levels: vec!["female".into(), "male".into()],
                },
            }],
        };
        let config = PipelineConfig::default();
        let analyzer = ImportanceAnalyzer::new(&config);
        let final_model = analyzer.refit(&logistic_winner(), &dm).unwrap();

        let pd = analyzer.partial_dependence(&final_model, &dm, "sex").unwrap();
        assert_eq!(pd.points.len(), 2);
        let female = pd.points[0].mean_probability;
        let male = pd.points[1].mean_probability;
        assert!(female > male);
    }

    #[test]
    fn unknown_predictor_is_a_schema_error() {
        let dm = signal_and_noise();
        let config = PipelineConfig::default();
        let analyzer = ImportanceAnalyzer::new(&config);
        let final_model = analyzer.refit(&logistic_winner(), &dm).unwrap();
        assert!(matches!(
            analyzer.partial_dependence(&final_model, &dm, "cabin"),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn two_way_sweep_crosses_both_grids() {
        let dm = signal_and_noise();
        let config = PipelineConfig::default();
        let analyzer = ImportanceAnalyzer::new(&config);
        let final_model = analyzer.refit(&logistic_winner(), &dm).unwrap();

        let pd = analyzer
            .partial_dependence_pair(&final_model, &dm, "signal", "noise")
            .unwrap();
        assert_eq!(
            pd.points.len(),
            config.pd_grid_size * config.pd_grid_size
        );
        assert!(pd.points.iter().all(|p| p.values.len() == 2));
    }
}
