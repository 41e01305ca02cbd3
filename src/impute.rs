//! Deterministic missing-value handling.
//!
//! Categorical gaps (cabin, destination) become an explicit sentinel level,
//! keeping "unknown" as an informative category instead of dropping rows.
//! Fare takes the global observed median, embarkation the most frequent
//! observed level. Age is imputed by a secondary linear regression fit on
//! rows where age is observed; if too few rows are observed the imputer
//! falls back to the observed median and says so.
use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::config::PipelineConfig;
use crate::derive::{parse_title, CABIN_SENTINEL};
use crate::error::PipelineError;
use crate::frame::{ImputedRecord, Record, Sex};
use crate::math::{solve_linear_system, Array2};

/// Sentinel level for an absent destination field.
pub const DEST_SENTINEL: &str = "Missing";

pub struct Imputer<'a> {
    config: &'a PipelineConfig,
}

/// Output of the imputation stage: the completed records plus any recovered
/// conditions worth surfacing to the caller.
pub struct ImputeOutcome {
    pub records: Vec<ImputedRecord>,
    pub warnings: Vec<String>,
}

impl<'a> Imputer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Imputer { config }
    }

    /// Fill every modeling input. The returned records are independently
    /// owned; the age-regression model is discarded after use.
    pub fn impute(&self, records: &[Record]) -> Result<ImputeOutcome, PipelineError> {
        let mut warnings = Vec::new();

        let fare_fill = median(
            records
                .iter()
                .filter_map(|r| r.raw.fare)
                .collect::<Vec<_>>(),
        )
        .ok_or_else(|| PipelineError::Schema("no observed fare values".into()))?;

        let embarked_fill = mode(records.iter().filter_map(|r| r.raw.embarked.as_deref()))
            .ok_or_else(|| PipelineError::Schema("no observed embarkation values".into()))?;

        // Titles feed the age regression, so malformed names surface here.
        let mut titles = Vec::with_capacity(records.len());
        for r in records {
            titles.push(parse_title(&r.raw.name, r.row_id)?);
        }

        let age_by_row = self.impute_ages(records, &titles, fare_fill, &embarked_fill, &mut warnings)?;

        let out = records
            .iter()
            .map(|r| {
                let age = r
                    .raw
                    .age
                    .unwrap_or_else(|| age_by_row[&r.row_id]);
                ImputedRecord {
                    row_id: r.row_id,
                    pclass: r.raw.pclass,
                    name: r.raw.name.clone(),
                    sex: r.raw.sex,
                    age,
                    sibsp: r.raw.sibsp,
                    parch: r.raw.parch,
                    fare: r.raw.fare.unwrap_or(fare_fill),
                    cabin: r
                        .raw
                        .cabin
                        .clone()
                        .unwrap_or_else(|| CABIN_SENTINEL.to_string()),
                    embarked: r
                        .raw
                        .embarked
                        .clone()
                        .unwrap_or_else(|| embarked_fill.clone()),
                    home_dest: r
                        .raw
                        .home_dest
                        .clone()
                        .unwrap_or_else(|| DEST_SENTINEL.to_string()),
                    survived: r.raw.survived,
                }
            })
            .collect();

        Ok(ImputeOutcome {
            records: out,
            warnings,
        })
    }

    /// Predicted (or fallback) age for every row with a missing age, keyed
    /// by row id so the merge never relies on positional order.
    fn impute_ages(
        &self,
        records: &[Record],
        titles: &[String],
        fare_fill: f64,
        embarked_fill: &str,
        warnings: &mut Vec<String>,
    ) -> Result<HashMap<u32, f64>, PipelineError> {
        let observed: Vec<usize> = (0..records.len())
            .filter(|&i| records[i].raw.age.is_some())
            .collect();
        let missing: Vec<usize> = (0..records.len())
            .filter(|&i| records[i].raw.age.is_none())
            .collect();

        if missing.is_empty() {
            return Ok(HashMap::new());
        }

        let observed_ages: Vec<f64> = observed
            .iter()
            .map(|&i| records[i].raw.age.unwrap_or_default())
            .collect();
        let age_median = median(observed_ages.clone())
            .ok_or_else(|| PipelineError::Schema("no observed age values".into()))?;

        if observed.len() < self.config.min_age_obs {
            let msg = format!(
                "age imputation fallback: only {} rows with observed age (minimum {}); using median {:.1}",
                observed.len(),
                self.config.min_age_obs,
                age_median
            );
            log::warn!("{}", msg);
            warnings.push(msg);
            return Ok(missing
                .iter()
                .map(|&i| (records[i].row_id, age_median))
                .collect());
        }

        let embarked_levels = sorted_levels(
            records
                .iter()
                .map(|r| r.raw.embarked.as_deref().unwrap_or(embarked_fill)),
        );
        let design_row = |i: usize| -> Vec<f64> {
            age_design_row(
                &records[i].raw.sex,
                records[i].raw.sibsp + records[i].raw.parch + 1,
                records[i].raw.fare.unwrap_or(fare_fill),
                records[i].raw.embarked.as_deref().unwrap_or(embarked_fill),
                &titles[i],
                records[i].raw.pclass,
                &embarked_levels,
            )
        };

        let x_obs: Vec<Vec<f64>> = observed.iter().map(|&i| design_row(i)).collect();

        // Diagnostic only: 3-fold CV RMSE of the age regression.
        self.log_cv_diagnostic(&x_obs, &observed_ages);

        let coef = match fit_ols(&x_obs, &observed_ages) {
            Some(coef) => coef,
            None => {
                let msg = format!(
                    "age imputation fallback: regression system singular; using median {:.1}",
                    age_median
                );
                log::warn!("{}", msg);
                warnings.push(msg);
                return Ok(missing
                    .iter()
                    .map(|&i| (records[i].row_id, age_median))
                    .collect());
            }
        };

        let (lo, hi) = observed_ages.iter().fold((f64::MAX, f64::MIN), |(lo, hi), &a| {
            (lo.min(a), hi.max(a))
        });

        let preds: HashMap<u32, f64> = missing
            .iter()
            .map(|&i| {
                let row = design_row(i);
                // Predictions clamped to the observed age range.
                let pred = dot(&coef, &row).clamp(lo, hi);
                (records[i].row_id, pred)
            })
            .collect();

        log::info!(
            "imputed age for {} of {} rows via regression on {} observed rows",
            preds.len(),
            records.len(),
            observed.len()
        );
        Ok(preds)
    }

    fn log_cv_diagnostic(&self, x: &[Vec<f64>], y: &[f64]) {
        let k = 3;
        let mut indices: Vec<usize> = (0..x.len()).collect();
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        indices.shuffle(&mut rng);

        let mut rmses = Vec::with_capacity(k);
        for fold in 0..k {
            let test: Vec<usize> = indices
                .iter()
                .enumerate()
                .filter(|(pos, _)| pos % k == fold)
                .map(|(_, &i)| i)
                .collect();
            let train: Vec<usize> = indices
                .iter()
                .enumerate()
                .filter(|(pos, _)| pos % k != fold)
                .map(|(_, &i)| i)
                .collect();

            let x_train: Vec<Vec<f64>> = train.iter().map(|&i| x[i].clone()).collect();
            let y_train: Vec<f64> = train.iter().map(|&i| y[i]).collect();
            if let Some(coef) = fit_ols(&x_train, &y_train) {
                let sse: f64 = test
                    .iter()
                    .map(|&i| (dot(&coef, &x[i]) - y[i]).powi(2))
                    .sum();
                rmses.push((sse / test.len() as f64).sqrt());
            }
        }
        if !rmses.is_empty() {
            log::debug!(
                "age regression {}-fold CV RMSE: {:.2}",
                rmses.len(),
                rmses.iter().sum::<f64>() / rmses.len() as f64
            );
        }
    }
}

/// One design row for the age regression: intercept, family size, sex,
/// fare, embarkation dummies, collapsed title dummies, class dummies.
fn age_design_row(
    sex: &Sex,
    family_size: u32,
    fare: f64,
    embarked: &str,
    title: &str,
    pclass: u8,
    embarked_levels: &[String],
) -> Vec<f64> {
    let mut row = vec![1.0, family_size as f64, (*sex == Sex::Female) as u8 as f64, fare];
    // Reference level is the first; remaining levels get indicators.
    for level in embarked_levels.iter().skip(1) {
        row.push((embarked == level) as u8 as f64);
    }
    let collapsed = match title {
        "Mr" | "Mrs" | "Miss" | "Master" => title,
        _ => "Other",
    };
    for level in ["Master", "Miss", "Mrs", "Other"] {
        row.push((collapsed == level) as u8 as f64);
    }
    for level in [2u8, 3u8] {
        row.push((pclass == level) as u8 as f64);
    }
    row
}

/// Ordinary least squares via the normal equations with a small ridge term
/// on the diagonal to keep near-collinear dummies solvable.
fn fit_ols(x: &[Vec<f64>], y: &[f64]) -> Option<Vec<f64>> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    let p = x[0].len();
    let mut xtx = Array2::zeros(p, p);
    let mut xty = vec![0.0f64; p];
    for (row, &target) in x.iter().zip(y.iter()) {
        for a in 0..p {
            for b in 0..p {
                xtx[(a, b)] += row[a] * row[b];
            }
            xty[a] += row[a] * target;
        }
    }
    for d in 0..p {
        xtx[(d, d)] += 1e-8;
    }
    solve_linear_system(&xtx, &xty)
}

fn dot(coef: &[f64], row: &[f64]) -> f64 {
    coef.iter().zip(row.iter()).map(|(c, v)| c * v).sum()
}

fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

fn mode<'a>(values: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(a.0)))
        .map(|(v, _)| v.to_string())
}

fn sorted_levels<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut levels: Vec<String> = {
        let mut seen: HashMap<&str, ()> = HashMap::new();
        for v in values {
            seen.entry(v).or_insert(());
        }
        seen.keys().map(|k| k.to_string()).collect()
    };
    levels.sort();
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_even_and_odd() {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(vec![]), None);
    }

    #[test]
    fn mode_breaks_ties_deterministically() {
        let m = mode(["S", "C", "S", "C"].into_iter()).unwrap();
        // Equal counts resolve to the lexicographically smaller level.
        assert_eq!(m, "C");
    }

    #[test]
    fn ols_recovers_linear_signal() {
        // y = 2 + 3 * x
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![1.0, i as f64]).collect();
        let y: Vec<f64> = (0..20).map(|i| 2.0 + 3.0 * i as f64).collect();
        let coef = fit_ols(&x, &y).unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-4, "intercept = {}", coef[0]);
        assert!((coef[1] - 3.0).abs() < 1e-4, "slope = {}", coef[1]);
    }
}
