//! Cross-validated grid search under the shared fold assignment.
//!
//! Every candidate model sees exactly the same train/validation splits, so
//! per-fold accuracies are paired across families and grid points.
//! Combinations are independent fits over read-only inputs and are evaluated
//! in parallel; a combination that fails to fit is logged and excluded, and
//! a family only fails when its entire grid does.
use rayon::prelude::*;

use crate::config::ModelFamily;
use crate::error::PipelineError;
use crate::folds::FoldAssignment;
use crate::frame::DesignMatrix;
use crate::models::factory::{build_model, grid_for};
use crate::models::grid::HyperPoint;
use crate::preprocessing::{fit_scaler, transform_all};

/// A family's cross-validation outcome: the selected grid point and its
/// fold-aligned accuracy vector.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub family: ModelFamily,
    pub params: HyperPoint,
    pub fold_accuracies: Vec<f64>,
    pub mean_accuracy: f64,
}

/// Deterministic seed for one (grid point, fold) fit.
fn fit_seed(seed: u64, grid_idx: usize, fold: usize) -> u64 {
    seed.wrapping_add((grid_idx as u64) << 16)
        .wrapping_add(fold as u64)
}

/// Fit one grid point on every fold's complement and score the hold-outs.
fn evaluate_point(
    family: ModelFamily,
    grid_idx: usize,
    point: &HyperPoint,
    dm: &DesignMatrix,
    folds: &FoldAssignment,
    seed: u64,
) -> Result<Vec<f64>, PipelineError> {
    let mut accuracies = Vec::with_capacity(folds.k);
    for fold in 0..folds.k {
        let train = folds.train_indices(fold);
        let test = folds.test_indices(fold);

        // Scaler fit on the training complement only; applied to both sides.
        let x_train_raw = dm.x.select_rows(&train);
        let scaler = fit_scaler(&x_train_raw);
        let x_train = transform_all(&x_train_raw, &scaler);
        let x_test = transform_all(&dm.x.select_rows(&test), &scaler);
        let y_train: Vec<u8> = train.iter().map(|&i| dm.y[i]).collect();

        let mut model = build_model(family, point, &dm.groups, fit_seed(seed, grid_idx, fold));
        model.fit(&x_train, &y_train)?;

        let probs = model.predict_proba(&x_test);
        let correct = probs
            .iter()
            .zip(test.iter())
            .filter(|(p, &i)| ((**p >= 0.5) as u8) == dm.y[i])
            .count();
        accuracies.push(correct as f64 / test.len() as f64);
        log::trace!(
            "{} [{}] fold {}: accuracy {:.4}",
            family.name(),
            point.label(),
            fold,
            accuracies[fold]
        );
    }
    Ok(accuracies)
}

/// Run the family's grid under the shared folds and keep the best point.
///
/// Selection maximizes mean hold-out accuracy; a tie keeps the earliest
/// grid point, and grids are ordered simplest-first, so ties resolve to the
/// simplest model in the family.
pub fn train_family(
    family: ModelFamily,
    dm: &DesignMatrix,
    folds: &FoldAssignment,
    seed: u64,
) -> Result<TrainedModel, PipelineError> {
    let grid = grid_for(family, dm.x.ncols());
    log::debug!(
        "{}: searching {} grid point(s) over {} folds",
        family.name(),
        grid.len(),
        folds.k
    );

    let results: Vec<(usize, Result<Vec<f64>, PipelineError>)> = grid
        .par_iter()
        .enumerate()
        .map(|(idx, point)| (idx, evaluate_point(family, idx, point, dm, folds, seed)))
        .collect();

    let mut best: Option<(usize, Vec<f64>, f64)> = None;
    let mut last_error = String::new();
    for (idx, result) in results {
        match result {
            Ok(accuracies) => {
                let mean = accuracies.iter().sum::<f64>() / accuracies.len() as f64;
                let better = best.as_ref().map(|(_, _, m)| mean > *m).unwrap_or(true);
                if better {
                    best = Some((idx, accuracies, mean));
                }
            }
            Err(err) => {
                log::warn!(
                    "{}: excluding grid point [{}]: {}",
                    family.name(),
                    grid[idx].label(),
                    err
                );
                last_error = err.to_string();
            }
        }
    }

    match best {
        Some((idx, fold_accuracies, mean_accuracy)) => {
            log::info!(
                "{}: selected [{}] with mean CV accuracy {:.4}",
                family.name(),
                grid[idx].label(),
                mean_accuracy
            );
            Ok(TrainedModel {
                family,
                params: grid[idx].clone(),
                fold_accuracies,
                mean_accuracy,
            })
        }
        None => Err(PipelineError::FitFailure {
            family: family.name().into(),
            detail: format!("all {} grid points failed ({})", grid.len(), last_error),
        }),
    }
}

/// Train every family; a family-level failure is logged and skipped, and
/// only an empty panel is a pipeline-level failure.
pub fn train_all(
    dm: &DesignMatrix,
    folds: &FoldAssignment,
    seed: u64,
) -> Result<Vec<TrainedModel>, PipelineError> {
    let mut trained = Vec::new();
    for &family in ModelFamily::all() {
        match train_family(family, dm, folds, seed) {
            Ok(model) => trained.push(model),
            Err(err) => log::warn!("skipping family {}: {}", family.name(), err),
        }
    }
    if trained.is_empty() {
        return Err(PipelineError::FitFailure {
            family: "all".into(),
            detail: "every model family failed to fit".into(),
        });
    }
    Ok(trained)
}
