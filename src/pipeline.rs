//! End-to-end orchestration: raw passenger records in, comparison report out.
//!
//! Stages run strictly in order, each owning the frame it returns: ingest ->
//! impute -> derive -> sanitize -> encode -> plan folds -> train the panel ->
//! rank -> refit the winner -> interpret. Everything downstream of fold
//! planning shares the one fold assignment, and every stochastic step derives
//! from the configured seed.
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::folds::{FoldAssignment, FoldPlanner};
use crate::frame::{ingest, RawPassenger};
use crate::derive::FeatureDeriver;
use crate::importance::{ImportanceAnalyzer, ImportanceScore, PartialDependence};
use crate::impute::Imputer;
use crate::leaderboard::{Leaderboard, LeaderboardBuilder};
use crate::sanitize::FeatureSanitizer;
use crate::trainer::{train_all, TrainedModel};

/// A caller-requested partial-dependence sweep.
#[derive(Debug, Clone)]
pub enum PdRequest {
    Single(String),
    Pair(String, String),
}

/// Everything the comparison produces, in memory and serializable.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub leaderboard: Leaderboard,
    pub importance: Vec<ImportanceScore>,
    pub partial_dependence: Vec<PartialDependence>,
    pub fold_assignment: FoldAssignment,
    pub warnings: Vec<String>,
}

pub struct Pipeline {
    config: PipelineConfig,
    pd_requests: Vec<PdRequest>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline {
            config,
            pd_requests: Vec::new(),
        }
    }

    /// Request partial-dependence sweeps for named predictors; sweeps run
    /// against the refit winner after the comparison completes.
    pub fn with_partial_dependence(mut self, requests: Vec<PdRequest>) -> Self {
        self.pd_requests = requests;
        self
    }

    pub fn run(&self, records: Vec<RawPassenger>) -> Result<PipelineReport, PipelineError> {
        let records = ingest(records)?;
        log::info!("ingested {} records", records.len());

        let imputed = Imputer::new(&self.config).impute(&records)?;
        let warnings = imputed.warnings.clone();

        let frame = FeatureDeriver::derive(&imputed.records)?;
        let frame = FeatureSanitizer::new(&self.config).sanitize(&frame)?;

        let dm = frame.to_design_matrix()?;
        log::info!(
            "design matrix: {} rows x {} encoded columns ({} predictor groups)",
            dm.x.nrows(),
            dm.x.ncols(),
            dm.groups.len()
        );
        if dm.x.nrows() < self.config.n_folds {
            return Err(PipelineError::Schema(format!(
                "{} rows cannot be partitioned into {} folds",
                dm.x.nrows(),
                self.config.n_folds
            )));
        }

        let folds = FoldPlanner::plan(dm.x.nrows(), self.config.n_folds, self.config.seed);
        let trained = train_all(&dm, &folds, self.config.seed)?;
        let leaderboard = LeaderboardBuilder::build(&trained, self.config.alpha);

        // Same tie semantics as the leaderboard ordering: a strictly greater
        // mean displaces the incumbent, so the earliest-trained family wins.
        let winner = best_model(&trained);
        let analyzer = ImportanceAnalyzer::new(&self.config);
        let final_model = analyzer.refit(winner, &dm)?;
        let importance = analyzer.permutation_importance(&final_model, &dm);

        let mut partial_dependence = Vec::with_capacity(self.pd_requests.len());
        for request in &self.pd_requests {
            let pd = match request {
                PdRequest::Single(name) => {
                    analyzer.partial_dependence(&final_model, &dm, name)?
                }
                PdRequest::Pair(a, b) => {
                    analyzer.partial_dependence_pair(&final_model, &dm, a, b)?
                }
            };
            partial_dependence.push(pd);
        }

        Ok(PipelineReport {
            leaderboard,
            importance,
            partial_dependence,
            fold_assignment: folds,
            warnings,
        })
    }
}

fn best_model(trained: &[TrainedModel]) -> &TrainedModel {
    let mut best = &trained[0];
    for model in &trained[1..] {
        if model.mean_accuracy > best.mean_accuracy {
            best = model;
        }
    }
    best
}
