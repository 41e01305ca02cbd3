//! lifeboat: reproducible data preparation and cross-validated model comparison
//! for tabular passenger records with a binary outcome.
//!
//! The crate cleans and imputes a raw record table, derives structured string
//! features, collapses rare categorical levels, and then fits a panel of
//! heterogeneous classifiers under one shared fold assignment so their
//! cross-validated accuracies are directly comparable. The result is a ranked
//! leaderboard with a paired significance check against a trivial baseline,
//! plus permutation importance and partial dependence for the winning model.
//!
//! The design favors small, testable modules: every stage consumes the
//! previous stage's frame and returns a new, independently owned one.
pub mod config;
pub mod derive;
pub mod error;
pub mod folds;
pub mod frame;
pub mod importance;
pub mod impute;
pub mod leaderboard;
pub mod math;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod sanitize;
pub mod trainer;
