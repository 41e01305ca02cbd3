//! Classifier implementations and the uniform interface the trainer drives.
//!
//! Every family is a struct holding its hyperparameters and an optional
//! fitted state; the factory maps a family + grid point to a boxed
//! `Classifier` so the cross-validation loop never branches on the family.
pub mod baseline;
pub mod boost;
pub mod factory;
pub mod forest;
pub mod grid;
pub mod knn;
pub mod lda;
pub mod linear;
pub mod tree;

use crate::error::PipelineError;
use crate::math::Array2;

/// The contract every model family implements.
///
/// `y` is 0/1; `predict_proba` returns the probability of the positive
/// class in `[0, 1]`. A fit that cannot converge returns an error and the
/// trainer excludes that grid point.
pub trait Classifier: Send {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<(), PipelineError>;

    fn predict_proba(&self, x: &Array2<f64>) -> Vec<f64>;

    fn name(&self) -> &str {
        "classifier"
    }
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
