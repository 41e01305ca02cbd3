//! Minimal dense linear-algebra types used throughout the pipeline.
//!
//! `Array1`/`Array2` are deliberately small row-major containers with just
//! the selection and summary operations the pipeline needs, plus a Gaussian
//! elimination solver for the normal-equation fits (age imputation, LDA).
mod matrix;
mod solve;
mod vector;

pub use matrix::{Array2, ShapeError};
pub use solve::solve_linear_system;
pub use vector::Array1;
