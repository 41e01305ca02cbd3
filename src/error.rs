use std::error::Error;
use std::fmt;

/// Errors surfaced by the preparation and comparison pipeline.
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// A required raw field is missing or unusable before any stage runs.
    Schema(String),
    /// A name or cabin string does not match the expected structured pattern.
    MalformedRecord {
        row_id: u32,
        field: &'static str,
        raw: String,
    },
    /// Every hyperparameter combination of a model family failed to fit.
    FitFailure {
        family: String,
        detail: String,
    },
    /// Sanitization removed every predictor column.
    DegenerateFeatures,
    /// Row-aligned inputs disagree on length or shape.
    Shape(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PipelineError::Schema(msg) => write!(f, "schema error: {}", msg),
            PipelineError::MalformedRecord { row_id, field, raw } => write!(
                f,
                "malformed {} in row {}: {:?}",
                field, row_id, raw
            ),
            PipelineError::FitFailure { family, detail } => {
                write!(f, "model family {} failed to fit: {}", family, detail)
            }
            PipelineError::DegenerateFeatures => {
                write!(f, "no predictor columns remain after sanitization")
            }
            PipelineError::Shape(msg) => write!(f, "shape mismatch: {}", msg),
        }
    }
}

impl Error for PipelineError {}
