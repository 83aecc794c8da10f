//! Validation errors.

use super::error_code::{self, RippleErrorCode};

/// Aggregate R² fell below the configured threshold.
///
/// Carries every failing node so callers can report them all at once
/// instead of fixing one edge per run.
#[derive(Debug, thiserror::Error)]
#[error(
    "Aggregate R² {aggregate_r2:.3} below threshold {threshold:.3}; failing nodes: {}",
    failing_nodes.join(", ")
)]
pub struct ThresholdError {
    pub aggregate_r2: f64,
    pub threshold: f64,
    pub failing_nodes: Vec<String>,
}

impl RippleErrorCode for ThresholdError {
    fn error_code(&self) -> &'static str {
        error_code::THRESHOLD_ERROR
    }
}

/// Errors that can occur during cross-validation.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient data for node '{node}': {got} finite test samples (need {needed})")]
    InsufficientData {
        node: String,
        needed: usize,
        got: usize,
    },

    /// R² is undefined for a zero-variance target that the mechanism fails
    /// to reproduce; reporting 0 would silently hide a broken fit.
    #[error("Node '{node}' has zero variance but mechanism predicts {predicted} (observed {observed})")]
    ZeroVarianceContradiction {
        node: String,
        observed: f64,
        predicted: f64,
    },

    #[error("Node '{node}' has no fitted parameters; validate a dynamic-mode model")]
    UnparameterizedMechanism { node: String },

    #[error(transparent)]
    Threshold(#[from] ThresholdError),
}

impl RippleErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Threshold(e) => e.error_code(),
            _ => error_code::VALIDATION_ERROR,
        }
    }
}
