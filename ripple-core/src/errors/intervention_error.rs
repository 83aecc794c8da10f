//! Intervention errors.

use super::error_code::{self, RippleErrorCode};

/// Errors that can occur while simulating interventions.
#[derive(Debug, thiserror::Error)]
pub enum InterventionError {
    /// Numeric simulation against a static-mode model. Structure-only
    /// queries (`causal_paths`) remain available.
    #[error("Model was fitted in static mode; numeric intervention requires dynamic fitting")]
    Capability,

    #[error("Unknown node '{node}'")]
    UnknownNode { node: String },

    #[error("Intervention requires at least 1 sample, got {n_samples}")]
    NoSamples { n_samples: usize },
}

impl RippleErrorCode for InterventionError {
    fn error_code(&self) -> &'static str {
        error_code::INTERVENTION_ERROR
    }
}
