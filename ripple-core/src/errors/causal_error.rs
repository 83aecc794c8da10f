//! Aggregate error for the enhancement pipeline.
//! Subsystem errors convert in via `From`; the orchestrator catches this
//! type, logs it, and degrades instead of propagating.

use super::error_code::{self, RippleErrorCode};
use super::{
    ConfigError, ExtractionError, FittingError, InterventionError, ValidationError,
};

/// Any error the enhancement pipeline can observe.
#[derive(Debug, thiserror::Error)]
pub enum CausalError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Fitting error: {0}")]
    Fitting(#[from] FittingError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Intervention error: {0}")]
    Intervention(#[from] InterventionError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The circuit breaker is open; the fitting boundary was not invoked.
    #[error("Fitting circuit open after {failures} consecutive failures; call reset() to close")]
    CircuitOpen { failures: u32 },
}

impl RippleErrorCode for CausalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Extraction(e) => e.error_code(),
            Self::Fitting(e) => e.error_code(),
            Self::Validation(e) => e.error_code(),
            Self::Intervention(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::CircuitOpen { .. } => error_code::CIRCUIT_OPEN,
        }
    }
}
