//! Mechanism fitting errors.
//!
//! Every failure mode of the out-of-process fitting boundary — spawn
//! failure, timeout, malformed document, protocol mismatch — collapses into
//! this one type so callers never observe a partially-fitted model.

use super::error_code::{self, RippleErrorCode};

/// Errors that can occur while fitting mechanisms.
#[derive(Debug, thiserror::Error)]
pub enum FittingError {
    #[error("Fitting boundary process could not be started: {message}")]
    Spawn { message: String },

    #[error("Fitting boundary timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Malformed fitting response: {message}")]
    MalformedResponse { message: String },

    #[error("Fitting protocol mismatch: engine speaks v{expected}, boundary replied v{actual}")]
    ProtocolMismatch { expected: u32, actual: u32 },

    #[error("Fitting service reported failure: {message}")]
    Service { message: String },

    #[error("Insufficient trace samples: need {needed}, got {got}")]
    InsufficientSamples { needed: usize, got: usize },

    #[error("Node '{node}' has no trace column")]
    MissingColumn { node: String },
}

impl RippleErrorCode for FittingError {
    fn error_code(&self) -> &'static str {
        error_code::FITTING_ERROR
    }
}
