//! Graph extraction errors.

use super::error_code::{self, RippleErrorCode};

/// Errors that can occur while building a causal graph from a code unit.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Code unit '{unit}' has no statements or parameters")]
    EmptyUnit { unit: String },

    #[error("Statement at line {line} references undeclared region {region}")]
    UnknownRegion { line: u32, region: u32 },

    #[error("Causal graph is cyclic after pruning: {cycle}")]
    CyclicDependency { cycle: String },
}

impl RippleErrorCode for ExtractionError {
    fn error_code(&self) -> &'static str {
        error_code::EXTRACTION_ERROR
    }
}
