//! Enhancement-orchestration configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the enhancement orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Consecutive fitting failures before the circuit breaker opens.
    /// Default: 3.
    pub breaker_threshold: Option<u32>,
    /// Run cross-validation after a successful dynamic fit. Default: true.
    pub validate_after_fit: Option<bool>,
}

impl EnhanceConfig {
    pub fn effective_breaker_threshold(&self) -> u32 {
        self.breaker_threshold.unwrap_or(3)
    }

    pub fn effective_validate_after_fit(&self) -> bool {
        self.validate_after_fit.unwrap_or(true)
    }
}
