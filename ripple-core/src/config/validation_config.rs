//! Validation configuration.

use serde::{Deserialize, Serialize};

/// Configuration for cross-validation and bootstrap statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Aggregate R² acceptance threshold. Default: 0.7.
    pub r2_threshold: Option<f64>,
    /// Seed for the reproducible train/test split. Default: 42.
    pub split_seed: Option<u64>,
    /// Bootstrap resample count. Default: 1000.
    pub bootstrap_samples: Option<usize>,
    /// Bootstrap confidence level. Default: 0.95.
    pub bootstrap_level: Option<f64>,
}

impl ValidationConfig {
    pub fn effective_r2_threshold(&self) -> f64 {
        self.r2_threshold.unwrap_or(0.7)
    }

    pub fn effective_split_seed(&self) -> u64 {
        self.split_seed.unwrap_or(42)
    }

    pub fn effective_bootstrap_samples(&self) -> usize {
        self.bootstrap_samples.unwrap_or(1000)
    }

    pub fn effective_bootstrap_level(&self) -> f64 {
        self.bootstrap_level.unwrap_or(0.95)
    }
}
