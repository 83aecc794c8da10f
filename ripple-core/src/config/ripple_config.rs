//! Top-level Ripple configuration with 3-layer resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{EnhanceConfig, ExtractionConfig, FittingConfig, ValidationConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`RIPPLE_*`)
/// 2. Project config (`ripple.toml` in project root)
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RippleConfig {
    pub extraction: ExtractionConfig,
    pub fitting: FittingConfig,
    pub validation: ValidationConfig,
    pub enhance: EnhanceConfig,
}

impl RippleConfig {
    /// Load configuration with 3-layer resolution.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join("ripple.toml");
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config);

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &RippleConfig) -> Result<(), ConfigError> {
        if let Some(threshold) = config.validation.r2_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(ConfigError::ValidationFailed {
                    field: "validation.r2_threshold".to_string(),
                    message: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(level) = config.validation.bootstrap_level {
            if !(0.0..1.0).contains(&level) || level <= 0.5 {
                return Err(ConfigError::ValidationFailed {
                    field: "validation.bootstrap_level".to_string(),
                    message: "must be in (0.5, 1.0)".to_string(),
                });
            }
        }
        if let Some(n) = config.validation.bootstrap_samples {
            if n == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "validation.bootstrap_samples".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(secs) = config.fitting.timeout_secs {
            if secs == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "fitting.timeout_secs".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        if let Some(r2) = config.fitting.escalation_r2 {
            if !(0.0..=1.0).contains(&r2) {
                return Err(ConfigError::ValidationFailed {
                    field: "fitting.escalation_r2".to_string(),
                    message: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        if let Some(threshold) = config.enhance.breaker_threshold {
            if threshold == 0 {
                return Err(ConfigError::ValidationFailed {
                    field: "enhance.breaker_threshold".to_string(),
                    message: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    fn merge_toml_file(config: &mut RippleConfig, path: &Path) -> Result<(), ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                path: path.display().to_string(),
            })?;

        let file_config: RippleConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base`
    /// values only when `other` has a `Some` value.
    fn merge(base: &mut RippleConfig, other: &RippleConfig) {
        // Extraction
        if other.extraction.prune_emit_sinks.is_some() {
            base.extraction.prune_emit_sinks = other.extraction.prune_emit_sinks;
        }
        if other.extraction.keep_persist_sinks.is_some() {
            base.extraction.keep_persist_sinks = other.extraction.keep_persist_sinks;
        }
        if !other.extraction.never_prune.is_empty() {
            base.extraction.never_prune = other.extraction.never_prune.clone();
        }

        // Fitting
        if other.fitting.mode.is_some() {
            base.fitting.mode = other.fitting.mode;
        }
        if other.fitting.min_dynamic_samples.is_some() {
            base.fitting.min_dynamic_samples = other.fitting.min_dynamic_samples;
        }
        if !other.fitting.boundary_command.is_empty() {
            base.fitting.boundary_command = other.fitting.boundary_command.clone();
        }
        if other.fitting.timeout_secs.is_some() {
            base.fitting.timeout_secs = other.fitting.timeout_secs;
        }
        if other.fitting.escalation_r2.is_some() {
            base.fitting.escalation_r2 = other.fitting.escalation_r2;
        }

        // Validation
        if other.validation.r2_threshold.is_some() {
            base.validation.r2_threshold = other.validation.r2_threshold;
        }
        if other.validation.split_seed.is_some() {
            base.validation.split_seed = other.validation.split_seed;
        }
        if other.validation.bootstrap_samples.is_some() {
            base.validation.bootstrap_samples = other.validation.bootstrap_samples;
        }
        if other.validation.bootstrap_level.is_some() {
            base.validation.bootstrap_level = other.validation.bootstrap_level;
        }

        // Enhance
        if other.enhance.breaker_threshold.is_some() {
            base.enhance.breaker_threshold = other.enhance.breaker_threshold;
        }
        if other.enhance.validate_after_fit.is_some() {
            base.enhance.validate_after_fit = other.enhance.validate_after_fit;
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `RIPPLE_VALIDATION_R2_THRESHOLD`, `RIPPLE_FITTING_MODE`, etc.
    fn apply_env_overrides(config: &mut RippleConfig) {
        if let Ok(val) = std::env::var("RIPPLE_FITTING_MODE") {
            if let Ok(mode) = val.parse() {
                config.fitting.mode = Some(mode);
            }
        }
        if let Ok(val) = std::env::var("RIPPLE_FITTING_MIN_DYNAMIC_SAMPLES") {
            if let Ok(v) = val.parse::<usize>() {
                config.fitting.min_dynamic_samples = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RIPPLE_FITTING_TIMEOUT_SECS") {
            if let Ok(v) = val.parse::<u64>() {
                config.fitting.timeout_secs = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RIPPLE_VALIDATION_R2_THRESHOLD") {
            if let Ok(v) = val.parse::<f64>() {
                config.validation.r2_threshold = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RIPPLE_VALIDATION_BOOTSTRAP_SAMPLES") {
            if let Ok(v) = val.parse::<usize>() {
                config.validation.bootstrap_samples = Some(v);
            }
        }
        if let Ok(val) = std::env::var("RIPPLE_ENHANCE_BREAKER_THRESHOLD") {
            if let Ok(v) = val.parse::<u32>() {
                config.enhance.breaker_threshold = Some(v);
            }
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}
