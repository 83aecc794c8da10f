//! Mechanism-fitting configuration and mode selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// How mechanisms are fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Topology-only mechanisms, no runtime data required.
    Static,
    /// Numeric mechanisms fitted from traces via the fitting boundary.
    Dynamic,
    /// Dynamic when enough trace samples are available, static otherwise.
    #[default]
    Auto,
}

impl FitMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FitMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            "auto" => Ok(Self::Auto),
            other => Err(ConfigError::UnknownMode {
                mode: other.to_string(),
            }),
        }
    }
}

/// Configuration for the mechanism-fitting subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FittingConfig {
    /// Default fit mode when the caller does not pass one. Default: auto.
    pub mode: Option<FitMode>,
    /// Minimum trace rows before auto mode chooses dynamic. Default: 100.
    pub min_dynamic_samples: Option<usize>,
    /// External fitting-boundary command (argv). When unset, the in-process
    /// reference boundary is used.
    #[serde(default)]
    pub boundary_command: Vec<String>,
    /// Hard timeout for one boundary exchange, in seconds. Default: 60.
    pub timeout_secs: Option<u64>,
    /// Training R² below which the linear fit escalates to the nonlinear
    /// form. Default: 0.5.
    pub escalation_r2: Option<f64>,
}

impl FittingConfig {
    pub fn effective_mode(&self) -> FitMode {
        self.mode.unwrap_or_default()
    }

    pub fn effective_min_dynamic_samples(&self) -> usize {
        self.min_dynamic_samples.unwrap_or(100)
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(60)
    }

    pub fn effective_escalation_r2(&self) -> f64 {
        self.escalation_r2.unwrap_or(0.5)
    }
}
