//! Mechanism types — how a node's value is generated from its parents.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Whether parameters were learned from runtime data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitOrigin {
    Static,
    Dynamic,
}

impl FitOrigin {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

/// The functional form of one node's generating mechanism.
///
/// Parent order is significant: coefficient `i` applies to `parents[i]`.
/// The nonlinear form is a degree-2 polynomial whose quadratic terms follow
/// the pair ordering produced by [`quadratic_features`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MechanismKind {
    /// Root node observed distribution: a bag of sampled values.
    Empirical { samples: Vec<f64> },
    Linear {
        parents: Vec<String>,
        intercept: f64,
        coefficients: Vec<f64>,
        noise_std: f64,
    },
    Nonlinear {
        parents: Vec<String>,
        intercept: f64,
        linear: Vec<f64>,
        quadratic: Vec<f64>,
        noise_std: f64,
    },
    /// Static-mode placeholder: topology without parameters.
    Structural { parents: Vec<String> },
}

/// A fitted (or placeholder) mechanism for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanism {
    pub kind: MechanismKind,
    pub fitted_from: FitOrigin,
}

impl Mechanism {
    pub fn structural(parents: Vec<String>) -> Self {
        Self {
            kind: MechanismKind::Structural { parents },
            fitted_from: FitOrigin::Static,
        }
    }

    pub fn empirical(samples: Vec<f64>) -> Self {
        Self {
            kind: MechanismKind::Empirical { samples },
            fitted_from: FitOrigin::Dynamic,
        }
    }

    /// Parent node ids in coefficient order.
    pub fn parents(&self) -> &[String] {
        match &self.kind {
            MechanismKind::Empirical { .. } => &[],
            MechanismKind::Linear { parents, .. }
            | MechanismKind::Nonlinear { parents, .. }
            | MechanismKind::Structural { parents } => parents,
        }
    }

    /// True when the mechanism carries numeric parameters usable for
    /// prediction or simulation.
    pub fn is_parameterized(&self) -> bool {
        matches!(
            self.kind,
            MechanismKind::Empirical { .. }
                | MechanismKind::Linear { .. }
                | MechanismKind::Nonlinear { .. }
        )
    }

    /// Residual noise scale, 0.0 where not applicable.
    pub fn noise_std(&self) -> f64 {
        match &self.kind {
            MechanismKind::Linear { noise_std, .. }
            | MechanismKind::Nonlinear { noise_std, .. } => *noise_std,
            _ => 0.0,
        }
    }

    /// Deterministic prediction from parent values, in `parents()` order.
    /// `None` for empirical and structural mechanisms.
    pub fn predict(&self, parent_values: &[f64]) -> Option<f64> {
        match &self.kind {
            MechanismKind::Linear {
                intercept,
                coefficients,
                ..
            } => {
                let mut y = *intercept;
                for (coef, value) in coefficients.iter().zip(parent_values) {
                    y += coef * value;
                }
                Some(y)
            }
            MechanismKind::Nonlinear {
                intercept,
                linear,
                quadratic,
                ..
            } => {
                let mut y = *intercept;
                for (coef, value) in linear.iter().zip(parent_values) {
                    y += coef * value;
                }
                for (coef, feature) in quadratic.iter().zip(quadratic_features(parent_values)) {
                    y += coef * feature;
                }
                Some(y)
            }
            MechanismKind::Empirical { .. } | MechanismKind::Structural { .. } => None,
        }
    }

    /// Mean absolute linear coefficient, a crude sensitivity signal used
    /// by impact scoring.
    pub fn sensitivity(&self) -> Option<f64> {
        let coefficients = match &self.kind {
            MechanismKind::Linear { coefficients, .. } => coefficients,
            MechanismKind::Nonlinear { linear, .. } => linear,
            _ => return None,
        };
        if coefficients.is_empty() {
            return None;
        }
        let sum: f64 = coefficients.iter().map(|c| c.abs()).sum();
        Some(sum / coefficients.len() as f64)
    }

    /// Mechanism type label for display and summaries.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            MechanismKind::Empirical { .. } => "empirical",
            MechanismKind::Linear { .. } => "linear",
            MechanismKind::Nonlinear { .. } => "nonlinear",
            MechanismKind::Structural { .. } => "structural",
        }
    }
}

/// Degree-2 feature expansion: all products `x_i * x_j` with `i <= j`.
pub fn quadratic_features(values: &[f64]) -> SmallVec<[f64; 8]> {
    let mut features = SmallVec::new();
    for i in 0..values.len() {
        for j in i..values.len() {
            features.push(values[i] * values[j]);
        }
    }
    features
}
