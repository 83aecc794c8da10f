//! Intervention specification and result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::ConfidenceInterval;

/// Transformation applied to a node's naturally-generated value by a soft
/// intervention.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoftTransform {
    /// Multiply the natural value.
    Scale(f64),
    /// Add to the natural value.
    Shift(f64),
}

impl SoftTransform {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::Scale(factor) => value * factor,
            Self::Shift(delta) => value + delta,
        }
    }
}

/// Hard interventions pin a node to a fixed value; soft interventions
/// transform the value the node would naturally take.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterventionKind {
    Hard(f64),
    Soft(SoftTransform),
}

/// One intervention to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionSpec {
    pub node_id: String,
    pub kind: InterventionKind,
}

impl InterventionSpec {
    pub fn hard(node_id: &str, value: f64) -> Self {
        Self {
            node_id: node_id.to_string(),
            kind: InterventionKind::Hard(value),
        }
    }

    pub fn soft(node_id: &str, transform: SoftTransform) -> Self {
        Self {
            node_id: node_id.to_string(),
            kind: InterventionKind::Soft(transform),
        }
    }
}

/// Simulated distribution summary for one queried node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeEstimate {
    pub mean: f64,
    pub variance: f64,
    /// Bootstrap interval of the mean.
    pub interval: ConfidenceInterval,
}

/// Result of one intervention simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterventionResult {
    pub estimates: BTreeMap<String, NodeEstimate>,
    pub n_samples: usize,
}

impl InterventionResult {
    pub fn estimate_for(&self, node: &str) -> Option<&NodeEstimate> {
        self.estimates.get(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_transforms() {
        assert_eq!(SoftTransform::Scale(2.0).apply(3.0), 6.0);
        assert_eq!(SoftTransform::Shift(-1.5).apply(3.0), 1.5);
    }

    #[test]
    fn test_spec_constructors() {
        let hard = InterventionSpec::hard("x", 4.0);
        assert_eq!(hard.kind, InterventionKind::Hard(4.0));
        let soft = InterventionSpec::soft("x", SoftTransform::Shift(1.0));
        assert!(matches!(soft.kind, InterventionKind::Soft(_)));
    }
}
