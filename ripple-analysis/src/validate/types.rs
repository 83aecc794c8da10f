//! Validation result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::ConfidenceInterval;

/// Cross-validated score for one node's mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeScore {
    pub node: String,
    /// Coefficient of determination on the held-out split. May be negative
    /// when the mechanism predicts worse than the test mean.
    pub r2: f64,
    /// Held-out samples the score was computed from.
    pub n_test: usize,
}

/// Outcome of one cross-validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub node_scores: Vec<NodeScore>,
    /// Sample-size-weighted mean R² across validated nodes.
    pub aggregate_r2: f64,
    pub threshold: f64,
    pub passed: bool,
    /// Per-node bootstrap intervals, when a bootstrap pass ran.
    pub intervals: Option<BTreeMap<String, ConfidenceInterval>>,
}

impl ValidationResult {
    pub fn score_for(&self, node: &str) -> Option<f64> {
        self.node_scores.iter().find(|s| s.node == node).map(|s| s.r2)
    }

    pub fn attach_intervals(mut self, intervals: BTreeMap<String, ConfidenceInterval>) -> Self {
        self.intervals = Some(intervals);
        self
    }
}
