//! Seeded 80/20 cross-validation of fitted mechanisms.

use rand::seq::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ripple_core::config::ValidationConfig;
use ripple_core::errors::{ThresholdError, ValidationError};
use ripple_core::types::TraceTable;

use crate::scm::StructuralCausalModel;
use crate::validate::types::{NodeScore, ValidationResult};

/// Absolute tolerance for "the mechanism reproduces a constant exactly".
const CONSTANT_MATCH_EPS: f64 = 1e-9;

/// Cross-validates fitted mechanisms against held-out trace rows.
#[derive(Debug, Default)]
pub struct Validator {
    config: ValidationConfig,
}

/// How scoring reacts to unscorable nodes.
#[derive(Clone, Copy, PartialEq)]
enum ScoringMode {
    /// Propagate errors (`cross_validate`).
    Strict,
    /// Skip unscorable nodes (bootstrap resampling).
    Lenient,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Cross-validate at the configured threshold.
    pub fn cross_validate(
        &self,
        scm: &StructuralCausalModel,
        traces: &TraceTable,
    ) -> Result<ValidationResult, ValidationError> {
        self.cross_validate_with_threshold(scm, traces, self.config.effective_r2_threshold())
    }

    /// Cross-validate against an explicit threshold.
    ///
    /// Root nodes are skipped (their empirical mechanism reproduces the
    /// data by construction); every other traced node is predicted on the
    /// held-out 20% split. An aggregate below the threshold is an error
    /// carrying every failing node.
    pub fn cross_validate_with_threshold(
        &self,
        scm: &StructuralCausalModel,
        traces: &TraceTable,
        threshold: f64,
    ) -> Result<ValidationResult, ValidationError> {
        let scores = self.score_nodes(scm, traces, ScoringMode::Strict)?;

        let total_weight: usize = scores.iter().map(|s| s.n_test).sum();
        let aggregate_r2 = if total_weight == 0 {
            1.0 // nothing to validate, vacuously consistent
        } else {
            scores
                .iter()
                .map(|s| s.r2 * s.n_test as f64)
                .sum::<f64>()
                / total_weight as f64
        };

        if aggregate_r2 < threshold {
            let failing_nodes = scores
                .iter()
                .filter(|s| s.r2 < threshold)
                .map(|s| s.node.clone())
                .collect();
            return Err(ValidationError::Threshold(ThresholdError {
                aggregate_r2,
                threshold,
                failing_nodes,
            }));
        }

        Ok(ValidationResult {
            node_scores: scores,
            aggregate_r2,
            threshold,
            passed: true,
            intervals: None,
        })
    }

    /// Per-node R² without threshold enforcement, skipping unscorable
    /// nodes. Used by the bootstrap pass.
    pub(crate) fn score_lenient(
        &self,
        scm: &StructuralCausalModel,
        traces: &TraceTable,
    ) -> Vec<NodeScore> {
        self.score_nodes(scm, traces, ScoringMode::Lenient)
            .unwrap_or_default()
    }

    fn score_nodes(
        &self,
        scm: &StructuralCausalModel,
        traces: &TraceTable,
        mode: ScoringMode,
    ) -> Result<Vec<NodeScore>, ValidationError> {
        let test_rows = self.test_split(traces.n_rows());
        let graph = scm.graph();
        let mut scores = Vec::new();

        // Deterministic node order keeps failure lists stable.
        let mut node_ids: Vec<&str> = graph.node_ids().collect();
        node_ids.sort();

        for node in node_ids {
            if graph.is_root(node) {
                continue; // R² = 1.0 by construction
            }
            let Some(target) = traces.column(node) else {
                continue; // untraced node (e.g. call-graph function)
            };
            let Some(mechanism) = scm.mechanism(node) else {
                continue;
            };
            if !mechanism.is_parameterized() {
                match mode {
                    ScoringMode::Strict => {
                        return Err(ValidationError::UnparameterizedMechanism {
                            node: node.to_string(),
                        })
                    }
                    ScoringMode::Lenient => continue,
                }
            }

            let parents = mechanism.parents();
            if parents.iter().any(|p| !traces.has_column(p)) {
                continue;
            }
            let parent_columns: Vec<&[f64]> = parents
                .iter()
                .map(|p| traces.column(p).expect("checked above"))
                .collect();

            let mut observed = Vec::new();
            let mut predicted = Vec::new();
            for &row in &test_rows {
                let y = target[row];
                if !y.is_finite() {
                    continue;
                }
                let values: Vec<f64> = parent_columns.iter().map(|col| col[row]).collect();
                if values.iter().any(|v| !v.is_finite()) {
                    continue;
                }
                let Some(pred) = mechanism.predict(&values) else {
                    continue;
                };
                observed.push(y);
                predicted.push(pred);
            }

            if observed.len() < 2 {
                match mode {
                    ScoringMode::Strict => {
                        return Err(ValidationError::InsufficientData {
                            node: node.to_string(),
                            needed: 2,
                            got: observed.len(),
                        })
                    }
                    ScoringMode::Lenient => continue,
                }
            }

            let r2 = match r_squared(&observed, &predicted) {
                Ok(r2) => r2,
                Err((obs, pred)) => match mode {
                    ScoringMode::Strict => {
                        return Err(ValidationError::ZeroVarianceContradiction {
                            node: node.to_string(),
                            observed: obs,
                            predicted: pred,
                        })
                    }
                    ScoringMode::Lenient => continue,
                },
            };

            scores.push(NodeScore {
                node: node.to_string(),
                r2,
                n_test: observed.len(),
            });
        }

        Ok(scores)
    }

    /// Reproducible 20% test split over row indices.
    pub(crate) fn test_split(&self, n_rows: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..n_rows).collect();
        let mut rng = StdRng::seed_from_u64(self.config.effective_split_seed());
        indices.shuffle(&mut rng);

        let train_len = (n_rows as f64 * 0.8).floor() as usize;
        let mut test: Vec<usize> = indices.split_off(train_len.min(n_rows));
        test.sort_unstable();
        test
    }
}

/// `R² = 1 − SS_res/SS_tot`, with the zero-variance rules: a constant
/// target reproduced exactly scores 1.0, any residual against a constant
/// target is an error (`Err((observed, predicted))`) because R² is
/// undefined there and must not be reported as 0.
fn r_squared(observed: &[f64], predicted: &[f64]) -> Result<f64, (f64, f64)> {
    let n = observed.len() as f64;
    let mean = observed.iter().sum::<f64>() / n;
    let ss_tot: f64 = observed.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = observed
        .iter()
        .zip(predicted)
        .map(|(y, p)| (y - p).powi(2))
        .sum();

    if ss_tot <= f64::EPSILON * n {
        let scale = mean.abs().max(1.0);
        for (&y, &p) in observed.iter().zip(predicted) {
            if (y - p).abs() > CONSTANT_MATCH_EPS * scale {
                return Err((y, p));
            }
        }
        return Ok(1.0);
    }

    let r2 = 1.0 - ss_res / ss_tot;
    Ok(if r2.is_finite() { r2 } else { 0.0 })
}
