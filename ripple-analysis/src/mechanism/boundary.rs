//! Fitting boundary — the request/response contract with the numeric
//! fitting procedure.
//!
//! The engine exchanges exactly one document pair per fit and treats the
//! exchange as idempotent and side-effect-free. Two implementations ship:
//! a child-process client speaking JSON over stdio under a hard timeout,
//! and an in-process least-squares reference used when no external command
//! is configured.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ripple_core::errors::FittingError;

use crate::graph::GraphDoc;
use crate::mechanism::ols;
use crate::mechanism::types::{quadratic_features, Mechanism, MechanismKind};

/// Version of the request/response documents. A response declaring any
/// other version is rejected as a protocol mismatch.
pub const PROTOCOL_VERSION: u32 = 1;

/// Fit configuration forwarded to the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitRequestConfig {
    /// Requested fit quality preset, e.g. "standard".
    pub quality: String,
    /// Acceptance threshold echoed back in the diagnostics.
    pub r2_threshold: f64,
    /// Training R² below which a linear fit escalates to nonlinear.
    pub escalation_r2: f64,
}

/// The single request document sent per fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitRequest {
    pub version: u32,
    pub graph: GraphDoc,
    pub traces: BTreeMap<String, Vec<f64>>,
    pub config: FitRequestConfig,
}

/// Fitted mechanisms keyed by node id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScmDoc {
    pub mechanisms: BTreeMap<String, Mechanism>,
}

/// Training-side diagnostics reported by the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitDiagnostics {
    pub r2_scores: BTreeMap<String, f64>,
    pub mean_r2: f64,
    pub passed: bool,
}

/// The single response document received per fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FitResponse {
    Success {
        version: u32,
        scm: ScmDoc,
        validation: FitDiagnostics,
    },
    Error {
        error: String,
        #[serde(default)]
        details: Option<String>,
    },
}

/// The fitting-boundary contract. Implementations must be side-effect-free
/// on the caller and safe to retry.
pub trait FittingBoundary: Send + Sync {
    fn fit(&self, request: &FitRequest) -> Result<FitResponse, FittingError>;
}

// ───────────────────────────────────────────────────────────────────────────
// In-process reference boundary
// ───────────────────────────────────────────────────────────────────────────

/// Least-squares reference implementation of the boundary contract.
///
/// Assigns an empirical distribution to every traced root node and fits a
/// linear mechanism per traced non-root, escalating to the degree-2 form
/// when the training residuals indicate underfit. Untraced nodes (e.g.
/// call-graph function nodes) keep a structural placeholder.
#[derive(Debug, Default)]
pub struct NativeBoundary;

impl FittingBoundary for NativeBoundary {
    fn fit(&self, request: &FitRequest) -> Result<FitResponse, FittingError> {
        let mut parents_of: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for node in &request.graph.nodes {
            parents_of.entry(node.id.as_str()).or_default();
        }
        for edge in &request.graph.edges {
            parents_of.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
        }
        for parents in parents_of.values_mut() {
            parents.sort();
            parents.dedup();
        }

        let mut mechanisms = BTreeMap::new();
        let mut r2_scores = BTreeMap::new();

        for (node, parents) in &parents_of {
            let column = request.traces.get(*node);
            let traced = column.is_some() && parents.iter().all(|p| request.traces.contains_key(*p));

            if !traced {
                mechanisms.insert(
                    (*node).to_string(),
                    Mechanism::structural(parents.iter().map(|p| p.to_string()).collect()),
                );
                continue;
            }
            let column = column.expect("checked above");

            if parents.is_empty() {
                let samples: Vec<f64> =
                    column.iter().copied().filter(|v| v.is_finite()).collect();
                if samples.is_empty() {
                    return Err(FittingError::InsufficientSamples { needed: 1, got: 0 });
                }
                mechanisms.insert((*node).to_string(), Mechanism::empirical(samples));
                continue;
            }

            let (rows, targets) = gather_finite(request, parents, column);
            let needed = parents.len() + 2;
            if targets.len() < needed {
                return Err(FittingError::InsufficientSamples {
                    needed,
                    got: targets.len(),
                });
            }

            let linear = ols::fit(&rows, &targets).ok_or_else(|| FittingError::Service {
                message: format!("degenerate design matrix for node '{node}'"),
            })?;

            let mut train_r2 = linear.train_r2;
            let mut kind = MechanismKind::Linear {
                parents: parents.iter().map(|p| p.to_string()).collect(),
                intercept: linear.intercept,
                coefficients: linear.coefficients.clone(),
                noise_std: linear.noise_std,
            };

            // Escalate only when the linear form underfits.
            if linear.train_r2 < request.config.escalation_r2 {
                let expanded: Vec<Vec<f64>> = rows
                    .iter()
                    .map(|row| {
                        let mut features = row.clone();
                        features.extend(quadratic_features(row));
                        features
                    })
                    .collect();
                if let Some(quad) = ols::fit(&expanded, &targets) {
                    if quad.train_r2 > linear.train_r2 {
                        let k = parents.len();
                        train_r2 = quad.train_r2;
                        kind = MechanismKind::Nonlinear {
                            parents: parents.iter().map(|p| p.to_string()).collect(),
                            intercept: quad.intercept,
                            linear: quad.coefficients[..k].to_vec(),
                            quadratic: quad.coefficients[k..].to_vec(),
                            noise_std: quad.noise_std,
                        };
                    }
                }
            }

            r2_scores.insert((*node).to_string(), train_r2);
            mechanisms.insert(
                (*node).to_string(),
                Mechanism {
                    kind,
                    fitted_from: crate::mechanism::FitOrigin::Dynamic,
                },
            );
        }

        let mean_r2 = if r2_scores.is_empty() {
            1.0
        } else {
            r2_scores.values().sum::<f64>() / r2_scores.len() as f64
        };

        Ok(FitResponse::Success {
            version: PROTOCOL_VERSION,
            scm: ScmDoc { mechanisms },
            validation: FitDiagnostics {
                mean_r2,
                passed: mean_r2 >= request.config.r2_threshold,
                r2_scores,
            },
        })
    }
}

/// Rows where the target and every parent column are finite.
fn gather_finite(
    request: &FitRequest,
    parents: &[&str],
    column: &[f64],
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let parent_columns: Vec<&Vec<f64>> = parents
        .iter()
        .map(|p| request.traces.get(*p).expect("caller verified columns"))
        .collect();

    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for (i, &y) in column.iter().enumerate() {
        if !y.is_finite() {
            continue;
        }
        let row: Vec<f64> = parent_columns
            .iter()
            .filter_map(|col| col.get(i).copied())
            .collect();
        if row.len() == parents.len() && row.iter().all(|v| v.is_finite()) {
            rows.push(row);
            targets.push(y);
        }
    }
    (rows, targets)
}

// ───────────────────────────────────────────────────────────────────────────
// Out-of-process boundary
// ───────────────────────────────────────────────────────────────────────────

/// Child-process boundary client: one JSON document each way over stdio,
/// under a hard timeout. The child is killed when the timeout expires.
#[derive(Debug, Clone)]
pub struct ProcessBoundary {
    command: Vec<String>,
    timeout: Duration,
}

impl ProcessBoundary {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    fn parse(body: &str) -> Result<FitResponse, FittingError> {
        serde_json::from_str(body).map_err(|e| FittingError::MalformedResponse {
            message: e.to_string(),
        })
    }
}

impl FittingBoundary for ProcessBoundary {
    fn fit(&self, request: &FitRequest) -> Result<FitResponse, FittingError> {
        let program = self.command.first().ok_or_else(|| FittingError::Spawn {
            message: "empty boundary command".to_string(),
        })?;

        debug!(command = %program, "spawning fitting boundary");
        let mut child = Command::new(program)
            .args(&self.command[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| FittingError::Spawn {
                message: e.to_string(),
            })?;

        let body = serde_json::to_vec(request).map_err(|e| FittingError::Service {
            message: format!("failed to encode request: {e}"),
        })?;

        let mut stdin = child.stdin.take().ok_or_else(|| FittingError::Spawn {
            message: "no stdin pipe".to_string(),
        })?;
        if let Err(e) = stdin.write_all(&body) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(FittingError::Service {
                message: format!("boundary rejected request: {e}"),
            });
        }
        drop(stdin); // close the pipe so the child sees EOF

        let mut stdout = child.stdout.take().ok_or_else(|| FittingError::Spawn {
            message: "no stdout pipe".to_string(),
        })?;

        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            let mut buffer = String::new();
            let result = stdout.read_to_string(&mut buffer).map(|_| buffer);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(response)) => {
                let _ = child.wait();
                Self::parse(&response)
            }
            Ok(Err(e)) => {
                let _ = child.wait();
                Err(FittingError::MalformedResponse {
                    message: e.to_string(),
                })
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "fitting boundary timed out");
                let _ = child.kill();
                let _ = child.wait();
                Err(FittingError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        }
    }
}
