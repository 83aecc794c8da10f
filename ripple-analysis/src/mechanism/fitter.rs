//! Mechanism fitter — static and dynamic mode over one fitting-boundary
//! exchange.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use ripple_core::config::{FitMode, FittingConfig};
use ripple_core::errors::FittingError;
use ripple_core::types::collections::FxHashMap;
use ripple_core::types::TraceTable;

use crate::graph::CausalGraph;
use crate::mechanism::boundary::{
    FitRequest, FitRequestConfig, FitResponse, FittingBoundary, NativeBoundary,
    ProcessBoundary, PROTOCOL_VERSION,
};
use crate::mechanism::types::{FitOrigin, Mechanism};
use crate::scm::StructuralCausalModel;

/// Assigns and fits one mechanism per graph node.
pub struct MechanismFitter {
    config: FittingConfig,
    boundary: Arc<dyn FittingBoundary>,
}

impl MechanismFitter {
    /// Build a fitter from config: an external boundary command when one is
    /// configured, the in-process reference boundary otherwise.
    pub fn new(config: FittingConfig) -> Self {
        let boundary: Arc<dyn FittingBoundary> = if config.boundary_command.is_empty() {
            Arc::new(NativeBoundary)
        } else {
            Arc::new(ProcessBoundary::new(
                config.boundary_command.clone(),
                Duration::from_secs(config.effective_timeout_secs()),
            ))
        };
        Self { config, boundary }
    }

    /// Build a fitter around an explicit boundary implementation.
    pub fn with_boundary(config: FittingConfig, boundary: Arc<dyn FittingBoundary>) -> Self {
        Self { config, boundary }
    }

    /// Resolve `Auto` against the available trace data.
    pub fn resolve_mode(&self, requested: FitMode, traces: Option<&TraceTable>) -> FitOrigin {
        match requested {
            FitMode::Static => FitOrigin::Static,
            FitMode::Dynamic => FitOrigin::Dynamic,
            FitMode::Auto => {
                let rows = traces.map(|t| t.n_rows()).unwrap_or(0);
                if rows >= self.config.effective_min_dynamic_samples() {
                    FitOrigin::Dynamic
                } else {
                    FitOrigin::Static
                }
            }
        }
    }

    /// Fit a model in the given (already resolved) mode.
    pub fn fit(
        &self,
        graph: &Arc<CausalGraph>,
        traces: Option<&TraceTable>,
        origin: FitOrigin,
    ) -> Result<StructuralCausalModel, FittingError> {
        match origin {
            FitOrigin::Static => Ok(self.fit_static(graph)),
            FitOrigin::Dynamic => {
                let traces = traces.ok_or(FittingError::InsufficientSamples {
                    needed: self.config.effective_min_dynamic_samples(),
                    got: 0,
                })?;
                self.fit_dynamic(graph, traces)
            }
        }
    }

    /// Topology-only mechanisms: structure is preserved, numeric simulation
    /// is not possible.
    pub fn fit_static(&self, graph: &Arc<CausalGraph>) -> StructuralCausalModel {
        let mut mechanisms = FxHashMap::default();
        for id in graph.node_ids() {
            mechanisms.insert(id.to_string(), Mechanism::structural(graph.parents(id)));
        }
        StructuralCausalModel::new(Arc::clone(graph), mechanisms, FitOrigin::Static)
    }

    /// One request/response exchange with the fitting boundary.
    pub fn fit_dynamic(
        &self,
        graph: &Arc<CausalGraph>,
        traces: &TraceTable,
    ) -> Result<StructuralCausalModel, FittingError> {
        if traces.is_empty() {
            return Err(FittingError::InsufficientSamples {
                needed: self.config.effective_min_dynamic_samples(),
                got: 0,
            });
        }

        let request = FitRequest {
            version: PROTOCOL_VERSION,
            graph: graph.to_doc(),
            traces: traces.columns().clone(),
            config: FitRequestConfig {
                quality: "standard".to_string(),
                r2_threshold: 0.7,
                escalation_r2: self.config.effective_escalation_r2(),
            },
        };

        debug!(
            nodes = graph.node_count(),
            rows = traces.n_rows(),
            "requesting mechanism fit"
        );

        let response = self.boundary.fit(&request)?;
        let (version, scm_doc) = match response {
            FitResponse::Success { version, scm, .. } => (version, scm),
            FitResponse::Error { error, details } => {
                return Err(FittingError::Service {
                    message: match details {
                        Some(details) => format!("{error}: {details}"),
                        None => error,
                    },
                });
            }
        };
        if version != PROTOCOL_VERSION {
            return Err(FittingError::ProtocolMismatch {
                expected: PROTOCOL_VERSION,
                actual: version,
            });
        }

        // The mechanism map must cover every node; anything less would hand
        // consumers a partially-fitted model.
        let mut mechanisms = FxHashMap::default();
        for id in graph.node_ids() {
            let mechanism =
                scm_doc
                    .mechanisms
                    .get(id)
                    .cloned()
                    .ok_or_else(|| FittingError::MalformedResponse {
                        message: format!("no mechanism for node '{id}'"),
                    })?;
            mechanisms.insert(id.to_string(), mechanism);
        }

        Ok(StructuralCausalModel::new(
            Arc::clone(graph),
            mechanisms,
            FitOrigin::Dynamic,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphExtractor;
    use ripple_core::types::unit::{CodeUnit, Statement};

    fn chain_graph() -> Arc<CausalGraph> {
        let unit = CodeUnit::new("chain")
            .with_parameters(&["x"])
            .with_statement(Statement::assign(&["x"], &["y"], None, 1));
        Arc::new(GraphExtractor::default().extract(&unit, None).unwrap())
    }

    #[test]
    fn test_static_fit_covers_every_node() {
        let graph = chain_graph();
        let fitter = MechanismFitter::new(FittingConfig::default());
        let scm = fitter.fit_static(&graph);

        assert_eq!(scm.origin(), FitOrigin::Static);
        assert!(scm.mechanism("x").is_some());
        assert_eq!(scm.mechanism("y").unwrap().parents(), &["x".to_string()]);
        assert!(!scm.mechanism("y").unwrap().is_parameterized());
    }

    #[test]
    fn test_auto_mode_threshold() {
        let fitter = MechanismFitter::new(FittingConfig::default());
        let small = TraceTable::from_columns([("x", vec![1.0; 10])]);
        let large = TraceTable::from_columns([("x", vec![1.0; 100])]);

        assert_eq!(fitter.resolve_mode(FitMode::Auto, None), FitOrigin::Static);
        assert_eq!(
            fitter.resolve_mode(FitMode::Auto, Some(&small)),
            FitOrigin::Static
        );
        assert_eq!(
            fitter.resolve_mode(FitMode::Auto, Some(&large)),
            FitOrigin::Dynamic
        );
    }

    #[test]
    fn test_dynamic_without_traces_is_an_error() {
        let graph = chain_graph();
        let fitter = MechanismFitter::new(FittingConfig::default());
        let err = fitter.fit(&graph, None, FitOrigin::Dynamic).unwrap_err();
        assert!(matches!(err, FittingError::InsufficientSamples { .. }));
    }

    #[test]
    fn test_dynamic_fit_through_native_boundary() {
        let graph = chain_graph();
        let fitter = MechanismFitter::new(FittingConfig::default());
        let xs: Vec<f64> = (0..200).map(|i| i as f64 / 3.0).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 5.0 * x - 2.0).collect();
        let traces = TraceTable::from_columns([("x", xs), ("y", ys)]);

        let scm = fitter.fit(&graph, Some(&traces), FitOrigin::Dynamic).unwrap();
        assert!(scm.is_dynamic());
        let predicted = scm.mechanism("y").unwrap().predict(&[3.0]).unwrap();
        assert!((predicted - 13.0).abs() < 1e-6);
    }

    #[test]
    fn test_version_mismatch_rejected() {
        use crate::mechanism::boundary::{FitDiagnostics, ScmDoc};
        use std::collections::BTreeMap;

        struct StaleBoundary;
        impl FittingBoundary for StaleBoundary {
            fn fit(&self, _request: &FitRequest) -> Result<FitResponse, FittingError> {
                Ok(FitResponse::Success {
                    version: PROTOCOL_VERSION + 1,
                    scm: ScmDoc {
                        mechanisms: BTreeMap::new(),
                    },
                    validation: FitDiagnostics {
                        r2_scores: BTreeMap::new(),
                        mean_r2: 1.0,
                        passed: true,
                    },
                })
            }
        }

        let graph = chain_graph();
        let fitter =
            MechanismFitter::with_boundary(FittingConfig::default(), Arc::new(StaleBoundary));
        let traces = TraceTable::from_columns([("x", vec![1.0; 4]), ("y", vec![2.0; 4])]);
        let err = fitter.fit_dynamic(&graph, &traces).unwrap_err();
        assert!(matches!(err, FittingError::ProtocolMismatch { .. }));
    }
}
