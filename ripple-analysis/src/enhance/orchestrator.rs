//! The enhancement orchestrator.
//!
//! Chains extraction → fitting → validation into one call under a strict
//! no-block contract: a unit that cannot be causally analyzed yields a
//! degraded enhancement plus warnings, never an error. The underlying
//! specification workflow is never gated on causal analysis succeeding.

use std::sync::Arc;

use tracing::{debug, warn};

use ripple_core::config::{FitMode, RippleConfig};
use ripple_core::errors::CausalError;
use ripple_core::types::unit::{CallGraphInput, CodeUnit};
use ripple_core::types::TraceTable;

use crate::enhance::breaker::{BreakerState, CircuitBreaker};
use crate::enhance::enhanced::EnhancedIR;
use crate::graph::{CausalGraph, GraphExtractor};
use crate::intervention::InterventionEngine;
use crate::mechanism::{FitOrigin, FittingBoundary, MechanismFitter};
use crate::scm::StructuralCausalModel;
use crate::validate::{ValidationResult, Validator};

/// Everything one `enhance` call produced. All causal fields are nullable;
/// `warnings` explains whatever is missing.
#[derive(Debug, Clone, Default)]
pub struct Enhancement {
    pub graph: Option<Arc<CausalGraph>>,
    pub scm: Option<Arc<StructuralCausalModel>>,
    pub engine: Option<InterventionEngine>,
    pub validation: Option<ValidationResult>,
    /// Resolved fit mode, present when a model was built.
    pub mode_used: Option<FitOrigin>,
    pub warnings: Vec<String>,
}

impl Enhancement {
    fn unavailable(warnings: Vec<String>) -> Self {
        Self {
            warnings,
            ..Default::default()
        }
    }
}

/// Orchestrates the causal analysis pipeline for one code unit.
pub struct CausalEnhancer {
    extractor: GraphExtractor,
    fitter: MechanismFitter,
    validator: Validator,
    breaker: CircuitBreaker,
    validate_after_fit: bool,
}

impl CausalEnhancer {
    pub fn new(config: RippleConfig) -> Self {
        let fitter = MechanismFitter::new(config.fitting.clone());
        Self::assemble(config, fitter)
    }

    /// Build an enhancer around an explicit fitting boundary (tests,
    /// embedded fitting services).
    pub fn with_boundary(config: RippleConfig, boundary: Arc<dyn FittingBoundary>) -> Self {
        let fitter = MechanismFitter::with_boundary(config.fitting.clone(), boundary);
        Self::assemble(config, fitter)
    }

    fn assemble(config: RippleConfig, fitter: MechanismFitter) -> Self {
        Self {
            extractor: GraphExtractor::new(config.extraction.clone()),
            validator: Validator::new(config.validation.clone()),
            breaker: CircuitBreaker::new(config.enhance.effective_breaker_threshold()),
            validate_after_fit: config.enhance.effective_validate_after_fit(),
            fitter,
        }
    }

    /// Run the pipeline. Never returns an error: degraded outcomes carry
    /// warnings instead.
    pub fn enhance(
        &self,
        unit: &CodeUnit,
        call_graph: Option<&CallGraphInput>,
        traces: Option<&TraceTable>,
        mode: FitMode,
    ) -> Enhancement {
        let mut warnings = Vec::new();

        let graph = match self.extractor.extract(unit, call_graph) {
            Ok(graph) => Arc::new(graph),
            Err(e) => {
                warn!(unit = %unit.name, error = %e, "causal graph extraction failed");
                warnings.push(format!("causal analysis unavailable: {e}"));
                return Enhancement::unavailable(warnings);
            }
        };

        let origin = self.fitter.resolve_mode(mode, traces);
        debug!(unit = %unit.name, mode = origin.name(), "fitting mechanisms");

        let scm = match origin {
            FitOrigin::Static => Some(self.fitter.fit_static(&graph)),
            FitOrigin::Dynamic => {
                if self.breaker.is_open() {
                    let open = CausalError::CircuitOpen {
                        failures: self.breaker.failures(),
                    };
                    warn!(unit = %unit.name, "{open}");
                    warnings.push(open.to_string());
                    None
                } else {
                    match self.fitter.fit(&graph, traces, FitOrigin::Dynamic) {
                        Ok(scm) => {
                            self.breaker.record_success();
                            Some(scm)
                        }
                        Err(e) => {
                            let failures = self.breaker.record_failure();
                            warn!(unit = %unit.name, failures, error = %e, "mechanism fitting failed");
                            warnings.push(format!("mechanism fitting failed: {e}"));
                            None
                        }
                    }
                }
            }
        };

        let mut validation = None;
        if let (Some(scm), Some(traces)) = (scm.as_ref(), traces) {
            if scm.is_dynamic() && self.validate_after_fit {
                match self.validator.cross_validate(scm, traces) {
                    Ok(result) => validation = Some(result),
                    Err(e) => {
                        warn!(unit = %unit.name, error = %e, "model validation failed");
                        warnings.push(format!("model validation failed: {e}"));
                    }
                }
            }
        }

        let mode_used = scm.as_ref().map(|s| s.origin());
        let scm = scm.map(Arc::new);
        let engine = scm.as_ref().map(|scm| InterventionEngine::new(Arc::clone(scm)));

        Enhancement {
            graph: Some(graph),
            scm,
            engine,
            validation,
            mode_used,
            warnings,
        }
    }

    /// Run the pipeline and wrap the result around a base specification
    /// object.
    pub fn enhance_ir<'a, S>(
        &self,
        base: &'a S,
        unit: &CodeUnit,
        call_graph: Option<&CallGraphInput>,
        traces: Option<&TraceTable>,
        mode: FitMode,
    ) -> EnhancedIR<'a, S> {
        EnhancedIR::new(base, self.enhance(unit, call_graph, traces, mode))
    }

    /// Close the circuit breaker, re-enabling fitting attempts.
    pub fn reset(&self) {
        self.breaker.reset();
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }
}
