//! End-to-end enhancement scenarios: degradation policy, circuit breaker,
//! and the enhanced-IR façade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ripple_analysis::enhance::{BreakerState, CausalEnhancer};
use ripple_analysis::intervention::InterventionSpec;
use ripple_analysis::mechanism::{
    FitOrigin, FitRequest, FitResponse, FittingBoundary, NativeBoundary,
};
use ripple_core::config::{FitMode, RippleConfig};
use ripple_core::errors::FittingError;
use ripple_core::types::unit::{CodeUnit, Statement};
use ripple_core::types::TraceTable;

/// Boundary double that counts invocations and always fails.
struct FailingBoundary {
    invocations: AtomicUsize,
}

impl FailingBoundary {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            invocations: AtomicUsize::new(0),
        })
    }

    fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl FittingBoundary for FailingBoundary {
    fn fit(&self, _request: &FitRequest) -> Result<FitResponse, FittingError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Err(FittingError::Service {
            message: "fitting backend offline".to_string(),
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn chain_unit() -> CodeUnit {
    CodeUnit::new("chain")
        .with_parameters(&["x"])
        .with_statement(Statement::assign(&["x"], &["y"], None, 1))
        .with_statement(Statement::assign(&["y"], &["z"], None, 2))
}

fn chain_traces(n: usize) -> TraceTable {
    let xs: Vec<f64> = (0..n).map(|i| i as f64 / 7.0).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x).collect();
    let zs: Vec<f64> = ys.iter().map(|y| 3.0 * y).collect();
    TraceTable::from_columns([("x", xs), ("y", ys), ("z", zs)])
}

#[test]
fn test_auto_mode_without_traces_is_static() {
    let enhancer = CausalEnhancer::new(RippleConfig::default());
    let base = ();
    let ir = enhancer.enhance_ir(&base, &chain_unit(), None, None, FitMode::Auto);

    assert!(ir.has_causal_capabilities());
    assert_eq!(ir.causal_mode(), Some(FitOrigin::Static));

    // Numeric intervention has nothing to simulate with.
    let result = ir.causal_intervention(&InterventionSpec::hard("x", 1.0), &["z"], 50);
    assert!(result.is_none());

    // Structure queries still work.
    assert_eq!(ir.causal_paths("x", "z", 10).len(), 1);
}

#[test]
fn test_auto_mode_with_enough_traces_goes_dynamic() {
    let enhancer = CausalEnhancer::new(RippleConfig::default());
    let traces = chain_traces(150);
    let enhancement = enhancer.enhance(&chain_unit(), None, Some(&traces), FitMode::Auto);

    assert_eq!(enhancement.mode_used, Some(FitOrigin::Dynamic));
    assert!(enhancement.warnings.is_empty(), "{:?}", enhancement.warnings);
    assert!(enhancement.validation.is_some());
    assert!(enhancement.validation.unwrap().passed);

    let engine = enhancement.engine.unwrap();
    let result = engine
        .estimate_impact(&InterventionSpec::hard("x", 10.0), &["z"], 200)
        .unwrap();
    assert!((result.estimate_for("z").unwrap().mean - 60.0).abs() < 2.0);
}

#[test]
fn test_extraction_failure_degrades_to_unenhanced() {
    let enhancer = CausalEnhancer::new(RippleConfig::default());
    let base = 7u32;
    let ir = enhancer.enhance_ir(&base, &CodeUnit::new("hollow"), None, None, FitMode::Auto);

    assert!(!ir.has_causal_capabilities());
    assert_eq!(ir.causal_mode(), None);
    assert!(!ir.causal_warnings().is_empty());
    assert!(ir.causal_graph().is_none());
    assert!(ir.causal_impact("x").is_empty());

    // The base object stays fully usable.
    assert_eq!(*ir, 7u32);
}

#[test]
fn test_fitting_failure_returns_graph_only() {
    init_tracing();
    let boundary = FailingBoundary::new();
    let shared: Arc<dyn FittingBoundary> = boundary.clone();
    let enhancer = CausalEnhancer::with_boundary(RippleConfig::default(), shared);
    let traces = chain_traces(150);
    let enhancement = enhancer.enhance(&chain_unit(), None, Some(&traces), FitMode::Dynamic);

    assert!(enhancement.graph.is_some(), "partial success keeps the graph");
    assert!(enhancement.scm.is_none());
    assert!(enhancement.engine.is_none());
    assert_eq!(enhancement.mode_used, None);
    assert_eq!(enhancement.warnings.len(), 1);
    assert!(enhancement.warnings[0].contains("fitting backend offline"));
}

#[test]
fn test_breaker_opens_after_three_failures_and_reset_closes_it() {
    init_tracing();
    let boundary = FailingBoundary::new();
    let shared: Arc<dyn FittingBoundary> = boundary.clone();
    let enhancer = CausalEnhancer::with_boundary(RippleConfig::default(), shared);
    let traces = chain_traces(150);
    let unit = chain_unit();

    for _ in 0..3 {
        enhancer.enhance(&unit, None, Some(&traces), FitMode::Dynamic);
    }
    assert_eq!(boundary.invocations(), 3);
    assert_eq!(enhancer.breaker_state(), BreakerState::Open);

    // 4th call skips the boundary entirely.
    let enhancement = enhancer.enhance(&unit, None, Some(&traces), FitMode::Dynamic);
    assert_eq!(boundary.invocations(), 3);
    assert!(enhancement.scm.is_none());
    assert!(enhancement
        .warnings
        .iter()
        .any(|w| w.to_lowercase().contains("circuit open")));

    enhancer.reset();
    assert_eq!(enhancer.breaker_state(), BreakerState::Closed);
    enhancer.enhance(&unit, None, Some(&traces), FitMode::Dynamic);
    assert_eq!(boundary.invocations(), 4);
}

#[test]
fn test_successful_fit_leaves_breaker_closed() {
    let boundary: Arc<dyn FittingBoundary> = Arc::new(NativeBoundary);
    let enhancer = CausalEnhancer::with_boundary(RippleConfig::default(), boundary);
    let traces = chain_traces(150);
    let enhancement = enhancer.enhance(&chain_unit(), None, Some(&traces), FitMode::Dynamic);

    assert_eq!(enhancement.mode_used, Some(FitOrigin::Dynamic));
    assert_eq!(enhancer.breaker_state(), BreakerState::Closed);
}

#[test]
fn test_enhanced_ir_full_dynamic_surface() {
    struct Spec {
        name: &'static str,
    }

    let base = Spec { name: "unit-7" };
    let enhancer = CausalEnhancer::new(RippleConfig::default());
    let traces = chain_traces(200);
    let ir = enhancer.enhance_ir(&base, &chain_unit(), None, Some(&traces), FitMode::Auto);

    // Delegation.
    assert_eq!(ir.name, "unit-7");

    // Eager accessors.
    assert!(ir.has_causal_capabilities());
    assert_eq!(ir.causal_mode(), Some(FitOrigin::Dynamic));
    assert!(ir.causal_warnings().is_empty());

    // Lazy impact index: x reaches y and z; z sits behind the larger
    // fitted coefficient, so it carries the larger magnitude.
    let impact = ir.causal_impact("x");
    assert_eq!(impact.len(), 2);
    assert!(impact["z"] >= impact["y"]);
    assert!(impact.values().all(|&v| (0.0..=1.0).contains(&v)));

    // Numeric intervention through the façade.
    let result = ir
        .causal_intervention(&InterventionSpec::hard("y", 4.0), &["y", "z"], 300)
        .unwrap();
    assert_eq!(result.estimate_for("y").unwrap().mean, 4.0);
    assert!((result.estimate_for("z").unwrap().mean - 12.0).abs() < 1.0);
}
