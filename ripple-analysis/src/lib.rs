//! Ripple causal analysis engine.
//!
//! Given a code unit's variable-flow structure (and optionally a table of
//! sampled executions), the engine builds a causal DAG, fits a structural
//! causal model over it, validates the fit statistically, and answers
//! "what happens if X changes" queries with confidence bounds. Analysis is
//! strictly additive: a unit that cannot be analyzed degrades to an
//! unenhanced view, never an error.

pub mod enhance;
pub mod graph;
pub mod intervention;
pub mod mechanism;
pub mod scm;
pub mod stats;
pub mod validate;

pub use enhance::{CausalEnhancer, EnhancedIR, Enhancement};
pub use graph::{CausalEdge, CausalGraph, CausalNode, EdgeKind, GraphExtractor, NodeKind};
pub use intervention::{
    InterventionEngine, InterventionKind, InterventionResult, InterventionSpec,
};
pub use mechanism::{FitOrigin, FittingBoundary, Mechanism, MechanismFitter, MechanismKind};
pub use scm::StructuralCausalModel;
pub use validate::{ValidationResult, Validator};
