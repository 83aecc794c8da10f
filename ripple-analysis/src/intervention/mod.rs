//! Intervention simulation over a fitted model — "what happens downstream
//! if this node changes" — plus pure path queries over the causal graph.

pub mod engine;
pub mod paths;
pub mod types;

pub use engine::InterventionEngine;
pub use paths::causal_paths;
pub use types::{
    InterventionKind, InterventionResult, InterventionSpec, NodeEstimate, SoftTransform,
};
