//! Causal graph — petgraph `StableDiGraph` with typed variable/parameter/
//! function nodes and data-flow/control-flow edges.

pub mod extractor;
pub mod types;

pub use extractor::GraphExtractor;
pub use types::{
    CausalEdge, CausalGraph, CausalNode, EdgeDoc, EdgeKind, GraphDoc, NodeDoc, NodeKind,
};
