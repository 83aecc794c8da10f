//! Structural causal model — a frozen causal graph plus one mechanism per
//! node.
//!
//! Models are only ever constructed fully fitted (by the mechanism fitter
//! or the persisted-form loader) and expose no mutators afterwards, so
//! downstream consumers can cache derived state without invalidation.

use std::sync::Arc;

use ripple_core::types::collections::FxHashMap;

use crate::graph::CausalGraph;
use crate::mechanism::{FitOrigin, Mechanism};

/// An immutable fitted model over one code unit.
#[derive(Debug, Clone)]
pub struct StructuralCausalModel {
    graph: Arc<CausalGraph>,
    mechanisms: FxHashMap<String, Mechanism>,
    origin: FitOrigin,
}

impl StructuralCausalModel {
    pub(crate) fn new(
        graph: Arc<CausalGraph>,
        mechanisms: FxHashMap<String, Mechanism>,
        origin: FitOrigin,
    ) -> Self {
        Self {
            graph,
            mechanisms,
            origin,
        }
    }

    pub fn graph(&self) -> &CausalGraph {
        &self.graph
    }

    pub fn graph_arc(&self) -> Arc<CausalGraph> {
        Arc::clone(&self.graph)
    }

    pub fn mechanism(&self, node_id: &str) -> Option<&Mechanism> {
        self.mechanisms.get(node_id)
    }

    pub fn mechanisms(&self) -> impl Iterator<Item = (&str, &Mechanism)> {
        self.mechanisms.iter().map(|(id, m)| (id.as_str(), m))
    }

    pub fn origin(&self) -> FitOrigin {
        self.origin
    }

    /// True when mechanisms carry numeric parameters (dynamic fit).
    pub fn is_dynamic(&self) -> bool {
        self.origin == FitOrigin::Dynamic
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}
