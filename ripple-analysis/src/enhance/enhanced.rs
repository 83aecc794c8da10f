//! Enhanced IR — a read-only façade over a base specification object plus
//! whatever causal results enhancement produced.
//!
//! The base object is borrowed, never copied, and every one of its
//! accessors is reachable through `Deref`. Derived causal state (the
//! impact index) is computed on first access and memoized; the façade is
//! immutable, so no invalidation ever happens.

use std::collections::BTreeMap;
use std::ops::Deref;

use once_cell::sync::OnceCell;
use tracing::debug;

use ripple_core::types::collections::FxHashMap;

use crate::enhance::orchestrator::Enhancement;
use crate::graph::CausalGraph;
use crate::intervention::{paths, InterventionResult, InterventionSpec};
use crate::mechanism::FitOrigin;
use crate::scm::StructuralCausalModel;
use crate::validate::ValidationResult;

/// Path-count saturation cap for impact scoring.
const MAX_COUNTED_PATHS: u64 = 10_000;

/// Read-only causal façade over a base specification object.
pub struct EnhancedIR<'a, S> {
    base: &'a S,
    enhancement: Enhancement,
    impact: OnceCell<ImpactIndex>,
}

impl<'a, S> EnhancedIR<'a, S> {
    pub fn new(base: &'a S, enhancement: Enhancement) -> Self {
        Self {
            base,
            enhancement,
            impact: OnceCell::new(),
        }
    }

    /// The wrapped base object.
    pub fn base(&self) -> &S {
        self.base
    }

    /// True when causal structure was extracted for this unit.
    pub fn has_causal_capabilities(&self) -> bool {
        self.enhancement.graph.is_some()
    }

    /// Resolved fit mode, when a model was built.
    pub fn causal_mode(&self) -> Option<FitOrigin> {
        self.enhancement.mode_used
    }

    pub fn causal_warnings(&self) -> &[String] {
        &self.enhancement.warnings
    }

    pub fn causal_graph(&self) -> Option<&CausalGraph> {
        self.enhancement.graph.as_deref()
    }

    pub fn causal_model(&self) -> Option<&StructuralCausalModel> {
        self.enhancement.scm.as_deref()
    }

    pub fn causal_validation(&self) -> Option<&ValidationResult> {
        self.enhancement.validation.as_ref()
    }

    /// Simulate an intervention. Returns `None`, never an error, when no
    /// numerically-fitted model is available or the query fails.
    pub fn causal_intervention(
        &self,
        intervention: &InterventionSpec,
        query_nodes: &[&str],
        n_samples: usize,
    ) -> Option<InterventionResult> {
        let engine = self.enhancement.engine.as_ref()?;
        match engine.estimate_impact(intervention, query_nodes, n_samples) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!(error = %e, "intervention query unavailable");
                None
            }
        }
    }

    /// Simple directed paths between two nodes; empty without a graph.
    pub fn causal_paths(&self, source: &str, target: &str, max_paths: usize) -> Vec<Vec<String>> {
        match self.causal_graph() {
            Some(graph) => paths::causal_paths(graph, source, target, max_paths),
            None => Vec::new(),
        }
    }

    /// Downstream impact magnitudes for `node`, normalized to [0, 1].
    ///
    /// Derived from directed path counts, weighted by fitted-mechanism
    /// sensitivity when a dynamic model is available. Unknown nodes and
    /// graph-less enhancements yield an empty map, never an error.
    pub fn causal_impact(&self, node: &str) -> BTreeMap<String, f64> {
        let index = self.impact.get_or_init(|| {
            ImpactIndex::build(
                self.enhancement.graph.as_deref(),
                self.enhancement.scm.as_deref(),
            )
        });
        index.downstream(node)
    }
}

impl<S> Deref for EnhancedIR<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.base
    }
}

/// Memoized per-source impact maps.
struct ImpactIndex {
    per_source: FxHashMap<String, BTreeMap<String, f64>>,
}

impl ImpactIndex {
    fn build(graph: Option<&CausalGraph>, scm: Option<&StructuralCausalModel>) -> Self {
        let mut per_source = FxHashMap::default();
        let Some(graph) = graph else {
            return Self { per_source };
        };
        let Ok(order) = graph.topological_order() else {
            return Self { per_source };
        };

        for source in graph.node_ids() {
            let counts = path_counts(graph, source, &order);
            let mut raw: BTreeMap<String, f64> = BTreeMap::new();
            for (target, count) in counts {
                if target == source || count == 0 {
                    continue;
                }
                let weight = scm
                    .and_then(|scm| scm.mechanism(&target))
                    .and_then(|m| m.sensitivity())
                    .map(|s| s.max(1e-3))
                    .unwrap_or(1.0);
                raw.insert(target, count as f64 * weight);
            }

            let max = raw.values().cloned().fold(0.0f64, f64::max);
            if max > 0.0 {
                for value in raw.values_mut() {
                    *value = (*value / max).clamp(0.0, 1.0);
                }
            }
            per_source.insert(source.to_string(), raw);
        }

        Self { per_source }
    }

    fn downstream(&self, node: &str) -> BTreeMap<String, f64> {
        self.per_source.get(node).cloned().unwrap_or_default()
    }
}

/// Directed path counts from `source` to every node, via one DP sweep over
/// the topological order. Counts saturate at [`MAX_COUNTED_PATHS`].
fn path_counts(
    graph: &CausalGraph,
    source: &str,
    topo_order: &[String],
) -> FxHashMap<String, u64> {
    let mut counts: FxHashMap<String, u64> = FxHashMap::default();
    counts.insert(source.to_string(), 1);

    let start = topo_order.iter().position(|id| id == source);
    let Some(start) = start else {
        return counts;
    };

    for id in &topo_order[start..] {
        let Some(&count) = counts.get(id.as_str()) else {
            continue;
        };
        if count == 0 {
            continue;
        }
        for child in graph.children(id) {
            let entry = counts.entry(child).or_insert(0);
            *entry = entry.saturating_add(count).min(MAX_COUNTED_PATHS);
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enhance::CausalEnhancer;
    use ripple_core::config::{FitMode, RippleConfig};
    use ripple_core::types::unit::{CodeUnit, Statement};

    struct BaseSpec {
        title: String,
    }

    impl BaseSpec {
        fn title(&self) -> &str {
            &self.title
        }
    }

    fn chain_unit() -> CodeUnit {
        CodeUnit::new("chain")
            .with_parameters(&["x"])
            .with_statement(Statement::assign(&["x"], &["y"], None, 1))
            .with_statement(Statement::assign(&["y"], &["z"], None, 2))
    }

    #[test]
    fn test_deref_delegates_to_base() {
        let base = BaseSpec {
            title: "unit spec".to_string(),
        };
        let enhancer = CausalEnhancer::new(RippleConfig::default());
        let ir = enhancer.enhance_ir(&base, &chain_unit(), None, None, FitMode::Static);

        assert_eq!(ir.title(), "unit spec");
        assert!(ir.has_causal_capabilities());
    }

    #[test]
    fn test_impact_map_is_normalized_and_cached() {
        let base = ();
        let enhancer = CausalEnhancer::new(RippleConfig::default());
        let ir = enhancer.enhance_ir(&base, &chain_unit(), None, None, FitMode::Static);

        let impact = ir.causal_impact("x");
        assert_eq!(impact.len(), 2); // y and z downstream
        assert!(impact.values().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(impact.values().any(|&v| v == 1.0));

        // Second call hits the memoized index.
        assert_eq!(ir.causal_impact("x"), impact);
    }

    #[test]
    fn test_unknown_node_gives_empty_map() {
        let base = ();
        let enhancer = CausalEnhancer::new(RippleConfig::default());
        let ir = enhancer.enhance_ir(&base, &chain_unit(), None, None, FitMode::Static);

        assert!(ir.causal_impact("ghost").is_empty());
    }
}
