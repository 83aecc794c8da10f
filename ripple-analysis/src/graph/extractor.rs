//! Causal graph extraction from a code unit's variable-flow structure.
//!
//! One node per assigned variable, parameter, and return site. Data-flow
//! edges run from every variable a statement reads to every variable it
//! writes; control-flow edges run from a region's condition variables to
//! variables assigned exclusively inside that region. Loop-carried
//! reassignment collapses into a single node representing the post-loop
//! value, so the output is always a DAG.

use petgraph::visit::{EdgeRef, IntoEdgeReferences};

use ripple_core::config::ExtractionConfig;
use ripple_core::errors::ExtractionError;
use ripple_core::types::collections::{FxHashMap, FxHashSet};
use ripple_core::types::unit::{
    CallGraphInput, CodeUnit, RegionKind, SourceLocation, StatementKind,
};

use super::types::{CausalEdge, CausalGraph, CausalNode, EdgeKind, NodeKind};

/// Node id of the unit's collapsed return site.
pub const RETURN_NODE: &str = "return";

/// Classification of sink writes, used by the pruning pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkOrigin {
    Emit,
    Persist,
}

/// Builds a [`CausalGraph`] from a [`CodeUnit`].
#[derive(Debug, Default)]
pub struct GraphExtractor {
    config: ExtractionConfig,
}

impl GraphExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Extract the causal graph for one unit, plus optional function-level
    /// call edges.
    pub fn extract(
        &self,
        unit: &CodeUnit,
        call_graph: Option<&CallGraphInput>,
    ) -> Result<CausalGraph, ExtractionError> {
        if unit.statements.is_empty() && unit.parameters.is_empty() {
            return Err(ExtractionError::EmptyUnit {
                unit: unit.name.clone(),
            });
        }
        for statement in &unit.statements {
            if let Some(region) = statement.region {
                if unit.region(region).is_none() {
                    return Err(ExtractionError::UnknownRegion {
                        line: statement.location.line,
                        region,
                    });
                }
            }
        }

        let mut graph = CausalGraph::new();
        let mut sink_origin: FxHashMap<String, SinkOrigin> = FxHashMap::default();
        // Statement index of each variable's first write; parameters are
        // written "before" every statement.
        let mut first_write: FxHashMap<String, i64> = FxHashMap::default();
        // Loop regions each variable is written in.
        let mut loop_written: FxHashMap<String, FxHashSet<u32>> = FxHashMap::default();

        for param in &unit.parameters {
            graph.add_node(CausalNode {
                id: param.clone(),
                kind: NodeKind::Parameter,
                location: SourceLocation::default(),
            });
            first_write.insert(param.clone(), -1);
        }

        // First pass: create nodes and record write metadata.
        for (index, statement) in unit.statements.iter().enumerate() {
            let in_loop = statement
                .region
                .and_then(|r| unit.region(r))
                .filter(|r| r.kind == RegionKind::Loop)
                .map(|r| r.id);

            for write in &statement.writes {
                graph.add_node(CausalNode {
                    id: write.clone(),
                    kind: NodeKind::Variable,
                    location: statement.location.clone(),
                });
                first_write.entry(write.clone()).or_insert(index as i64);
                if let Some(region) = in_loop {
                    loop_written.entry(write.clone()).or_default().insert(region);
                }
                match statement.kind {
                    StatementKind::Emit => {
                        sink_origin.entry(write.clone()).or_insert(SinkOrigin::Emit);
                    }
                    StatementKind::Persist => {
                        sink_origin.insert(write.clone(), SinkOrigin::Persist);
                    }
                    _ => {}
                }
            }
            if statement.kind == StatementKind::Return {
                graph.add_node(CausalNode {
                    id: RETURN_NODE.to_string(),
                    kind: NodeKind::Variable,
                    location: statement.location.clone(),
                });
            }
        }

        // Second pass: data-flow edges from reads to writes. Reads of
        // never-written variables become root nodes (external inputs).
        for statement in &unit.statements {
            for read in &statement.reads {
                let from = graph.add_node(CausalNode {
                    id: read.clone(),
                    kind: NodeKind::Variable,
                    location: statement.location.clone(),
                });
                first_write.entry(read.clone()).or_insert(-1);

                for write in &statement.writes {
                    if write == read {
                        continue; // collapse rule: no self-edges
                    }
                    let to = graph
                        .node_index(write)
                        .expect("write nodes created in first pass");
                    graph.add_edge(from, to, CausalEdge { kind: EdgeKind::DataFlow });
                }
                if statement.kind == StatementKind::Return && read != RETURN_NODE {
                    let to = graph.node_index(RETURN_NODE).expect("return node exists");
                    graph.add_edge(from, to, CausalEdge { kind: EdgeKind::DataFlow });
                }
            }
        }

        // Third pass: control-flow edges from condition variables to
        // variables assigned exclusively inside the region.
        for region in &unit.regions {
            let mut inside: FxHashSet<&str> = FxHashSet::default();
            let mut outside: FxHashSet<&str> = FxHashSet::default();
            for statement in &unit.statements {
                let bucket = if statement.region == Some(region.id) {
                    &mut inside
                } else {
                    &mut outside
                };
                for write in &statement.writes {
                    bucket.insert(write.as_str());
                }
            }

            for condition in &region.condition_reads {
                let from = graph.add_node(CausalNode {
                    id: condition.clone(),
                    kind: NodeKind::Variable,
                    location: SourceLocation::default(),
                });
                first_write.entry(condition.clone()).or_insert(-1);
                for write in inside.difference(&outside) {
                    if *write == condition.as_str() {
                        continue;
                    }
                    let to = graph.node_index(write).expect("write nodes exist");
                    graph.add_edge(from, to, CausalEdge { kind: EdgeKind::ControlFlow });
                }
            }
        }

        // Optional function-level call edges. A call edge that would close
        // a cycle (recursion) is dropped; the collapsed node already
        // represents the fixed point.
        if let Some(calls) = call_graph {
            for function in &calls.functions {
                graph.add_node(CausalNode {
                    id: function.clone(),
                    kind: NodeKind::Function,
                    location: SourceLocation::default(),
                });
            }
            for (caller, callee) in &calls.calls {
                if caller == callee {
                    continue;
                }
                let from = graph.add_node(CausalNode {
                    id: caller.clone(),
                    kind: NodeKind::Function,
                    location: SourceLocation::default(),
                });
                let to = graph.add_node(CausalNode {
                    id: callee.clone(),
                    kind: NodeKind::Function,
                    location: SourceLocation::default(),
                });
                if petgraph::algo::has_path_connecting(&graph.graph, to, from, None) {
                    continue;
                }
                graph.add_edge(from, to, CausalEdge { kind: EdgeKind::DataFlow });
            }
        }

        if !graph.is_acyclic() {
            Self::collapse_loop_cycles(&mut graph, &first_write, &loop_written);
        }
        if let Err(err) = graph.topological_order() {
            return Err(err);
        }

        self.prune(&mut graph, &sink_origin);

        Ok(graph)
    }

    /// Remove loop-carried back edges: an edge whose endpoints are both
    /// written inside the same loop region and whose source is first
    /// written after its target reads the previous iteration's value, which
    /// the collapsed node already represents.
    fn collapse_loop_cycles(
        graph: &mut CausalGraph,
        first_write: &FxHashMap<String, i64>,
        loop_written: &FxHashMap<String, FxHashSet<u32>>,
    ) {
        let mut to_remove = Vec::new();
        for edge in graph.graph.edge_references() {
            let from = &graph.graph[edge.source()].id;
            let to = &graph.graph[edge.target()].id;
            let shared_loop = match (loop_written.get(from), loop_written.get(to)) {
                (Some(a), Some(b)) => !a.is_disjoint(b),
                _ => false,
            };
            if !shared_loop {
                continue;
            }
            let from_written = first_write.get(from).copied().unwrap_or(-1);
            let to_written = first_write.get(to).copied().unwrap_or(-1);
            if from_written >= to_written {
                to_remove.push(edge.id());
            }
        }
        for edge in to_remove {
            graph.graph.remove_edge(edge);
        }
    }

    /// Drop write-only diagnostic sinks per the configured policy. Removal
    /// iterates to a fixed point so emit-only chains disappear entirely.
    fn prune(&self, graph: &mut CausalGraph, sink_origin: &FxHashMap<String, SinkOrigin>) {
        let prune_emit = self.config.effective_prune_emit_sinks();
        let keep_persist = self.config.effective_keep_persist_sinks();

        loop {
            let mut removed = false;
            let candidates: Vec<String> = graph
                .node_ids()
                .filter(|id| {
                    let prunable = match sink_origin.get(*id) {
                        Some(SinkOrigin::Emit) => prune_emit,
                        Some(SinkOrigin::Persist) => !keep_persist,
                        None => false,
                    };
                    prunable && !self.config.never_prune.iter().any(|n| n == *id)
                })
                .map(|id| id.to_string())
                .collect();

            for id in candidates {
                if graph.children(&id).is_empty() {
                    graph.remove_node(&id);
                    removed = true;
                }
            }
            if !removed {
                break;
            }
        }
    }
}
