//! Causal graph structures.

use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use ripple_core::errors::ExtractionError;
use ripple_core::types::collections::FxHashMap;
use ripple_core::types::unit::SourceLocation;

/// What a causal node represents in the analyzed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Variable,
    Function,
    Parameter,
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Function => "function",
            Self::Parameter => "parameter",
        }
    }
}

/// A node of the causal graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalNode {
    pub id: String,
    pub kind: NodeKind,
    pub location: SourceLocation,
}

/// How a dependency was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    DataFlow,
    ControlFlow,
}

/// A directed dependency between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CausalEdge {
    pub kind: EdgeKind,
}

/// Directed acyclic causal graph over one code unit.
#[derive(Debug, Clone, Default)]
pub struct CausalGraph {
    pub graph: StableDiGraph<CausalNode, CausalEdge>,
    index: FxHashMap<String, NodeIndex>,
}

impl CausalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning the existing index if the id is already known.
    pub fn add_node(&mut self, node: CausalNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Add an edge between two known nodes. Duplicate edges of the same
    /// kind are ignored.
    pub fn add_edge(&mut self, from: NodeIndex, to: NodeIndex, edge: CausalEdge) {
        let exists = self
            .graph
            .edges_connecting(from, to)
            .any(|e| e.weight().kind == edge.kind);
        if !exists {
            self.graph.add_edge(from, to, edge);
        }
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&CausalNode> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|n| n.id.as_str())
    }

    /// Parent node ids of `id`, in deterministic (sorted) order.
    pub fn parents(&self, id: &str) -> Vec<String> {
        let mut parents: Vec<String> = match self.node_index(id) {
            Some(idx) => self
                .graph
                .neighbors_directed(idx, Direction::Incoming)
                .map(|p| self.graph[p].id.clone())
                .collect(),
            None => Vec::new(),
        };
        parents.sort();
        parents.dedup();
        parents
    }

    /// Child node ids of `id`.
    pub fn children(&self, id: &str) -> Vec<String> {
        let mut children: Vec<String> = match self.node_index(id) {
            Some(idx) => self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .map(|c| self.graph[c].id.clone())
                .collect(),
            None => Vec::new(),
        };
        children.sort();
        children.dedup();
        children
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.node_index(id)
            .map(|idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .unwrap_or(false)
    }

    pub fn is_acyclic(&self) -> bool {
        !petgraph::algo::is_cyclic_directed(&self.graph)
    }

    /// Node ids in topological order (parents before children).
    pub fn topological_order(&self) -> Result<Vec<String>, ExtractionError> {
        petgraph::algo::toposort(&self.graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .map(|idx| self.graph[idx].id.clone())
                    .collect()
            })
            .map_err(|cycle| ExtractionError::CyclicDependency {
                cycle: self.graph[cycle.node_id()].id.clone(),
            })
    }

    /// Remove a node and all its edges.
    pub fn remove_node(&mut self, id: &str) {
        if let Some(idx) = self.index.remove(id) {
            self.graph.remove_node(idx);
        }
    }

    /// Convert to a serializable document (nodes + edges).
    pub fn to_doc(&self) -> GraphDoc {
        let mut nodes: Vec<NodeDoc> = self
            .graph
            .node_weights()
            .map(|n| NodeDoc {
                id: n.id.clone(),
                kind: n.kind,
                location: n.location.clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<EdgeDoc> = self
            .graph
            .edge_references()
            .map(|e| EdgeDoc {
                from: self.graph[e.source()].id.clone(),
                to: self.graph[e.target()].id.clone(),
                kind: e.weight().kind,
            })
            .collect();
        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

        GraphDoc { nodes, edges }
    }

    /// Rebuild a graph from a document. Edges naming unknown nodes are
    /// dropped.
    pub fn from_doc(doc: &GraphDoc) -> Self {
        let mut graph = Self::new();
        for node in &doc.nodes {
            graph.add_node(CausalNode {
                id: node.id.clone(),
                kind: node.kind,
                location: node.location.clone(),
            });
        }
        for edge in &doc.edges {
            if let (Some(from), Some(to)) =
                (graph.node_index(&edge.from), graph.node_index(&edge.to))
            {
                graph.add_edge(from, to, CausalEdge { kind: edge.kind });
            }
        }
        graph
    }
}

/// Serializable node record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: String,
    pub kind: NodeKind,
    #[serde(default)]
    pub location: SourceLocation,
}

/// Serializable edge record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeDoc {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Serializable graph document used by the fitting boundary and the
/// persisted form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDoc {
    pub nodes: Vec<NodeDoc>,
    pub edges: Vec<EdgeDoc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: &str) -> CausalNode {
        CausalNode {
            id: id.to_string(),
            kind: NodeKind::Variable,
            location: SourceLocation::default(),
        }
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut g = CausalGraph::new();
        let a = g.add_node(var("a"));
        let a2 = g.add_node(var("a"));
        assert_eq!(a, a2);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let mut g = CausalGraph::new();
        let a = g.add_node(var("a"));
        let b = g.add_node(var("b"));
        g.add_edge(a, b, CausalEdge { kind: EdgeKind::DataFlow });
        g.add_edge(a, b, CausalEdge { kind: EdgeKind::DataFlow });
        g.add_edge(a, b, CausalEdge { kind: EdgeKind::ControlFlow });
        assert_eq!(g.edge_count(), 2);
    }

    #[test]
    fn test_parents_children_roots() {
        let mut g = CausalGraph::new();
        let a = g.add_node(var("a"));
        let b = g.add_node(var("b"));
        let c = g.add_node(var("c"));
        g.add_edge(a, c, CausalEdge { kind: EdgeKind::DataFlow });
        g.add_edge(b, c, CausalEdge { kind: EdgeKind::DataFlow });

        assert_eq!(g.parents("c"), vec!["a", "b"]);
        assert_eq!(g.children("a"), vec!["c"]);
        assert!(g.is_root("a"));
        assert!(!g.is_root("c"));
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let mut g = CausalGraph::new();
        let a = g.add_node(var("a"));
        let b = g.add_node(var("b"));
        let c = g.add_node(var("c"));
        g.add_edge(a, b, CausalEdge { kind: EdgeKind::DataFlow });
        g.add_edge(b, c, CausalEdge { kind: EdgeKind::DataFlow });

        let order = g.topological_order().unwrap();
        let pos = |id: &str| order.iter().position(|n| n == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn test_doc_round_trip() {
        let mut g = CausalGraph::new();
        let a = g.add_node(var("a"));
        let b = g.add_node(var("b"));
        g.add_edge(a, b, CausalEdge { kind: EdgeKind::ControlFlow });

        let doc = g.to_doc();
        let rebuilt = CausalGraph::from_doc(&doc);
        assert_eq!(rebuilt.node_count(), 2);
        assert_eq!(rebuilt.edge_count(), 1);
        assert_eq!(rebuilt.parents("b"), vec!["a"]);
    }
}
