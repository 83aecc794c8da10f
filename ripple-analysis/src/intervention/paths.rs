//! Simple directed path enumeration — a pure graph query, independent of
//! fitted mechanisms.

use petgraph::graph::NodeIndex;
use petgraph::Direction;

use ripple_core::types::collections::FxHashSet;

use crate::graph::CausalGraph;

/// Depth-first enumeration of simple directed paths from `source` to
/// `target`, capped at `max_paths`. Paths are returned as node-id
/// sequences including both endpoints.
pub fn causal_paths(
    graph: &CausalGraph,
    source: &str,
    target: &str,
    max_paths: usize,
) -> Vec<Vec<String>> {
    let (Some(source_idx), Some(target_idx)) =
        (graph.node_index(source), graph.node_index(target))
    else {
        return Vec::new();
    };
    if max_paths == 0 {
        return Vec::new();
    }

    let mut paths = Vec::new();
    let mut stack = vec![source_idx];
    let mut on_path: FxHashSet<NodeIndex> = FxHashSet::default();
    on_path.insert(source_idx);

    dfs(
        graph,
        source_idx,
        target_idx,
        max_paths,
        &mut stack,
        &mut on_path,
        &mut paths,
    );
    paths
}

fn dfs(
    graph: &CausalGraph,
    current: NodeIndex,
    target: NodeIndex,
    max_paths: usize,
    stack: &mut Vec<NodeIndex>,
    on_path: &mut FxHashSet<NodeIndex>,
    paths: &mut Vec<Vec<String>>,
) {
    if paths.len() >= max_paths {
        return;
    }
    if current == target {
        paths.push(stack.iter().map(|&idx| graph.graph[idx].id.clone()).collect());
        return;
    }

    // Deterministic neighbor order.
    let mut next: Vec<NodeIndex> = graph
        .graph
        .neighbors_directed(current, Direction::Outgoing)
        .collect();
    next.sort_by(|&a, &b| graph.graph[a].id.cmp(&graph.graph[b].id));

    for neighbor in next {
        if paths.len() >= max_paths {
            return;
        }
        if !on_path.insert(neighbor) {
            continue;
        }
        stack.push(neighbor);
        dfs(graph, neighbor, target, max_paths, stack, on_path, paths);
        stack.pop();
        on_path.remove(&neighbor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CausalEdge, CausalNode, EdgeKind, NodeKind};
    use ripple_core::types::unit::SourceLocation;

    fn diamond() -> CausalGraph {
        // a → b → d, a → c → d
        let mut g = CausalGraph::new();
        let ids = ["a", "b", "c", "d"];
        for id in ids {
            g.add_node(CausalNode {
                id: id.to_string(),
                kind: NodeKind::Variable,
                location: SourceLocation::default(),
            });
        }
        for (from, to) in [("a", "b"), ("b", "d"), ("a", "c"), ("c", "d")] {
            let f = g.node_index(from).unwrap();
            let t = g.node_index(to).unwrap();
            g.add_edge(f, t, CausalEdge { kind: EdgeKind::DataFlow });
        }
        g
    }

    #[test]
    fn test_enumerates_both_paths() {
        let g = diamond();
        let paths = causal_paths(&g, "a", "d", 10);
        assert_eq!(paths.len(), 2);
        assert!(paths.contains(&vec!["a".into(), "b".into(), "d".into()]));
        assert!(paths.contains(&vec!["a".into(), "c".into(), "d".into()]));
    }

    #[test]
    fn test_cap_limits_results() {
        let g = diamond();
        let paths = causal_paths(&g, "a", "d", 1);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_no_path_and_unknown_nodes() {
        let g = diamond();
        assert!(causal_paths(&g, "d", "a", 10).is_empty());
        assert!(causal_paths(&g, "a", "nope", 10).is_empty());
    }

    #[test]
    fn test_trivial_path_to_self() {
        let g = diamond();
        let paths = causal_paths(&g, "a", "a", 10);
        assert_eq!(paths, vec![vec!["a".to_string()]]);
    }
}
