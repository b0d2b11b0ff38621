// Shortest-Path-First: standalone Dijkstra over a weighted directed graph.
//
// Kept deliberately independent of `Router`/`Lsdb` so it can be exercised (and
// reasoned about) as a pure function, per §8 of the specification.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::error::{AppError, Result};

/// `node -> {neighbor -> cost}` adjacency, the same shape the LSDB and a
/// router's own neighbor set are flattened into before a run.
pub type Graph = HashMap<String, HashMap<String, u32>>;

/// Distances plus enough of the predecessor chain to reconstruct a path.
#[derive(Debug, Clone, Default)]
pub struct ShortestPaths {
    pub distances: HashMap<String, u32>,
    predecessors: HashMap<String, String>,
}

impl ShortestPaths {
    /// Walk predecessors back to `start`, returning the path in traversal
    /// order (start first). `None` if `node` was never reached.
    pub fn path_to(&self, node: &str) -> Option<Vec<String>> {
        if !self.distances.contains_key(node) {
            return None;
        }
        let mut path = vec![node.to_string()];
        let mut current = node;
        while let Some(prev) = self.predecessors.get(current) {
            path.push(prev.clone());
            current = prev;
        }
        path.reverse();
        Some(path)
    }

    /// The first hop away from `start` on the shortest path to `node`, or
    /// `None` if `node` is `start` itself, unreached, or there is no
    /// predecessor chain (a malformed or single-node graph).
    pub fn first_hop(&self, node: &str) -> Option<String> {
        let path = self.path_to(node)?;
        path.get(1).cloned()
    }
}

/// Dijkstra's algorithm with a binary min-heap, deterministic tie-break on
/// (distance, node-id) so repeated runs over the same LSDB snapshot always
/// pick the same path when multiple shortest paths exist.
///
/// `start` must be a key of `graph` (as a node with at least an empty
/// adjacency list); otherwise this returns a "start not in graph" error
/// rather than silently producing an empty result.
pub fn shortest_paths(graph: &Graph, start: &str) -> Result<ShortestPaths> {
    if !graph.contains_key(start) {
        return Err(AppError::RouteError(format!(
            "start node '{start}' not in graph"
        )));
    }

    let mut distances: HashMap<String, u32> = HashMap::new();
    let mut predecessors: HashMap<String, String> = HashMap::new();
    let mut visited: HashMap<String, bool> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(u32, String)>> = BinaryHeap::new();

    distances.insert(start.to_string(), 0);
    heap.push(Reverse((0, start.to_string())));

    while let Some(Reverse((dist, node))) = heap.pop() {
        if visited.get(&node).copied().unwrap_or(false) {
            continue;
        }
        visited.insert(node.clone(), true);

        let Some(edges) = graph.get(&node) else {
            continue;
        };
        for (neighbor, cost) in edges {
            if !graph.contains_key(neighbor) {
                // Advertised-but-unknown node: don't leak it into the result.
                continue;
            }
            let candidate = dist + cost;
            let better = distances
                .get(neighbor)
                .map(|&best| candidate < best)
                .unwrap_or(true);
            if better {
                distances.insert(neighbor.clone(), candidate);
                predecessors.insert(neighbor.clone(), node.clone());
                heap.push(Reverse((candidate, neighbor.clone())));
            }
        }
    }

    Ok(ShortestPaths {
        distances,
        predecessors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from(edges: &[(&str, &[(&str, u32)])]) -> Graph {
        edges
            .iter()
            .map(|(node, adj)| {
                (
                    node.to_string(),
                    adj.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn classic_four_node_graph() {
        let graph = graph_from(&[
            ("A", &[("B", 1), ("C", 4)]),
            ("B", &[("C", 2), ("D", 5)]),
            ("C", &[("D", 1)]),
            ("D", &[]),
        ]);
        let result = shortest_paths(&graph, "A").unwrap();
        assert_eq!(result.distances.get("A"), Some(&0));
        assert_eq!(result.distances.get("B"), Some(&1));
        assert_eq!(result.distances.get("C"), Some(&3));
        assert_eq!(result.distances.get("D"), Some(&4));
    }

    #[test]
    fn unreachable_node_is_absent() {
        let graph = graph_from(&[("A", &[("B", 1)]), ("B", &[]), ("C", &[])]);
        let result = shortest_paths(&graph, "A").unwrap();
        assert!(!result.distances.contains_key("C"));
    }

    #[test]
    fn single_node_graph() {
        let graph = graph_from(&[("A", &[])]);
        let result = shortest_paths(&graph, "A").unwrap();
        assert_eq!(result.distances.len(), 1);
        assert_eq!(result.distances.get("A"), Some(&0));
    }

    #[test]
    fn start_not_in_graph_is_an_error() {
        let graph = graph_from(&[("A", &[])]);
        let err = shortest_paths(&graph, "Z").unwrap_err();
        assert!(matches!(err, AppError::RouteError(_)));
    }

    #[test]
    fn triangle_inequality_holds_for_every_edge() {
        let graph = graph_from(&[
            ("A", &[("B", 2), ("C", 9)]),
            ("B", &[("C", 1), ("D", 4)]),
            ("C", &[("D", 2)]),
            ("D", &[("A", 7)]),
        ]);
        let result = shortest_paths(&graph, "A").unwrap();
        for (node, edges) in &graph {
            let Some(&dist_v) = result.distances.get(node) else {
                continue;
            };
            for (neighbor, cost) in edges {
                if let Some(&dist_u) = result.distances.get(neighbor) {
                    assert!(dist_u <= dist_v + cost, "triangle inequality violated for edge {node}->{neighbor}");
                }
            }
        }
    }

    #[test]
    fn deterministic_tie_break_prefers_lower_node_id() {
        // Two equal-cost paths to D: via B and via C. Node-id tie-break must
        // make this deterministic across runs.
        let graph = graph_from(&[
            ("A", &[("B", 1), ("C", 1)]),
            ("B", &[("D", 1)]),
            ("C", &[("D", 1)]),
            ("D", &[]),
        ]);
        let first = shortest_paths(&graph, "A").unwrap().first_hop("D");
        let second = shortest_paths(&graph, "A").unwrap().first_hop("D");
        assert_eq!(first, second);
        assert_eq!(first.as_deref(), Some("B"));
    }
}
