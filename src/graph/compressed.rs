//! Compressed adjacency used by the metrics algorithms

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

use crate::graph::Node;

/// Compressed sparse row view of an undirected weighted graph.
///
/// Every edge is stored twice, once per endpoint, and each adjacency list is
/// sorted so membership checks are a binary search.
#[derive(Debug, Clone)]
pub struct CompressedGraph {
    /// Number of nodes in the graph
    pub node_count: usize,

    /// offsets[i] to offsets[i+1] defines the neighbor range for node i
    pub offsets: Vec<u32>,

    /// Concatenated neighbor lists
    pub targets: Vec<u32>,

    /// Edge weight aligned with `targets`
    pub weights: Vec<f64>,
}

impl CompressedGraph {
    /// Flatten a petgraph graph, preserving node indices
    pub fn from_graph(graph: &UnGraph<Node, f64>) -> Self {
        let node_count = graph.node_count();
        let mut adjacency: Vec<Vec<(u32, f64)>> = vec![Vec::new(); node_count];

        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                continue;
            }
            adjacency[a].push((b as u32, *edge.weight()));
            adjacency[b].push((a as u32, *edge.weight()));
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::with_capacity(graph.edge_count() * 2);
        let mut weights = Vec::with_capacity(graph.edge_count() * 2);
        offsets.push(0);

        for mut list in adjacency {
            list.sort_unstable_by_key(|&(target, _)| target);
            for (target, weight) in list {
                targets.push(target);
                weights.push(weight);
            }
            offsets.push(targets.len() as u32);
        }

        Self {
            node_count,
            offsets,
            targets,
            weights,
        }
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Neighbors of a node, ascending
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.targets[start..end]
    }

    /// Check if there's an edge between two nodes
    pub fn has_edge(&self, a: usize, b: u32) -> bool {
        self.neighbors(a).binary_search(&b).is_ok()
    }

    pub fn degree(&self, node: usize) -> usize {
        (self.offsets[node + 1] - self.offsets[node]) as usize
    }

    /// Sum of incident edge weights
    pub fn weighted_degree(&self, node: usize) -> f64 {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        self.weights[start..end].iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_with_tail() -> UnGraph<Node, f64> {
        let mut graph = UnGraph::new_undirected();
        let a = graph.add_node(Node::user("a"));
        let b = graph.add_node(Node::user("b"));
        let c = graph.add_node(Node::user("c"));
        let d = graph.add_node(Node::user("d"));
        graph.add_edge(a, b, 1.0);
        graph.add_edge(c, a, 2.0);
        graph.add_edge(b, c, 3.0);
        graph.add_edge(c, d, 4.0);
        graph
    }

    #[test]
    fn sorted_symmetric_adjacency() {
        let compressed = CompressedGraph::from_graph(&triangle_with_tail());

        assert_eq!(compressed.node_count, 4);
        assert_eq!(compressed.edge_count(), 4);
        assert_eq!(compressed.neighbors(0), &[1, 2]);
        assert_eq!(compressed.neighbors(2), &[0, 1, 3]);
        assert_eq!(compressed.neighbors(3), &[2]);
        assert!(compressed.has_edge(3, 2));
        assert!(!compressed.has_edge(3, 0));
    }

    #[test]
    fn degrees() {
        let compressed = CompressedGraph::from_graph(&triangle_with_tail());

        assert_eq!(compressed.degree(2), 3);
        assert_eq!(compressed.weighted_degree(2), 9.0);
        assert_eq!(compressed.weighted_degree(0), 3.0);
    }

    #[test]
    fn empty_graph() {
        let compressed = CompressedGraph::from_graph(&UnGraph::new_undirected());

        assert_eq!(compressed.node_count, 0);
        assert_eq!(compressed.offsets, vec![0]);
        assert_eq!(compressed.edge_count(), 0);
    }
}
