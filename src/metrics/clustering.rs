//! Local clustering coefficient

use crate::graph::CompressedGraph;

/// Fraction of a node's neighbor pairs that are themselves linked.
///
/// `None` for nodes with fewer than two neighbors, where the ratio is undefined.
pub fn local_clustering(graph: &CompressedGraph, node: usize) -> Option<f64> {
    let neighbors = graph.neighbors(node);
    let k = neighbors.len();
    if k < 2 {
        return None;
    }

    let mut links = 0usize;
    for (i, &a) in neighbors.iter().enumerate() {
        for &b in &neighbors[i + 1..] {
            if graph.has_edge(a as usize, b) {
                links += 1;
            }
        }
    }

    Some(links as f64 / (k * (k - 1) / 2) as f64)
}

/// Mean local clustering over nodes with degree >= 2; 0.0 when there are none
pub fn average_clustering(graph: &CompressedGraph) -> f64 {
    let coefficients: Vec<f64> = (0..graph.node_count)
        .filter_map(|node| local_clustering(graph, node))
        .collect();

    if coefficients.is_empty() {
        return 0.0;
    }
    coefficients.iter().sum::<f64>() / coefficients.len() as f64
}
