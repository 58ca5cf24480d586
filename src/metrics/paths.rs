//! Average shortest path length

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::graph::CompressedGraph;

/// Mean hop distance over all ordered pairs of distinct nodes in `component`.
///
/// `component` must be a connected component of `graph`. Returns 0.0 for
/// components with fewer than two nodes.
pub fn average_shortest_path(graph: &CompressedGraph, component: &[u32]) -> f64 {
    let n = component.len();
    if n < 2 {
        return 0.0;
    }

    let total: u64 = component
        .par_iter()
        .map(|&source| distance_sum(graph, source as usize))
        .sum();

    total as f64 / (n as f64 * (n as f64 - 1.0))
}

/// Sum of BFS hop distances from `source` to every reachable node
fn distance_sum(graph: &CompressedGraph, source: usize) -> u64 {
    let mut distance = vec![u32::MAX; graph.node_count];
    let mut queue = VecDeque::new();
    let mut sum = 0u64;

    distance[source] = 0;
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        let next = distance[node] + 1;
        for &neighbor in graph.neighbors(node) {
            let neighbor = neighbor as usize;
            if distance[neighbor] == u32::MAX {
                distance[neighbor] = next;
                sum += next as u64;
                queue.push_back(neighbor);
            }
        }
    }

    sum
}
