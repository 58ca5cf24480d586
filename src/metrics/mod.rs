//! Structural metrics over bipartite and projected graphs
//!
//! Every metric has a defined value on empty and single-node graphs, so
//! summaries stay comparable across categories:
//!
//! - empty graph: counts are 0, ratios are 0.0, `path_scope` is `empty`
//! - `avg_shortest_path` counts hops inside the largest component; with more
//!   than one component `path_scope` is `giant_component`
//! - single node: `avg_shortest_path` is 0.0 with `path_scope` `full`
//! - `avg_clustering` averages nodes of degree >= 2 (0.0 if none) and is
//!   left empty for bipartite views, where triangles cannot exist
//! - `max_degree_centrality` is 0.0 when there are fewer than two nodes

pub mod clustering;
pub mod components;
pub mod paths;

use std::fmt;

use serde::Serialize;

use crate::data::Category;
use crate::graph::{CoWeight, CompressedGraph, GraphView, ViewKind};

/// What the reported average shortest path covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathScope {
    /// The graph is connected; all node pairs are included
    Full,
    /// The graph is disconnected; only the largest component is included
    GiantComponent,
    /// The graph has no nodes
    Empty,
}

impl fmt::Display for PathScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathScope::Full => f.write_str("full"),
            PathScope::GiantComponent => f.write_str("giant_component"),
            PathScope::Empty => f.write_str("empty"),
        }
    }
}

/// One row of the comparison table, keyed by (category, graph_view)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub category: Category,
    pub graph_view: ViewKind,
    pub co_weight: Option<CoWeight>,
    pub n_nodes: usize,
    pub n_users: usize,
    pub n_communities: usize,
    pub n_edges: usize,
    pub avg_degree: f64,
    pub density: f64,
    pub avg_clustering: Option<f64>,
    pub avg_shortest_path: f64,
    pub path_scope: PathScope,
    pub largest_component: usize,
    pub n_components: usize,
    pub max_degree_centrality: f64,
    pub total_weighted_degree: f64,
}

/// Per-node degree figures, indexed like the graph's nodes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDegrees {
    pub degree: Vec<usize>,
    pub weighted: Vec<f64>,
}

impl NodeDegrees {
    pub fn of(graph: &CompressedGraph) -> Self {
        Self {
            degree: (0..graph.node_count).map(|n| graph.degree(n)).collect(),
            weighted: (0..graph.node_count).map(|n| graph.weighted_degree(n)).collect(),
        }
    }

    /// degree / (n - 1), 0.0 when n <= 1
    pub fn centrality(&self, node: usize) -> f64 {
        let n = self.degree.len();
        if n <= 1 {
            return 0.0;
        }
        self.degree[node] as f64 / (n - 1) as f64
    }
}

/// Compute the full metric battery for one graph view
pub fn compute_metrics<G: GraphView>(view: &G, category: Category) -> MetricsSummary {
    let compressed = CompressedGraph::from_graph(view.graph());
    let degrees = NodeDegrees::of(&compressed);
    summarize(view, category, &compressed, &degrees)
}

/// Compute the metric battery from an already compressed graph
pub fn summarize<G: GraphView>(
    view: &G,
    category: Category,
    compressed: &CompressedGraph,
    degrees: &NodeDegrees,
) -> MetricsSummary {
    let n_nodes = compressed.node_count;
    let n_edges = compressed.edge_count();

    let avg_degree = if n_nodes == 0 {
        0.0
    } else {
        2.0 * n_edges as f64 / n_nodes as f64
    };

    let possible = view.possible_edges();
    let density = if possible > 0.0 {
        n_edges as f64 / possible
    } else {
        0.0
    };

    let avg_clustering = match view.kind() {
        ViewKind::Bipartite => None,
        ViewKind::Projected => Some(clustering::average_clustering(compressed)),
    };

    let components = components::connected_components(compressed);
    let largest_component = components.first().map_or(0, Vec::len);
    let (avg_shortest_path, path_scope) = match components.len() {
        0 => (0.0, PathScope::Empty),
        1 => (
            paths::average_shortest_path(compressed, &components[0]),
            PathScope::Full,
        ),
        _ => (
            paths::average_shortest_path(compressed, &components[0]),
            PathScope::GiantComponent,
        ),
    };

    let max_degree_centrality = (0..n_nodes)
        .map(|node| degrees.centrality(node))
        .fold(0.0, f64::max);

    let total_weighted_degree = degrees.weighted.iter().sum();

    let summary = MetricsSummary {
        category,
        graph_view: view.kind(),
        co_weight: view.co_weight(),
        n_nodes,
        n_users: view.user_count(),
        n_communities: view.community_count(),
        n_edges,
        avg_degree,
        density,
        avg_clustering,
        avg_shortest_path,
        path_scope,
        largest_component,
        n_components: components.len(),
        max_degree_centrality,
        total_weighted_degree,
    };

    log::info!(
        "{} {}: {} nodes, {} edges, {} components, density {:.4}",
        category,
        summary.graph_view,
        n_nodes,
        n_edges,
        summary.n_components,
        density
    );

    summary
}
