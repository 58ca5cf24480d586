//! Graph representation and construction module

pub mod bipartite;
pub mod builder;
pub mod compressed;
pub mod projection;

use std::fmt;

use petgraph::graph::UnGraph;
use serde::Serialize;

pub use bipartite::BipartiteGraph;
pub use builder::{build_bipartite, BipartiteBuilder, BuildStats};
pub use compressed::CompressedGraph;
pub use projection::{project, CoWeight, ProjectedGraph, ProjectionStats};

/// Which side of the bipartite structure a node sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    User,
    Community,
}

/// Node payload shared by both graph views
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: String,
    pub partition: Partition,
}

impl Node {
    pub fn user(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            partition: Partition::User,
        }
    }

    pub fn community(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            partition: Partition::Community,
        }
    }
}

/// The structure a set of metrics was computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Bipartite,
    Projected,
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewKind::Bipartite => f.write_str("bipartite"),
            ViewKind::Projected => f.write_str("projected"),
        }
    }
}

/// An undirected, weighted graph the metrics engine can summarise
pub trait GraphView {
    fn kind(&self) -> ViewKind;

    fn graph(&self) -> &UnGraph<Node, f64>;

    fn user_count(&self) -> usize;

    /// Zero for single-partition views
    fn community_count(&self) -> usize;

    /// Co-weight function the edge weights were derived with, if any
    fn co_weight(&self) -> Option<CoWeight> {
        None
    }

    /// Maximum number of edges the view's partition structure allows
    fn possible_edges(&self) -> f64 {
        match self.kind() {
            ViewKind::Bipartite => self.user_count() as f64 * self.community_count() as f64,
            ViewKind::Projected => {
                let n = self.graph().node_count() as f64;
                n * (n - 1.0) / 2.0
            }
        }
    }
}
