//! User <-> community graph

use std::collections::BTreeMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::graph::{GraphView, Node, Partition, ViewKind};

/// Bipartite graph of users and the communities they posted in.
///
/// User nodes occupy indices `0..user_count()` in key order, community nodes
/// follow in key order, so the layout depends only on the node keys.
#[derive(Debug, Clone)]
pub struct BipartiteGraph {
    pub(crate) graph: UnGraph<Node, f64>,
    pub(crate) users: BTreeMap<String, NodeIndex>,
    pub(crate) communities: BTreeMap<String, NodeIndex>,
}

impl BipartiteGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// User keys in ascending order
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.users.keys().map(String::as_str)
    }

    /// Community keys in ascending order
    pub fn communities(&self) -> impl Iterator<Item = &str> {
        self.communities.keys().map(String::as_str)
    }

    /// Accumulated engagement between a user and a community
    pub fn edge_weight(&self, user: &str, community: &str) -> Option<f64> {
        let u = *self.users.get(user)?;
        let c = *self.communities.get(community)?;
        let edge = self.graph.find_edge(u, c)?;
        self.graph.edge_weight(edge).copied()
    }

    /// All `(user, community, weight)` triples, ordered by user then community
    pub fn edges(&self) -> Vec<(&str, &str, f64)> {
        let mut edges: Vec<(&str, &str, f64)> = self
            .graph
            .edge_references()
            .map(|edge| {
                let (a, b) = (&self.graph[edge.source()], &self.graph[edge.target()]);
                let (user, community) = match a.partition {
                    Partition::User => (a, b),
                    Partition::Community => (b, a),
                };
                (user.key.as_str(), community.key.as_str(), *edge.weight())
            })
            .collect();
        edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        edges
    }

    /// Members of a community as `(user ordinal, weight)`, sorted by ordinal.
    ///
    /// The ordinal is the user's index in this graph, which is also its rank in
    /// key order.
    pub fn members(&self, community: NodeIndex) -> Vec<(usize, f64)> {
        let mut members: Vec<(usize, f64)> = self
            .graph
            .edges(community)
            .map(|edge| {
                let other = if edge.source() == community {
                    edge.target()
                } else {
                    edge.source()
                };
                (other.index(), *edge.weight())
            })
            .collect();
        members.sort_by_key(|&(user, _)| user);
        members
    }

    pub(crate) fn community_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.communities.values().copied()
    }

    pub(crate) fn user_keys(&self) -> Vec<String> {
        self.users.keys().cloned().collect()
    }
}

impl GraphView for BipartiteGraph {
    fn kind(&self) -> ViewKind {
        ViewKind::Bipartite
    }

    fn graph(&self) -> &UnGraph<Node, f64> {
        &self.graph
    }

    fn user_count(&self) -> usize {
        self.users.len()
    }

    fn community_count(&self) -> usize {
        self.communities.len()
    }
}
