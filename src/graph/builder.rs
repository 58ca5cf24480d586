//! Bipartite graph construction module

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::UnGraph;
use serde::Serialize;

use crate::data::PostRecord;
use crate::graph::{BipartiteGraph, Node};

/// Records seen and skipped while building one graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub records_seen: usize,
    pub records_used: usize,
    /// Records dropped because the author is deleted or anonymized
    pub skipped_deleted_authors: usize,
}

/// Builder for incrementally constructing a BipartiteGraph
#[derive(Debug, Default)]
pub struct BipartiteBuilder {
    /// Distinct user keys
    users: BTreeSet<String>,

    /// Distinct community keys
    communities: BTreeSet<String>,

    /// Engagement contributions per (user, community), summed in `build()`
    weights: BTreeMap<(String, String), Vec<f64>>,

    stats: BuildStats,
}

impl BipartiteBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one post; returns whether it contributed to the graph
    pub fn add_post(&mut self, record: &PostRecord) -> bool {
        self.stats.records_seen += 1;

        if record.has_deleted_author() {
            self.stats.skipped_deleted_authors += 1;
            log::debug!("Skipping post {} with deleted author", record.id);
            return false;
        }

        self.add_edge(&record.author, &record.community, record.engagement_score);
        self.stats.records_used += 1;
        true
    }

    /// Accumulate weight onto the (user, community) edge, creating it at 0 if absent
    pub fn add_edge(&mut self, user: &str, community: &str, weight: f64) {
        if !self.users.contains(user) {
            self.users.insert(user.to_string());
        }
        if !self.communities.contains(community) {
            self.communities.insert(community.to_string());
        }

        self.weights
            .entry((user.to_string(), community.to_string()))
            .or_default()
            .push(weight);
    }

    /// Build the graph. Node and edge order follow the keys, not insertion order.
    pub fn build(self) -> (BipartiteGraph, BuildStats) {
        let mut graph = UnGraph::with_capacity(
            self.users.len() + self.communities.len(),
            self.weights.len(),
        );

        let users: BTreeMap<String, _> = self
            .users
            .into_iter()
            .map(|key| {
                let idx = graph.add_node(Node::user(key.clone()));
                (key, idx)
            })
            .collect();

        let communities: BTreeMap<String, _> = self
            .communities
            .into_iter()
            .map(|key| {
                let idx = graph.add_node(Node::community(key.clone()));
                (key, idx)
            })
            .collect();

        for ((user, community), contributions) in self.weights {
            graph.add_edge(users[&user], communities[&community], ordered_sum(contributions));
        }

        let bipartite = BipartiteGraph {
            graph,
            users,
            communities,
        };

        (bipartite, self.stats)
    }
}

/// Sum in ascending order so the total does not depend on record order
fn ordered_sum(mut values: Vec<f64>) -> f64 {
    values.sort_by(f64::total_cmp);
    values.into_iter().sum()
}

/// Build the user <-> community graph for one category's records
pub fn build_bipartite(records: &[PostRecord]) -> (BipartiteGraph, BuildStats) {
    let mut builder = BipartiteBuilder::new();
    for record in records {
        builder.add_post(record);
    }

    let (graph, stats) = builder.build();
    log::info!(
        "Built bipartite graph with {} users, {} communities and {} edges from {} records",
        graph.users.len(),
        graph.communities.len(),
        graph.edge_count(),
        stats.records_used
    );
    if stats.skipped_deleted_authors > 0 {
        log::warn!(
            "Skipped {} records with deleted authors",
            stats.skipped_deleted_authors
        );
    }

    (graph, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContentType;
    use crate::graph::Partition;
    use petgraph::visit::EdgeRef;

    fn post(id: &str, author: &str, community: &str, engagement: f64) -> PostRecord {
        PostRecord::new(id, author, community, engagement, ContentType::Meme)
    }

    #[test]
    fn scenario_edges() {
        let records = vec![
            post("1", "a", "X", 5.0),
            post("2", "b", "X", 3.0),
            post("3", "c", "Y", 2.0),
        ];
        let (graph, stats) = build_bipartite(&records);

        assert_eq!(
            graph.edges(),
            vec![("a", "X", 5.0), ("b", "X", 3.0), ("c", "Y", 2.0)]
        );
        assert_eq!(graph.node_count(), 5);
        assert_eq!(stats.records_used, 3);
    }

    #[test]
    fn accumulates_engagement_per_pair() {
        let records = vec![
            post("1", "a", "X", 5.0),
            post("2", "a", "X", 4.0),
            post("3", "a", "Y", 1.0),
        ];
        let (graph, _) = build_bipartite(&records);

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge_weight("a", "X"), Some(9.0));
        assert_eq!(graph.edge_weight("a", "Y"), Some(1.0));
        assert_eq!(graph.edge_weight("a", "Z"), None);
    }

    #[test]
    fn zero_engagement_still_creates_edge() {
        let (graph, _) = build_bipartite(&[post("1", "a", "X", 0.0)]);

        assert_eq!(graph.edge_weight("a", "X"), Some(0.0));
    }

    #[test]
    fn deleted_authors_are_skipped_and_counted() {
        let records = vec![
            post("1", "a", "X", 5.0),
            post("2", "deleted", "X", 3.0),
            post("3", "", "Y", 2.0),
        ];
        let (graph, stats) = build_bipartite(&records);

        assert_eq!(graph.users().collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(graph.communities().collect::<Vec<_>>(), vec!["X"]);
        assert_eq!(stats.records_seen, 3);
        assert_eq!(stats.records_used, 1);
        assert_eq!(stats.skipped_deleted_authors, 2);
    }

    #[test]
    fn no_edges_within_a_partition() {
        let records = vec![
            post("1", "a", "X", 1.0),
            post("2", "b", "X", 1.0),
            post("3", "b", "Y", 1.0),
            // A user and a community sharing a name are still distinct nodes
            post("4", "Y", "a", 1.0),
        ];
        let (graph, _) = build_bipartite(&records);

        for edge in graph.graph.edge_references() {
            let source = &graph.graph[edge.source()];
            let target = &graph.graph[edge.target()];
            assert_ne!(source.partition, target.partition);
        }
        assert_eq!(graph.graph.node_count(), 6);
        assert!(graph
            .graph
            .node_indices()
            .take(3)
            .all(|idx| graph.graph[idx].partition == Partition::User));
    }

    #[test]
    fn fractional_weights_identical_under_reordering() {
        let records = vec![
            post("1", "a", "X", 0.1),
            post("2", "a", "X", 0.2),
            post("3", "a", "X", 0.3),
            post("4", "b", "X", 0.7),
            post("5", "b", "X", 0.1),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(2);

        let (forward, _) = build_bipartite(&records);
        for other in [reversed, rotated] {
            let (graph, _) = build_bipartite(&other);
            assert_eq!(forward.edges(), graph.edges());
        }
        assert_eq!(forward.edge_weight("a", "X"), Some(0.1 + 0.2 + 0.3));
    }

    #[test]
    fn identical_under_reordering() {
        let records = vec![
            post("1", "a", "X", 5.0),
            post("2", "b", "X", 3.0),
            post("3", "a", "Y", 2.0),
            post("4", "a", "X", 1.0),
        ];
        let mut reversed = records.clone();
        reversed.reverse();

        let (forward, _) = build_bipartite(&records);
        let (backward, _) = build_bipartite(&reversed);

        assert_eq!(forward.edges(), backward.edges());
        assert_eq!(
            forward.users().collect::<Vec<_>>(),
            backward.users().collect::<Vec<_>>()
        );
    }
}
