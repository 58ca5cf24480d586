//! User-user co-participation projection

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use itertools::Itertools;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rayon::prelude::*;
use serde::Serialize;

use crate::graph::{BipartiteGraph, GraphView, Node, ViewKind};

/// How two users' weights in a shared community combine into a projected weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CoWeight {
    /// min(w1, w2)
    #[default]
    Min,
    /// w1 * w2
    Product,
    /// 1 per shared community, ignoring engagement
    Shared,
}

impl CoWeight {
    pub fn combine(&self, w1: f64, w2: f64) -> f64 {
        match self {
            CoWeight::Min => w1.min(w2),
            CoWeight::Product => w1 * w2,
            CoWeight::Shared => 1.0,
        }
    }
}

impl fmt::Display for CoWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoWeight::Min => f.write_str("min"),
            CoWeight::Product => f.write_str("product"),
            CoWeight::Shared => f.write_str("shared"),
        }
    }
}

/// Counters describing one projection run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectionStats {
    pub communities: usize,
    /// Communities with a single member, which contribute no edges
    pub singleton_communities: usize,
    /// (community, user pair) combinations visited
    pub pair_contributions: usize,
    /// User pairs sharing a community whose accumulated weight was zero
    pub zero_weight_pairs: usize,
}

/// Single-partition graph of users linked by shared communities
#[derive(Debug, Clone)]
pub struct ProjectedGraph {
    graph: UnGraph<Node, f64>,
    users: HashMap<String, NodeIndex>,
    co_weight: CoWeight,
}

impl ProjectedGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// User keys in node order (ascending)
    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(|node| node.key.as_str())
    }

    pub fn contains_user(&self, user: &str) -> bool {
        self.users.contains_key(user)
    }

    /// Weight of the edge between two users, in either order
    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let a = *self.users.get(a)?;
        let b = *self.users.get(b)?;
        let edge = self.graph.find_edge(a, b)?;
        self.graph.edge_weight(edge).copied()
    }

    /// All `(user, user, weight)` triples with the smaller key first, sorted
    pub fn edges(&self) -> Vec<(&str, &str, f64)> {
        let mut edges: Vec<(&str, &str, f64)> = self
            .graph
            .edge_references()
            .map(|edge| {
                let a = self.graph[edge.source()].key.as_str();
                let b = self.graph[edge.target()].key.as_str();
                if a <= b {
                    (a, b, *edge.weight())
                } else {
                    (b, a, *edge.weight())
                }
            })
            .collect();
        edges.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        edges
    }
}

impl GraphView for ProjectedGraph {
    fn kind(&self) -> ViewKind {
        ViewKind::Projected
    }

    fn graph(&self) -> &UnGraph<Node, f64> {
        &self.graph
    }

    fn user_count(&self) -> usize {
        self.graph.node_count()
    }

    fn community_count(&self) -> usize {
        0
    }

    fn co_weight(&self) -> Option<CoWeight> {
        Some(self.co_weight)
    }
}

/// Communities folded together by one task. Fixed so that the grouping of
/// floating-point additions never depends on the thread count.
const COMMUNITY_BATCH: usize = 64;

/// Pair weights and counters from one batch of communities
#[derive(Debug, Default)]
struct PartialProjection {
    weights: BTreeMap<(usize, usize), f64>,
    singleton_communities: usize,
    pair_contributions: usize,
}

fn fold_batch(bipartite: &BipartiteGraph, batch: &[NodeIndex], co_weight: CoWeight) -> PartialProjection {
    let mut partial = PartialProjection::default();
    for &community in batch {
        let mut pairs = 0;
        // Keys are (lower ordinal, higher ordinal): members() is sorted, so u1 < u2
        for ((u1, w1), (u2, w2)) in bipartite.members(community).into_iter().tuple_combinations() {
            *partial.weights.entry((u1, u2)).or_insert(0.0) += co_weight.combine(w1, w2);
            pairs += 1;
        }
        if pairs == 0 {
            partial.singleton_communities += 1;
        }
        partial.pair_contributions += pairs;
    }
    partial
}

/// Project the bipartite graph onto its users.
///
/// Users are combined pairwise only within each community, so the cost is
/// the sum over communities of the squared member count. Communities are
/// folded in fixed-size batches, one pool-width window of batches at a time,
/// and the batch maps are merged in community-key order. Only one window of
/// partial maps is alive at once, and the weights are identical for any
/// thread count.
pub fn project(bipartite: &BipartiteGraph, co_weight: CoWeight) -> (ProjectedGraph, ProjectionStats) {
    let communities: Vec<NodeIndex> = bipartite.community_indices().collect();
    let batches: Vec<&[NodeIndex]> = communities.chunks(COMMUNITY_BATCH).collect();
    let window = rayon::current_num_threads().max(1);

    let mut stats = ProjectionStats {
        communities: communities.len(),
        ..Default::default()
    };

    let mut accumulated: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for group in batches.chunks(window) {
        let partials: Vec<PartialProjection> = group
            .par_iter()
            .map(|batch| fold_batch(bipartite, batch, co_weight))
            .collect();

        for partial in partials {
            stats.singleton_communities += partial.singleton_communities;
            stats.pair_contributions += partial.pair_contributions;
            for (pair, weight) in partial.weights {
                *accumulated.entry(pair).or_insert(0.0) += weight;
            }
        }
    }

    // Every user becomes a node, including those sharing no community
    let user_keys = bipartite.user_keys();
    let mut graph = UnGraph::with_capacity(user_keys.len(), accumulated.len());
    let mut users = HashMap::with_capacity(user_keys.len());
    for key in user_keys {
        let idx = graph.add_node(Node::user(key.clone()));
        users.insert(key, idx);
    }

    for ((u1, u2), weight) in accumulated {
        if weight > 0.0 {
            graph.add_edge(NodeIndex::new(u1), NodeIndex::new(u2), weight);
        } else {
            stats.zero_weight_pairs += 1;
        }
    }

    log::info!(
        "Projected {} users onto {} co-participation edges ({} co-weight)",
        graph.node_count(),
        graph.edge_count(),
        co_weight
    );
    if stats.zero_weight_pairs > 0 {
        log::warn!(
            "Dropped {} user pairs whose shared engagement was zero",
            stats.zero_weight_pairs
        );
    }

    let projected = ProjectedGraph {
        graph,
        users,
        co_weight,
    };
    (projected, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ContentType, PostRecord};
    use crate::graph::build_bipartite;

    fn bipartite(posts: &[(&str, &str, f64)]) -> BipartiteGraph {
        let records: Vec<PostRecord> = posts
            .iter()
            .enumerate()
            .map(|(i, (author, community, w))| {
                PostRecord::new(i.to_string(), *author, *community, *w, ContentType::Meme)
            })
            .collect();
        build_bipartite(&records).0
    }

    #[test]
    fn scenario_min_weight() {
        let graph = bipartite(&[("a", "X", 5.0), ("b", "X", 3.0), ("c", "Y", 2.0)]);
        let (projected, stats) = project(&graph, CoWeight::Min);

        assert_eq!(projected.node_count(), 3);
        assert_eq!(projected.edges(), vec![("a", "b", 3.0)]);
        assert_eq!(projected.edge_weight("a", "c"), None);
        assert_eq!(projected.edge_weight("b", "c"), None);
        assert_eq!(stats.communities, 2);
        assert_eq!(stats.singleton_communities, 1);
    }

    #[test]
    fn sums_over_shared_communities() {
        let graph = bipartite(&[
            ("a", "X", 5.0),
            ("b", "X", 3.0),
            ("a", "Y", 1.0),
            ("b", "Y", 4.0),
        ]);

        let (min, _) = project(&graph, CoWeight::Min);
        let (product, _) = project(&graph, CoWeight::Product);
        let (shared, _) = project(&graph, CoWeight::Shared);

        assert_eq!(min.edge_weight("a", "b"), Some(4.0));
        assert_eq!(product.edge_weight("a", "b"), Some(19.0));
        assert_eq!(shared.edge_weight("a", "b"), Some(2.0));
    }

    #[test]
    fn symmetric_without_self_loops() {
        let graph = bipartite(&[
            ("a", "X", 1.0),
            ("b", "X", 2.0),
            ("c", "X", 3.0),
            ("c", "Y", 1.0),
            ("d", "Y", 1.0),
            ("a", "X", 1.0),
        ]);
        let (projected, _) = project(&graph, CoWeight::Min);

        let users: Vec<&str> = projected.users().collect();
        for a in &users {
            assert_eq!(projected.edge_weight(a, a), None);
            for b in &users {
                assert_eq!(projected.edge_weight(a, b), projected.edge_weight(b, a));
            }
        }
        assert_eq!(projected.edge_count(), 4);
        for (_, _, weight) in projected.edges() {
            assert!(weight > 0.0);
        }
    }

    #[test]
    fn isolated_user_is_kept() {
        let graph = bipartite(&[("solo", "X", 7.0)]);
        let (projected, stats) = project(&graph, CoWeight::Min);

        assert_eq!(projected.node_count(), 1);
        assert_eq!(projected.edge_count(), 0);
        assert!(projected.contains_user("solo"));
        assert_eq!(stats.singleton_communities, 1);
    }

    #[test]
    fn zero_weight_pairs_are_counted_not_linked() {
        let graph = bipartite(&[("a", "X", 0.0), ("b", "X", 3.0)]);

        let (min, stats) = project(&graph, CoWeight::Min);
        assert_eq!(min.node_count(), 2);
        assert_eq!(min.edge_count(), 0);
        assert_eq!(stats.zero_weight_pairs, 1);

        let (shared, stats) = project(&graph, CoWeight::Shared);
        assert_eq!(shared.edge_weight("a", "b"), Some(1.0));
        assert_eq!(stats.zero_weight_pairs, 0);
    }

    #[test]
    fn weights_do_not_depend_on_thread_count() {
        let mut posts = Vec::new();
        for community in 0..(3 * COMMUNITY_BATCH + 7) {
            for user in 0..6 {
                if (community + user) % 3 != 0 {
                    let weight = 0.1 * ((community * 7 + user * 3) % 11) as f64 / 3.0;
                    posts.push((format!("u{user}"), format!("c{community:04}"), weight));
                }
            }
        }
        let records: Vec<PostRecord> = posts
            .iter()
            .enumerate()
            .map(|(i, (author, community, w))| {
                PostRecord::new(i.to_string(), author.as_str(), community.as_str(), *w, ContentType::Meme)
            })
            .collect();
        let graph = build_bipartite(&records).0;

        let run = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            let (projected, stats) = pool.install(|| project(&graph, CoWeight::Min));
            let edges: Vec<(String, String, u64)> = projected
                .edges()
                .into_iter()
                .map(|(a, b, w)| (a.to_string(), b.to_string(), w.to_bits()))
                .collect();
            (edges, stats)
        };

        let (single, single_stats) = run(1);
        let (many, many_stats) = run(4);

        assert!(!single.is_empty());
        assert_eq!(single, many);
        assert_eq!(single_stats, many_stats);
        assert_eq!(single_stats.communities, 3 * COMMUNITY_BATCH + 7);
    }

    #[test]
    fn co_weight_is_reported() {
        let graph = bipartite(&[("a", "X", 1.0)]);
        let (projected, _) = project(&graph, CoWeight::Product);

        assert_eq!(projected.co_weight(), Some(CoWeight::Product));
        assert_eq!(CoWeight::Product.to_string(), "product");
    }
}
