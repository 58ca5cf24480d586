//! Influencer ranking within a category's projected graph

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::data::{Category, ContentType, PostRecord};
use crate::graph::{CompressedGraph, GraphView, ProjectedGraph};
use crate::metrics::NodeDegrees;

/// Which records decide a user's dominant content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DominantScope {
    /// Only the records of the category being ranked
    #[default]
    Category,
    /// Every loaded record, across categories
    Global,
}

/// One row of the ranked influencer table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfluencerEntry {
    pub category: Category,
    /// 1-based position within the category
    pub rank: usize,
    pub user: String,
    pub weighted_degree: f64,
    pub degree_centrality: f64,
    /// Posts by this user in the category
    pub post_count: usize,
    pub dominant_content_type: ContentType,
}

/// Per-user post counts by content type
#[derive(Debug, Default)]
struct Activity {
    posts: usize,
    by_type: [usize; ContentType::ALL.len()],
}

impl Activity {
    /// Most frequent type; ties go to the earlier type in `ContentType::ALL`
    fn dominant(&self) -> Option<ContentType> {
        let mut best: Option<(ContentType, usize)> = None;
        for (content_type, &count) in ContentType::ALL.iter().zip(&self.by_type) {
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((*content_type, count));
            }
        }
        best.map(|(content_type, _)| content_type)
    }
}

fn activity_by_user(records: &[PostRecord]) -> HashMap<&str, Activity> {
    let mut activity: HashMap<&str, Activity> = HashMap::new();
    for record in records {
        let entry = activity.entry(record.author.as_str()).or_default();
        entry.posts += 1;
        let slot = ContentType::ALL
            .iter()
            .position(|ct| *ct == record.content_type)
            .unwrap_or_default();
        entry.by_type[slot] += 1;
    }
    activity
}

/// Rank users by weighted degree, then post count, then user id.
///
/// `category_records` are the records the graph was built from and give the
/// post counts. `dominant_pool` decides each user's dominant content type; pass
/// the category records for category scope or every record for global scope.
pub fn rank_influencers(
    projected: &ProjectedGraph,
    category: Category,
    category_records: &[PostRecord],
    dominant_pool: &[PostRecord],
    top_n: usize,
) -> Vec<InfluencerEntry> {
    let compressed = CompressedGraph::from_graph(projected.graph());
    let degrees = NodeDegrees::of(&compressed);
    rank_with_degrees(projected, &degrees, category, category_records, dominant_pool, top_n)
}

/// Rank using degrees the metrics engine already computed for this graph
pub fn rank_with_degrees(
    projected: &ProjectedGraph,
    degrees: &NodeDegrees,
    category: Category,
    category_records: &[PostRecord],
    dominant_pool: &[PostRecord],
    top_n: usize,
) -> Vec<InfluencerEntry> {
    let posts = activity_by_user(category_records);
    let pool = activity_by_user(dominant_pool);

    let fallback_type = match category {
        Category::Type(content_type) => Some(content_type),
        Category::All => None,
    };

    let mut entries: Vec<InfluencerEntry> = projected
        .users()
        .enumerate()
        .map(|(node, user)| {
            let own = posts.get(user);
            let dominant_content_type = pool
                .get(user)
                .and_then(Activity::dominant)
                .or_else(|| own.and_then(Activity::dominant))
                .or(fallback_type)
                .unwrap_or(ContentType::Meme);

            InfluencerEntry {
                category,
                rank: 0,
                user: user.to_string(),
                weighted_degree: degrees.weighted[node],
                degree_centrality: degrees.centrality(node),
                post_count: own.map_or(0, |a| a.posts),
                dominant_content_type,
            }
        })
        .collect();

    entries.sort_by(influence_order);
    entries.truncate(top_n);
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.rank = position + 1;
    }

    log::debug!("Ranked {} influencers for {}", entries.len(), category);
    entries
}

/// Weighted degree descending, post count descending, user ascending
fn influence_order(a: &InfluencerEntry, b: &InfluencerEntry) -> Ordering {
    b.weighted_degree
        .total_cmp(&a.weighted_degree)
        .then_with(|| b.post_count.cmp(&a.post_count))
        .then_with(|| a.user.cmp(&b.user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_bipartite, project, CoWeight};

    const MEME: Category = Category::Type(ContentType::Meme);

    fn post(id: &str, author: &str, community: &str, w: f64, ct: ContentType) -> PostRecord {
        PostRecord::new(id, author, community, w, ct)
    }

    fn projected(records: &[PostRecord]) -> ProjectedGraph {
        let (bipartite, _) = build_bipartite(records);
        project(&bipartite, CoWeight::Min).0
    }

    #[test]
    fn ranks_by_weighted_degree() {
        let records = vec![
            post("1", "a", "X", 5.0, ContentType::Meme),
            post("2", "b", "X", 3.0, ContentType::Meme),
            post("3", "c", "X", 1.0, ContentType::Meme),
            post("4", "d", "Y", 9.0, ContentType::Meme),
        ];
        let ranked = rank_influencers(&projected(&records), MEME, &records, &records, 20);

        // a: 3 + 1, b: 3 + 1, c: 1 + 1, d: isolated
        let users: Vec<&str> = ranked.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(users, vec!["a", "b", "c", "d"]);
        assert_eq!(ranked[0].weighted_degree, 4.0);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
        assert_eq!(ranked[3].weighted_degree, 0.0);
        assert_eq!(ranked[2].degree_centrality, 2.0 / 3.0);
    }

    #[test]
    fn ties_break_on_post_count_then_user() {
        let records = vec![
            post("1", "b", "X", 2.0, ContentType::Meme),
            post("2", "b", "Z", 0.0, ContentType::Meme),
            post("3", "a", "X", 2.0, ContentType::Meme),
            post("4", "c", "Y", 1.0, ContentType::Meme),
            post("5", "d", "Y", 1.0, ContentType::Meme),
        ];
        let ranked = rank_influencers(&projected(&records), MEME, &records, &records, 20);

        let order: Vec<(&str, usize)> = ranked
            .iter()
            .map(|e| (e.user.as_str(), e.post_count))
            .collect();
        assert_eq!(order, vec![("b", 2), ("a", 1), ("c", 1), ("d", 1)]);
    }

    #[test]
    fn truncates_to_top_n() {
        let records = vec![
            post("1", "a", "X", 1.0, ContentType::Meme),
            post("2", "b", "X", 1.0, ContentType::Meme),
            post("3", "c", "X", 1.0, ContentType::Meme),
        ];
        let graph = projected(&records);

        assert_eq!(rank_influencers(&graph, MEME, &records, &records, 2).len(), 2);
        assert_eq!(rank_influencers(&graph, MEME, &records, &records, 10).len(), 3);
        assert!(rank_influencers(&graph, MEME, &records, &records, 0).is_empty());
    }

    #[test]
    fn deterministic_across_runs() {
        let records: Vec<PostRecord> = (0..30)
            .map(|i| {
                post(
                    &i.to_string(),
                    &format!("user{}", i % 7),
                    &format!("c{}", i % 4),
                    1.0,
                    ContentType::Meme,
                )
            })
            .collect();
        let graph = projected(&records);

        let first = rank_influencers(&graph, MEME, &records, &records, 5);
        for _ in 0..5 {
            assert_eq!(rank_influencers(&graph, MEME, &records, &records, 5), first);
        }
    }

    #[test]
    fn dominant_type_in_global_scope() {
        let all = vec![
            post("1", "a", "X", 1.0, ContentType::Meme),
            post("2", "b", "X", 1.0, ContentType::Meme),
            post("3", "a", "Y", 1.0, ContentType::Hashtag),
            post("4", "a", "Z", 1.0, ContentType::Hashtag),
        ];
        let memes: Vec<PostRecord> = all
            .iter()
            .filter(|r| r.content_type == ContentType::Meme)
            .cloned()
            .collect();
        let graph = projected(&memes);

        let scoped = rank_influencers(&graph, MEME, &memes, &memes, 20);
        let global = rank_influencers(&graph, MEME, &memes, &all, 20);

        assert!(scoped
            .iter()
            .all(|e| e.dominant_content_type == ContentType::Meme));
        let a = global.iter().find(|e| e.user == "a").unwrap();
        assert_eq!(a.dominant_content_type, ContentType::Hashtag);
        assert_eq!(a.post_count, 1);
    }

    #[test]
    fn dominant_type_ties_follow_enum_order() {
        let records = vec![
            post("1", "a", "X", 1.0, ContentType::Misinformation),
            post("2", "a", "Y", 1.0, ContentType::Hashtag),
        ];
        let ranked = rank_influencers(&projected(&records), Category::All, &records, &records, 20);

        assert_eq!(ranked[0].dominant_content_type, ContentType::Hashtag);
    }
}
