//! Per-category analysis: bipartite graph, projection, metrics and ranking

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::Config;
use crate::data::{Category, PostRecord};
use crate::graph::{build_bipartite, project, BuildStats, CompressedGraph, GraphView, ProjectionStats};
use crate::influence::{rank_with_degrees, DominantScope, InfluencerEntry};
use crate::metrics::{compute_metrics, summarize, MetricsSummary, NodeDegrees};

/// Everything produced for one category
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResult {
    pub category: Category,
    pub records: usize,
    pub build: BuildStats,
    pub projection: ProjectionStats,
    /// Bipartite row followed by projected row
    pub summaries: [MetricsSummary; 2],
    pub influencers: Vec<InfluencerEntry>,
}

/// Results for every category, concatenated in category order
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub categories: Vec<CategoryResult>,
}

impl AnalysisReport {
    pub fn summaries(&self) -> impl Iterator<Item = &MetricsSummary> {
        self.categories.iter().flat_map(|c| c.summaries.iter())
    }

    pub fn influencers(&self) -> impl Iterator<Item = &InfluencerEntry> {
        self.categories.iter().flat_map(|c| c.influencers.iter())
    }
}

/// Categories in processing order: the pooled category first, then each content type
pub fn categories(config: &Config) -> Vec<Category> {
    let pooled = config.include_pooled.then_some(Category::All);
    pooled
        .into_iter()
        .chain(config.categories.iter().map(|ct| Category::Type(*ct)))
        .collect()
}

/// Records belonging to a category. Pooled ids are deduplicated, first occurrence wins.
pub fn category_records(records: &[PostRecord], category: Category) -> Vec<PostRecord> {
    match category {
        Category::Type(_) => records
            .iter()
            .filter(|r| category.contains(r))
            .cloned()
            .collect(),
        Category::All => {
            let mut seen = HashSet::new();
            records
                .iter()
                .filter(|r| seen.insert(r.id.as_str()))
                .cloned()
                .collect()
        }
    }
}

/// Run the full pipeline over one category
pub fn analyze_category(
    category: Category,
    records: &[PostRecord],
    pool: &[PostRecord],
    config: &Config,
) -> CategoryResult {
    if records.is_empty() {
        log::warn!("Category {} has no usable records", category);
    }

    let (bipartite, build) = build_bipartite(records);
    let bipartite_summary = compute_metrics(&bipartite, category);

    let (projected, projection) = project(&bipartite, config.co_weight);
    let compressed = CompressedGraph::from_graph(projected.graph());
    let degrees = NodeDegrees::of(&compressed);
    let projected_summary = summarize(&projected, category, &compressed, &degrees);

    let dominant_pool = match config.dominant_scope {
        DominantScope::Category => records,
        DominantScope::Global => pool,
    };
    let influencers = rank_with_degrees(
        &projected,
        &degrees,
        category,
        records,
        dominant_pool,
        config.top_n,
    );

    CategoryResult {
        category,
        records: records.len(),
        build,
        projection,
        summaries: [bipartite_summary, projected_summary],
        influencers,
    }
}

/// Analyze every configured category.
///
/// Categories share only the read-only record slice, so they run in parallel;
/// results keep configuration order.
pub fn analyze(records: &[PostRecord], config: &Config) -> AnalysisReport {
    let categories = categories(config);
    log::info!(
        "Analyzing {} records across {} categories",
        records.len(),
        categories.len()
    );

    let results = categories
        .into_par_iter()
        .map(|category| {
            let subset = category_records(records, category);
            analyze_category(category, &subset, records, config)
        })
        .collect();

    AnalysisReport {
        categories: results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContentType;

    #[test]
    fn pooled_category_comes_first() {
        let config = Config::default();
        assert_eq!(
            categories(&config),
            vec![
                Category::All,
                Category::Type(ContentType::Meme),
                Category::Type(ContentType::Hashtag),
                Category::Type(ContentType::Misinformation),
            ]
        );

        let config = config.with_pooled(false);
        assert_eq!(categories(&config).len(), 3);
    }

    #[test]
    fn pooled_records_deduplicate_ids() {
        let records = vec![
            PostRecord::new("1", "a", "X", 1.0, ContentType::Meme),
            PostRecord::new("1", "a", "X", 1.0, ContentType::Hashtag),
            PostRecord::new("2", "b", "X", 1.0, ContentType::Hashtag),
        ];

        assert_eq!(category_records(&records, Category::All).len(), 2);
        assert_eq!(
            category_records(&records, Category::Type(ContentType::Hashtag)).len(),
            2
        );
        assert!(category_records(&records, Category::Type(ContentType::Misinformation)).is_empty());
    }
}
