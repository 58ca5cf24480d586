//! Configuration management for the diffusion network analyzer

use serde::Serialize;

use crate::data::ContentType;
use crate::graph::CoWeight;
use crate::influence::DominantScope;

/// Options recognised by the analysis pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Content categories to process, in output order
    pub categories: Vec<ContentType>,

    /// Columns summed into a post's engagement score
    pub engagement_columns: Vec<String>,

    /// Influencers kept per category
    pub top_n: usize,

    /// Co-weight function for the user projection
    pub co_weight: CoWeight,

    /// Record pool deciding each influencer's dominant content type
    pub dominant_scope: DominantScope,

    /// Also run the pipeline over all records pooled together
    pub include_pooled: bool,

    /// Worker threads for the rayon pool (0 = all available cores)
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: ContentType::ALL.to_vec(),
            engagement_columns: vec!["likeCount".to_string()],
            top_n: 20,
            co_weight: CoWeight::Min,
            dominant_scope: DominantScope::Category,
            include_pooled: true,
            threads: 0,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(
        categories: Vec<ContentType>,
        engagement_columns: Vec<String>,
        top_n: usize,
        co_weight: CoWeight,
    ) -> Self {
        Self {
            categories,
            engagement_columns,
            top_n,
            co_weight,
            ..Self::default()
        }
    }

    pub fn with_dominant_scope(mut self, scope: DominantScope) -> Self {
        self.dominant_scope = scope;
        self
    }

    pub fn with_pooled(mut self, include_pooled: bool) -> Self {
        self.include_pooled = include_pooled;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Thread count to build the pool with, resolving 0 to the core count
    pub fn worker_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            num_cpus::get()
        }
    }
}
