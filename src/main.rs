use anyhow::Result;
use clap::Parser;

use diffusion_network_analyzer::data::{loader, ContentType};
use diffusion_network_analyzer::graph::CoWeight;
use diffusion_network_analyzer::influence::DominantScope;
use diffusion_network_analyzer::{pipeline, storage, Config};

#[derive(Parser, Debug)]
#[clap(
    name = "diffusion-network-analyzer",
    about = "Compare how memes, hashtags and misinformation spread through user/community networks"
)]
struct Cli {
    /// Post table (.csv / .parquet) or a directory of them
    #[clap(long)]
    input: String,

    /// Output directory for results
    #[clap(long, default_value = "processed")]
    output_dir: String,

    /// Influencers kept per category
    #[clap(long, default_value = "20")]
    top_n: usize,

    /// How shared-community weights combine in the user projection
    #[clap(long, value_enum, default_value_t = CoWeight::Min)]
    co_weight: CoWeight,

    /// Columns summed into the engagement score (repeatable)
    #[clap(long = "engagement-column", default_values_t = ["likeCount".to_string()])]
    engagement_columns: Vec<String>,

    /// Content categories to process (repeatable; default: all)
    #[clap(long = "category", value_enum)]
    categories: Vec<ContentType>,

    /// Records deciding each influencer's dominant content type
    #[clap(long, value_enum, default_value_t = DominantScope::Category)]
    dominant_scope: DominantScope,

    /// Skip the pooled "all" category
    #[clap(long)]
    no_pooled: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let categories = if self.categories.is_empty() {
            ContentType::ALL.to_vec()
        } else {
            self.categories.clone()
        };

        Config::new(
            categories,
            self.engagement_columns.clone(),
            self.top_n,
            self.co_weight,
        )
        .with_dominant_scope(self.dominant_scope)
        .with_pooled(!self.no_pooled)
        .with_threads(self.threads)
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    let config = args.config();
    let num_threads = config.worker_threads();

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    log::info!("Starting diffusion network analysis");
    log::info!("Input: {}", args.input);
    log::info!("Output: {}", args.output_dir);
    log::info!(
        "Co-weight: {}, top-n: {}, engagement: {:?}",
        config.co_weight,
        config.top_n,
        config.engagement_columns
    );

    // 1. Load and normalize posts
    let (records, normalize_stats) = loader::load_posts(&args.input, &config.engagement_columns)?;
    log::info!("Loaded {} posts", records.len());

    // 2. Build graphs and compute metrics per category
    let report = pipeline::analyze(&records, &config);

    // 3. Save results
    storage::save_results(&report, &normalize_stats, &config, &args.output_dir)?;
    storage::log_summary(&report);

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
