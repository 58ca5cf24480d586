//! Results persistence module

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use polars::prelude::*;
use serde_json::{json, to_string_pretty};

use crate::config::Config;
use crate::data::NormalizeStats;
use crate::influence::InfluencerEntry;
use crate::metrics::MetricsSummary;
use crate::pipeline::AnalysisReport;

pub const SUMMARY_FILE: &str = "graph_metrics_summary.csv";
pub const INFLUENCERS_FILE: &str = "top_influencers.csv";
pub const REPORT_FILE: &str = "run_report.json";

/// Paths of the artifacts written by [`save_results`]
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub summary: PathBuf,
    pub influencers: PathBuf,
    pub report: PathBuf,
}

/// Save analysis results to the specified directory
pub fn save_results(
    report: &AnalysisReport,
    normalize: &NormalizeStats,
    config: &Config,
    output_dir: impl AsRef<Path>,
) -> Result<OutputPaths> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let paths = OutputPaths {
        summary: output_dir.join(SUMMARY_FILE),
        influencers: output_dir.join(INFLUENCERS_FILE),
        report: output_dir.join(REPORT_FILE),
    };

    let summaries: Vec<&MetricsSummary> = report.summaries().collect();
    let mut summary_frame = summary_frame(&summaries)?;
    write_csv(&mut summary_frame, &paths.summary)?;
    log::info!("Wrote metrics summary -> {}", paths.summary.display());

    let influencers: Vec<&InfluencerEntry> = report.influencers().collect();
    let mut influencer_frame = influencer_frame(&influencers)?;
    write_csv(&mut influencer_frame, &paths.influencers)?;
    log::info!(
        "Wrote {} influencer rows -> {}",
        influencers.len(),
        paths.influencers.display()
    );

    save_report(report, normalize, config, &paths.report)?;
    log::info!("Wrote run report -> {}", paths.report.display());

    Ok(paths)
}

fn write_csv(frame: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(frame)?;
    Ok(())
}

fn column<T, R, F>(rows: &[&R], f: F) -> Vec<T>
where
    F: Fn(&R) -> T,
{
    rows.iter().map(|r| f(r)).collect()
}

fn count<R, F>(rows: &[&R], f: F) -> Vec<u64>
where
    F: Fn(&R) -> usize,
{
    rows.iter().map(|r| f(r) as u64).collect()
}

/// Metrics summary rows as a table with stable column names
pub fn summary_frame(rows: &[&MetricsSummary]) -> Result<DataFrame> {
    let columns: Vec<Column> = vec![
        Series::new("category".into(), column(rows, |r| r.category.to_string())).into(),
        Series::new("graph_view".into(), column(rows, |r| r.graph_view.to_string())).into(),
        Series::new(
            "co_weight".into(),
            column(rows, |r| r.co_weight.map(|c| c.to_string())),
        )
        .into(),
        Series::new("n_nodes".into(), count(rows, |r| r.n_nodes)).into(),
        Series::new("n_users".into(), count(rows, |r| r.n_users)).into(),
        Series::new("n_communities".into(), count(rows, |r| r.n_communities)).into(),
        Series::new("n_edges".into(), count(rows, |r| r.n_edges)).into(),
        Series::new("avg_degree".into(), column(rows, |r| r.avg_degree)).into(),
        Series::new("density".into(), column(rows, |r| r.density)).into(),
        Series::new("avg_clustering".into(), column(rows, |r| r.avg_clustering)).into(),
        Series::new("avg_shortest_path".into(), column(rows, |r| r.avg_shortest_path)).into(),
        Series::new("path_scope".into(), column(rows, |r| r.path_scope.to_string())).into(),
        Series::new("largest_component".into(), count(rows, |r| r.largest_component)).into(),
        Series::new("n_components".into(), count(rows, |r| r.n_components)).into(),
        Series::new(
            "max_degree_centrality".into(),
            column(rows, |r| r.max_degree_centrality),
        )
        .into(),
        Series::new(
            "total_weighted_degree".into(),
            column(rows, |r| r.total_weighted_degree),
        )
        .into(),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Influencer rows as a table with stable column names
pub fn influencer_frame(rows: &[&InfluencerEntry]) -> Result<DataFrame> {
    let columns: Vec<Column> = vec![
        Series::new("category".into(), column(rows, |r| r.category.to_string())).into(),
        Series::new("rank".into(), count(rows, |r| r.rank)).into(),
        Series::new("user".into(), column(rows, |r| r.user.clone())).into(),
        Series::new("weighted_degree".into(), column(rows, |r| r.weighted_degree)).into(),
        Series::new("degree_centrality".into(), column(rows, |r| r.degree_centrality)).into(),
        Series::new("post_count".into(), count(rows, |r| r.post_count)).into(),
        Series::new(
            "dominant_content_type".into(),
            column(rows, |r| r.dominant_content_type.to_string()),
        )
        .into(),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Save the configuration echo and per-category counters
fn save_report(
    report: &AnalysisReport,
    normalize: &NormalizeStats,
    config: &Config,
    path: &Path,
) -> Result<()> {
    let categories: Vec<_> = report
        .categories
        .iter()
        .map(|c| {
            json!({
                "category": c.category,
                "records": c.records,
                "build": c.build,
                "projection": c.projection,
            })
        })
        .collect();

    let summary = json!({
        "config": config,
        "normalize": normalize,
        "categories": categories,
    });

    let mut file = File::create(path)?;
    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Log a short per-category summary, three influencers each
pub fn log_summary(report: &AnalysisReport) {
    for result in &report.categories {
        let [bipartite, projected] = &result.summaries;
        log::info!(
            "[{}] records {} | bipartite {}n/{}e | projected {}n/{}e density {:.4} clustering {:.4} path {:.3} ({})",
            result.category,
            result.records,
            bipartite.n_nodes,
            bipartite.n_edges,
            projected.n_nodes,
            projected.n_edges,
            projected.density,
            projected.avg_clustering.unwrap_or(0.0),
            projected.avg_shortest_path,
            projected.path_scope
        );
        for entry in result.influencers.iter().take(3) {
            log::info!(
                "[{}]   #{} {} weighted_degree {:.1} posts {} dominant {}",
                result.category,
                entry.rank,
                entry.user,
                entry.weighted_degree,
                entry.post_count,
                entry.dominant_content_type
            );
        }
    }
}
