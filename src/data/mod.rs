//! Input boundary: tabular post files into canonical records

pub mod loader;
pub mod normalize;
pub mod record;

use std::path::PathBuf;
use thiserror::Error;

pub use normalize::{NormalizeStats, Normalizer, RawPost, RecordIssue};
pub use record::{Category, ContentType, PostRecord};

/// Failures reading the input tables
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported input format: {0} (expected .csv or .parquet)")]
    UnsupportedFormat(PathBuf),

    #[error("no .csv or .parquet files in {0}")]
    EmptyDirectory(PathBuf),

    #[error("{file}: none of the columns {candidates:?} are present")]
    MissingColumn {
        file: PathBuf,
        candidates: Vec<String>,
    },
}
