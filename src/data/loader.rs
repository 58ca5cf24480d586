//! Tabular post loading (CSV and Parquet)

use std::path::{Path, PathBuf};

use anyhow::Result;
use polars::prelude::*;

use crate::data::normalize::{NormalizeStats, Normalizer, RawPost};
use crate::data::record::PostRecord;
use crate::data::LoadError;

/// Accepted spellings for each logical column, first match wins
const ID_COLUMNS: &[&str] = &["id"];
const AUTHOR_COLUMNS: &[&str] = &["user_username", "user.username", "author"];
const COMMUNITY_COLUMNS: &[&str] = &["subreddit", "community"];
const CONTENT_TYPE_COLUMNS: &[&str] = &["content_type", "type"];
const TIMESTAMP_COLUMNS: &[&str] = &["date", "created_utc", "timestamp"];

/// Spelling variants collectors have used for engagement columns
fn engagement_aliases(column: &str) -> Vec<String> {
    let mut aliases = vec![column.to_string()];
    let alias = match column {
        "likeCount" => Some("like_count"),
        "like_count" => Some("likeCount"),
        "replyCount" => Some("reply_count"),
        "reply_count" => Some("replyCount"),
        _ => None,
    };
    aliases.extend(alias.map(str::to_string));
    aliases
}

/// Load and normalize every post table under `path`.
///
/// `path` may be a single `.csv` / `.parquet` file or a directory, in which case
/// every such file in it is read in file-name order.
pub fn load_posts(
    path: impl AsRef<Path>,
    engagement_columns: &[String],
) -> Result<(Vec<PostRecord>, NormalizeStats)> {
    let files = input_files(path.as_ref())?;
    log::info!("Reading {} input file(s)", files.len());

    let mut normalizer = Normalizer::new();
    let mut records = Vec::new();

    for file in &files {
        let rows = read_rows(file, engagement_columns)?;
        let before = normalizer.stats().accepted;
        records.extend(normalizer.extend(rows));
        log::info!(
            "{}: accepted {} rows",
            file.display(),
            normalizer.stats().accepted - before
        );
    }

    let stats = normalizer.finish();
    if stats.excluded() > 0 {
        log::warn!(
            "Excluded {} of {} rows (missing id {}, missing author {}, missing community {}, unknown content type {}, duplicate id {})",
            stats.excluded(),
            stats.rows_seen,
            stats.missing_id,
            stats.missing_author,
            stats.missing_community,
            stats.unknown_content_type,
            stats.duplicate_ids
        );
    }

    Ok((records, stats))
}

/// Resolve the list of input tables
pub fn input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()).into());
    }

    if path.is_file() {
        if table_format(path).is_none() {
            return Err(LoadError::UnsupportedFormat(path.to_path_buf()).into());
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let file = entry?.path();
        if file.is_file() && table_format(&file).is_some() {
            files.push(file);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(LoadError::EmptyDirectory(path.to_path_buf()).into());
    }
    Ok(files)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableFormat {
    Csv,
    Parquet,
}

fn table_format(path: &Path) -> Option<TableFormat> {
    match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
        "csv" => Some(TableFormat::Csv),
        "parquet" => Some(TableFormat::Parquet),
        _ => None,
    }
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    let frame = match table_format(path) {
        // Every CSV column is read as a string; numeric parsing happens per column below
        Some(TableFormat::Csv) => LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?,
        Some(TableFormat::Parquet) => LazyFrame::scan_parquet(path, Default::default())?.collect()?,
        None => return Err(LoadError::UnsupportedFormat(path.to_path_buf()).into()),
    };
    Ok(frame)
}

/// Read one table into raw rows
pub fn read_rows(path: &Path, engagement_columns: &[String]) -> Result<Vec<RawPost>> {
    log::info!("Reading table: {}", path.display());
    let df = read_frame(path)?;
    log::debug!("File schema: {:?}", df.schema());

    let required = |candidates: &[&str]| -> Result<StringChunked> {
        string_column(&df, candidates)?.ok_or_else(|| {
            LoadError::MissingColumn {
                file: path.to_path_buf(),
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            }
            .into()
        })
    };

    let ids = required(ID_COLUMNS)?;
    let authors = required(AUTHOR_COLUMNS)?;
    let communities = required(COMMUNITY_COLUMNS)?;
    let content_types = string_column(&df, CONTENT_TYPE_COLUMNS)?;
    let timestamps = timestamp_column(&df, TIMESTAMP_COLUMNS)?;

    let mut engagement = Vec::new();
    for column in engagement_columns {
        let aliases = engagement_aliases(column);
        let aliases: Vec<&str> = aliases.iter().map(String::as_str).collect();
        match float_column(&df, &aliases)? {
            Some(values) => engagement.push(values),
            None => log::debug!("{}: no engagement column {}", path.display(), column),
        }
    }

    let source = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let rows = (0..df.height())
        .map(|i| {
            let cells: Vec<f64> = engagement.iter().filter_map(|values| values.get(i)).collect();
            RawPost {
                id: ids.get(i).map(str::to_string),
                timestamp: timestamps.as_ref().and_then(|c| c[i].clone()),
                author: authors.get(i).map(str::to_string),
                community: communities.get(i).map(str::to_string),
                content_type: content_types.as_ref().and_then(|c| c.get(i)).map(str::to_string),
                engagement: (!cells.is_empty()).then(|| cells.iter().sum()),
                source: source.clone(),
            }
        })
        .collect();

    Ok(rows)
}

fn find_column<'a>(df: &'a DataFrame, candidates: &[&str]) -> Option<&'a Column> {
    candidates.iter().find_map(|name| df.column(name).ok())
}

fn string_column(df: &DataFrame, candidates: &[&str]) -> Result<Option<StringChunked>> {
    match find_column(df, candidates) {
        Some(column) => {
            let series = column.as_materialized_series().cast(&DataType::String)?;
            Ok(Some(series.str()?.clone()))
        }
        None => Ok(None),
    }
}

/// Datetime columns are converted from their physical value so the time
/// unit and zone survive; anything else goes through the string cast
fn timestamp_column(df: &DataFrame, candidates: &[&str]) -> Result<Option<Vec<Option<String>>>> {
    let Some(column) = find_column(df, candidates) else {
        return Ok(None);
    };
    let series = column.as_materialized_series();
    let cells = match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            series
                .cast(&DataType::Int64)?
                .i64()?
                .into_iter()
                .map(|value| value.and_then(|v| datetime_from_unit(v, unit)))
                .map(|value| value.map(|dt| dt.to_rfc3339()))
                .collect()
        }
        _ => series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect(),
    };
    Ok(Some(cells))
}

fn datetime_from_unit(value: i64, unit: TimeUnit) -> Option<chrono::DateTime<chrono::Utc>> {
    match unit {
        TimeUnit::Milliseconds => chrono::DateTime::from_timestamp_millis(value),
        TimeUnit::Microseconds => chrono::DateTime::from_timestamp_micros(value),
        TimeUnit::Nanoseconds => Some(chrono::DateTime::from_timestamp_nanos(value)),
    }
}

/// Non-strict cast: unparsable cells become null
fn float_column(df: &DataFrame, candidates: &[&str]) -> Result<Option<Float64Chunked>> {
    match find_column(df, candidates) {
        Some(column) => {
            let series = column.as_materialized_series().cast(&DataType::Float64)?;
            Ok(Some(series.f64()?.clone()))
        }
        None => Ok(None),
    }
}
