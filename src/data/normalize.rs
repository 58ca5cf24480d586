//! Row validation: raw tabular rows into canonical post records

use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::data::record::{ContentType, PostRecord};

/// A loosely-typed row as read from an input table
#[derive(Debug, Clone, Default)]
pub struct RawPost {
    pub id: Option<String>,
    pub timestamp: Option<String>,
    pub author: Option<String>,
    pub community: Option<String>,
    pub content_type: Option<String>,
    /// Sum of the engagement cells present in the row
    pub engagement: Option<f64>,
    /// Name of the file the row came from, used to infer a missing content type
    pub source: Option<String>,
}

/// Why a raw row was excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecordIssue {
    #[error("missing id")]
    MissingId,
    #[error("missing author")]
    MissingAuthor,
    #[error("missing community")]
    MissingCommunity,
    #[error("content type could not be determined")]
    UnknownContentType,
    #[error("duplicate id within content type")]
    DuplicateId,
}

/// Counters for rows seen and excluded during normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub rows_seen: usize,
    pub accepted: usize,
    pub missing_id: usize,
    pub missing_author: usize,
    pub missing_community: usize,
    pub unknown_content_type: usize,
    pub duplicate_ids: usize,
    /// Rows whose engagement was negative and clamped to zero (still accepted)
    pub clamped_engagement: usize,
}

impl NormalizeStats {
    pub fn excluded(&self) -> usize {
        self.rows_seen - self.accepted
    }

    fn record(&mut self, issue: RecordIssue) {
        match issue {
            RecordIssue::MissingId => self.missing_id += 1,
            RecordIssue::MissingAuthor => self.missing_author += 1,
            RecordIssue::MissingCommunity => self.missing_community += 1,
            RecordIssue::UnknownContentType => self.unknown_content_type += 1,
            RecordIssue::DuplicateId => self.duplicate_ids += 1,
        }
    }

    /// Fold the counters of another batch into this one
    pub fn merge(&mut self, other: &NormalizeStats) {
        self.rows_seen += other.rows_seen;
        self.accepted += other.accepted;
        self.missing_id += other.missing_id;
        self.missing_author += other.missing_author;
        self.missing_community += other.missing_community;
        self.unknown_content_type += other.unknown_content_type;
        self.duplicate_ids += other.duplicate_ids;
        self.clamped_engagement += other.clamped_engagement;
    }
}

/// Turns raw rows into post records, dropping malformed ones.
///
/// Ids are deduplicated per content type across every batch fed to the same
/// normalizer; the first occurrence wins.
#[derive(Debug, Default)]
pub struct Normalizer {
    seen: HashSet<(ContentType, String)>,
    stats: NormalizeStats,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate one row
    pub fn push(&mut self, row: RawPost) -> Result<PostRecord, RecordIssue> {
        self.stats.rows_seen += 1;

        let result = self.validate(row);
        match &result {
            Ok(record) => {
                self.stats.accepted += 1;
                log::debug!("Accepted post {} ({})", record.id, record.content_type);
            }
            Err(issue) => {
                self.stats.record(*issue);
                log::debug!("Excluded row: {}", issue);
            }
        }
        result
    }

    /// Validate a batch of rows, keeping the accepted ones in input order
    pub fn extend<I>(&mut self, rows: I) -> Vec<PostRecord>
    where
        I: IntoIterator<Item = RawPost>,
    {
        rows.into_iter().filter_map(|row| self.push(row).ok()).collect()
    }

    pub fn stats(&self) -> &NormalizeStats {
        &self.stats
    }

    pub fn finish(self) -> NormalizeStats {
        self.stats
    }

    fn validate(&mut self, row: RawPost) -> Result<PostRecord, RecordIssue> {
        let id = non_empty(row.id).ok_or(RecordIssue::MissingId)?;
        // Deleted-author sentinels are well formed; the graph builder decides what to do with them
        let author = row
            .author
            .map(|a| a.trim().to_string())
            .ok_or(RecordIssue::MissingAuthor)?;
        let community = non_empty(row.community).ok_or(RecordIssue::MissingCommunity)?;

        // The file name only stands in for a missing or empty cell
        let content_type = match non_empty(row.content_type) {
            Some(cell) => cell.parse::<ContentType>().ok(),
            None => row.source.as_deref().and_then(ContentType::from_file_name),
        }
        .ok_or(RecordIssue::UnknownContentType)?;

        if !self.seen.insert((content_type, id.clone())) {
            return Err(RecordIssue::DuplicateId);
        }

        let mut engagement_score = row.engagement.filter(|e| e.is_finite()).unwrap_or(0.0);
        if engagement_score < 0.0 {
            self.stats.clamped_engagement += 1;
            engagement_score = 0.0;
        }

        Ok(PostRecord {
            id,
            timestamp: row.timestamp.as_deref().and_then(parse_timestamp),
            author,
            community,
            engagement_score,
            content_type,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Naive layouts, assumed UTC. The space-separated one is how polars renders
/// a Datetime column cast to string.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse RFC 3339, a naive date-time (assumed UTC), or integer Unix seconds
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    // Parquet integer columns arrive as "1700000000" or "1700000000.0" after a string cast
    let seconds = raw.strip_suffix(".0").unwrap_or(raw).parse::<i64>().ok()?;
    Utc.timestamp_opt(seconds, 0).single()
}
