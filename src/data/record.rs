//! Canonical post records consumed by the graph pipeline

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Content category a post was collected under
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Meme,
    Hashtag,
    Misinformation,
}

impl ContentType {
    /// Every content type, in the order used for tie-breaking
    pub const ALL: [ContentType; 3] = [
        ContentType::Meme,
        ContentType::Hashtag,
        ContentType::Misinformation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Meme => "meme",
            ContentType::Hashtag => "hashtag",
            ContentType::Misinformation => "misinformation",
        }
    }

    /// Infer a content type from a collection file name such as `misinfo_1_clean.csv`
    pub fn from_file_name(name: &str) -> Option<Self> {
        let prefix = name.split(|c: char| c == '_' || c == '.' || c == '-').next()?;
        prefix.parse().ok()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meme" | "memes" => Ok(ContentType::Meme),
            "hashtag" | "hashtags" => Ok(ContentType::Hashtag),
            "misinformation" | "misinfo" => Ok(ContentType::Misinformation),
            other => Err(format!("unknown content type: {other:?}")),
        }
    }
}

/// A category the pipeline runs over: one content type, or the pooled record set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    All,
    Type(ContentType),
}

impl Category {
    /// Whether a record belongs to this category
    pub fn contains(&self, record: &PostRecord) -> bool {
        match self {
            Category::All => true,
            Category::Type(content_type) => record.content_type == *content_type,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::All => f.write_str("all"),
            Category::Type(content_type) => content_type.fmt(f),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A normalized post. Immutable once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    /// Unique within the record set of one content type
    pub id: String,

    /// Creation time, when the source row carried a parsable one
    pub timestamp: Option<DateTime<Utc>>,

    /// Author handle; may be the deleted sentinel
    pub author: String,

    /// Community (subreddit) the post appeared in
    pub community: String,

    /// Non-negative engagement (likes, replies, ...)
    pub engagement_score: f64,

    pub content_type: ContentType,
}

impl PostRecord {
    pub fn new(
        id: impl Into<String>,
        author: impl Into<String>,
        community: impl Into<String>,
        engagement_score: f64,
        content_type: ContentType,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: None,
            author: author.into(),
            community: community.into(),
            engagement_score,
            content_type,
        }
    }

    /// Whether the author is anonymized or removed
    pub fn has_deleted_author(&self) -> bool {
        is_deleted_author(&self.author)
    }
}

/// Sentinels the collectors write for accounts that no longer exist
const DELETED_AUTHORS: [&str; 3] = ["deleted", "[deleted]", "[removed]"];

pub fn is_deleted_author(author: &str) -> bool {
    let author = author.trim();
    author.is_empty()
        || DELETED_AUTHORS
            .iter()
            .any(|sentinel| author.eq_ignore_ascii_case(sentinel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_content_type_aliases() {
        assert_eq!("Meme".parse::<ContentType>(), Ok(ContentType::Meme));
        assert_eq!(" misinfo ".parse::<ContentType>(), Ok(ContentType::Misinformation));
        assert!("unknown".parse::<ContentType>().is_err());
    }

    #[test]
    fn content_type_from_file_name() {
        assert_eq!(
            ContentType::from_file_name("misinfo_1_clean.csv"),
            Some(ContentType::Misinformation)
        );
        assert_eq!(
            ContentType::from_file_name("hashtag_2_clean.parquet"),
            Some(ContentType::Hashtag)
        );
        assert_eq!(ContentType::from_file_name("posts.csv"), None);
    }

    #[test]
    fn deleted_author_sentinels() {
        assert!(is_deleted_author(""));
        assert!(is_deleted_author("  "));
        assert!(is_deleted_author("deleted"));
        assert!(is_deleted_author("[Deleted]"));
        assert!(is_deleted_author("[removed]"));
        assert!(!is_deleted_author("deleted_user_42"));
    }

    #[test]
    fn category_membership() {
        let post = PostRecord::new("1", "a", "X", 1.0, ContentType::Hashtag);

        assert!(Category::All.contains(&post));
        assert!(Category::Type(ContentType::Hashtag).contains(&post));
        assert!(!Category::Type(ContentType::Meme).contains(&post));
        assert_eq!(Category::All.to_string(), "all");
        assert_eq!(Category::Type(ContentType::Meme).to_string(), "meme");
    }
}
