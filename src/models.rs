//! Data models for configured sources and the articles collected from them.
//!
//! This module defines the core data structures used throughout the crawler:
//! - [`SourceEntry`]: one raw record from the sources file, possibly a placeholder
//! - [`SourceDescriptor`]: a validated source with a resolved [`SourceKind`]
//! - [`ArticleRecord`]: the normalized output unit handed to downstream consumers
//! - [`PublishedAt`]: a resolved instant or the explicit "unknown" sentinel
//! - [`FetchWindow`]: the run-wide recency cutoff
//! - [`CrawlReport`]: one run's output as written to disk

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::dates;

/// Category applied when a source does not declare one.
pub const DEFAULT_CATEGORY: &str = "tech";

/// How a source is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// RSS 0.9x/1.0/2.0 or Atom feed.
    Feed,
    /// XML sitemap or sitemap index, including Google News sitemaps.
    Sitemap,
    /// An HTML listing page whose article links must be discovered.
    Web,
    /// A `type` value this crawler does not know. Kept so the aggregator can
    /// report it instead of failing the whole sources file.
    Unsupported(String),
}

impl SourceKind {
    /// Map a declared `type` to a kind. A missing type means [`SourceKind::Feed`].
    pub fn from_declared(declared: Option<&str>) -> Self {
        let Some(raw) = declared.map(str::trim) else {
            return SourceKind::Feed;
        };
        match raw.to_ascii_lowercase().as_str() {
            "feed" | "rss" | "atom" => SourceKind::Feed,
            "sitemap" => SourceKind::Sitemap,
            "web" => SourceKind::Web,
            _ => SourceKind::Unsupported(raw.to_string()),
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Feed => write!(f, "feed"),
            SourceKind::Sitemap => write!(f, "sitemap"),
            SourceKind::Web => write!(f, "web"),
            SourceKind::Unsupported(other) => write!(f, "{other}"),
        }
    }
}

/// One entry of the sources file exactly as written.
///
/// Entries without a `name` or `url` are documentation placeholders
/// (section headers, `_doc` notes) and never reach a strategy.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SourceEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// CSS selector for article links on a web listing page.
    #[serde(default)]
    pub article_selector: Option<String>,
    /// Per-source cap on accepted articles, overriding the global one.
    #[serde(default)]
    pub max_articles: Option<usize>,
    /// Web only: how many candidate links to fetch at most.
    #[serde(default)]
    pub max_candidates: Option<usize>,
}

/// A validated source, ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub name: String,
    pub url: String,
    pub kind: SourceKind,
    pub category: String,
    pub selector: Option<String>,
    pub max_articles: Option<usize>,
    pub max_candidates: Option<usize>,
}

impl SourceDescriptor {
    /// Validate a raw entry. Returns `None` for placeholders (blank or missing
    /// `name`/`url`).
    pub fn from_entry(entry: &SourceEntry) -> Option<Self> {
        let name = non_blank(entry.name.as_deref())?;
        let url = non_blank(entry.url.as_deref())?;

        Some(Self {
            name,
            url,
            kind: SourceKind::from_declared(entry.kind.as_deref()),
            category: non_blank(entry.category.as_deref())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            selector: non_blank(entry.article_selector.as_deref()),
            max_articles: entry.max_articles,
            max_candidates: entry.max_candidates,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// When an article was published, or the explicit sentinel that nobody could
/// tell. Serializes as an RFC 3339 string or as `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedAt {
    At(DateTime<Utc>),
    Unknown,
}

impl PublishedAt {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            PublishedAt::At(dt) => Some(*dt),
            PublishedAt::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PublishedAt::Unknown)
    }
}

impl fmt::Display for PublishedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishedAt::At(dt) => f.write_str(&dates::format_instant(dt)),
            PublishedAt::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for PublishedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublishedAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "unknown" {
            return Ok(PublishedAt::Unknown);
        }
        dates::resolve(&raw)
            .map(PublishedAt::At)
            .ok_or_else(|| serde::de::Error::custom(format!("unparseable published_at: {raw}")))
    }
}

/// A normalized article, the unit every strategy produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Headline; falls back to the URL when the source gives none.
    pub title: String,
    /// Canonical URL, the dedupe key within one source's run.
    pub url: String,
    pub published_at: PublishedAt,
    /// Plain text, at most `max_content_chars` characters. Empty for sitemaps.
    pub summary: String,
    /// Name of the configured source.
    pub source: String,
    pub category: String,
}

/// The recency cutoff shared read-only by every strategy in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    cutoff: DateTime<Utc>,
}

impl FetchWindow {
    /// `now - lookback_hours`.
    pub fn ending_at(now: DateTime<Utc>, lookback_hours: u32) -> Self {
        Self {
            cutoff: now - Duration::hours(i64::from(lookback_hours)),
        }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    /// Inclusive: an article published exactly at the cutoff is kept.
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.cutoff
    }
}

/// Everything one run collected, in the shape written to the JSON hand-off file.
#[derive(Debug, Deserialize, Serialize)]
pub struct CrawlReport {
    /// The local date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// "morning", "afternoon", or "evening".
    pub time_of_day: String,
    /// Cutoff the run filtered against, RFC 3339.
    pub cutoff: String,
    pub articles: Vec<ArticleRecord>,
}
