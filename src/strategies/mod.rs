//! Fetch strategies and the dispatcher that picks one per source.
//!
//! Each strategy turns one [`SourceDescriptor`] into at most `cap` article
//! records, in source order:
//!
//! | Kind | Module | Unknown date |
//! |------|--------|--------------|
//! | feed | [`feed`] | dropped |
//! | sitemap | [`sitemap`] | dropped |
//! | web | [`web`] | kept as `"unknown"` |
//!
//! Failures of single items (one article page, one child sitemap) are logged
//! inside the strategy. A strategy returns `Err` only when the source as a
//! whole produced nothing usable (its feed, root sitemap, or listing page
//! could not be fetched), and the aggregator logs that per source.

pub mod feed;
pub mod sitemap;
pub mod web;
mod xml;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::CrawlerSettings;
use crate::error::CrawlError;
use crate::models::{ArticleRecord, FetchWindow, PublishedAt, SourceDescriptor, SourceKind};
use crate::transport::Transport;

/// What to do with an item whose publication date could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePolicy {
    /// Feeds and sitemaps are expected to carry dates; a missing one marks
    /// low-quality data.
    DropOnUnknown,
    /// Web pages often hide their date; let the downstream consumer decide.
    KeepAsUnknown,
}

impl DatePolicy {
    /// Apply the window and this policy to a resolved (or unresolved) date.
    ///
    /// Returns the value to record, or `None` if the item must be dropped.
    /// A resolved date before the cutoff is always dropped.
    pub fn admit(self, resolved: Option<DateTime<Utc>>, window: &FetchWindow) -> Option<PublishedAt> {
        match resolved {
            Some(instant) if window.contains(&instant) => Some(PublishedAt::At(instant)),
            Some(_) => None,
            None => match self {
                DatePolicy::DropOnUnknown => None,
                DatePolicy::KeepAsUnknown => Some(PublishedAt::Unknown),
            },
        }
    }
}

/// Run-scoped, read-only parameters shared by every strategy.
#[derive(Debug, Clone)]
pub struct CrawlContext {
    pub window: FetchWindow,
    /// Accepted-article cap for sources that do not override it.
    pub max_per_source: usize,
    /// Summary length cap in characters.
    pub max_content_chars: usize,
    /// Pause between article fetches against the same web source.
    pub request_delay: Duration,
}

impl CrawlContext {
    pub fn from_settings(settings: &CrawlerSettings, window: FetchWindow) -> Self {
        Self {
            window,
            max_per_source: settings.max_articles_per_source,
            max_content_chars: settings.max_content_chars,
            request_delay: settings.request_delay(),
        }
    }

    pub fn cap_for(&self, source: &SourceDescriptor) -> usize {
        source.max_articles.unwrap_or(self.max_per_source)
    }
}

/// One of the three ways to fetch a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Feed,
    Sitemap,
    Web,
}

impl Strategy {
    /// `None` for kinds no strategy handles.
    pub fn for_kind(kind: &SourceKind) -> Option<Self> {
        match kind {
            SourceKind::Feed => Some(Strategy::Feed),
            SourceKind::Sitemap => Some(Strategy::Sitemap),
            SourceKind::Web => Some(Strategy::Web),
            SourceKind::Unsupported(_) => None,
        }
    }

    pub fn date_policy(self) -> DatePolicy {
        match self {
            Strategy::Feed | Strategy::Sitemap => DatePolicy::DropOnUnknown,
            Strategy::Web => DatePolicy::KeepAsUnknown,
        }
    }

    /// Fetch `source` with this strategy.
    pub async fn fetch(
        self,
        transport: &Transport,
        source: &SourceDescriptor,
        ctx: &CrawlContext,
    ) -> Result<Vec<ArticleRecord>, CrawlError> {
        match self {
            Strategy::Feed => feed::fetch(transport, source, ctx).await,
            Strategy::Sitemap => sitemap::fetch(transport, source, ctx).await,
            Strategy::Web => web::fetch(transport, source, ctx).await,
        }
    }
}

/// Build a record, falling back to the URL for an empty title.
pub(crate) fn record(
    source: &SourceDescriptor,
    title: &str,
    url: &str,
    published_at: PublishedAt,
    summary: String,
) -> ArticleRecord {
    let title = title.trim();
    ArticleRecord {
        title: if title.is_empty() { url.to_string() } else { title.to_string() },
        url: url.to_string(),
        published_at,
        summary,
        source: source.name.clone(),
        category: source.category.clone(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 21, 12, 0, 0).unwrap()
    }

    pub fn context(cap: usize) -> CrawlContext {
        CrawlContext {
            window: FetchWindow::ending_at(now(), 24),
            max_per_source: cap,
            max_content_chars: 200,
            request_delay: Duration::ZERO,
        }
    }

    pub fn hours_ago(hours: i64) -> DateTime<Utc> {
        now() - ChronoDuration::hours(hours)
    }

    pub fn descriptor(kind: SourceKind) -> SourceDescriptor {
        SourceDescriptor {
            name: "Example".to_string(),
            url: "https://example.com/source".to_string(),
            kind,
            category: "tech".to_string(),
            selector: None,
            max_articles: None,
            max_candidates: None,
        }
    }
}
