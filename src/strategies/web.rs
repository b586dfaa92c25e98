//! Plain HTML listing pages.
//!
//! # Process
//!
//! 1. Fetch the listing page and discover candidate links, with the source's
//!    selector if it has one.
//! 2. Walk candidates in discovery order, fetching each article page, until
//!    the cap is met or the candidate ceiling has been tried (`max_candidates`,
//!    else the source's `max_articles`, else three per slot). Consecutive
//!    article fetches are spaced by the configured request delay.
//! 3. Date each article from its page metadata, falling back to the full
//!    extraction cascade. Undated articles are kept as `"unknown"`; articles
//!    dated before the cutoff are dropped.
//!
//! One article failing never aborts the listing.

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use super::{CrawlContext, DatePolicy, record};
use crate::error::CrawlError;
use crate::extract::{extract_article, extract_date, extract_links};
use crate::models::{ArticleRecord, PublishedAt, SourceDescriptor};
use crate::transport::Transport;
use crate::utils::truncate_for_log;

const POLICY: DatePolicy = DatePolicy::KeepAsUnknown;

/// Candidates checked per accepted-article slot when the source sets no limit.
const CANDIDATES_PER_SLOT: usize = 3;

/// How many article pages `source` may fetch. An explicit `max_candidates`
/// wins; a per-source `max_articles` also bounds the pages fetched; otherwise
/// three per accepted-article slot.
pub(crate) fn candidate_ceiling(source: &SourceDescriptor, cap: usize) -> usize {
    source
        .max_candidates
        .or(source.max_articles)
        .unwrap_or(cap.saturating_mul(CANDIDATES_PER_SLOT))
}

/// What one article page yields before the window is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScrapedPage {
    pub title: String,
    pub text: String,
    pub date: Option<DateTime<Utc>>,
}

/// Fetch the listing page of `source` and the articles it links to.
///
/// # Errors
///
/// Only when the listing page cannot be fetched or the configured selector is
/// invalid. Article pages that fail are logged and skipped.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch(
    transport: &Transport,
    source: &SourceDescriptor,
    ctx: &CrawlContext,
) -> Result<Vec<ArticleRecord>, CrawlError> {
    let cap = ctx.cap_for(source);
    let max_candidates = candidate_ceiling(source, cap);

    let listing = transport.get_text(&source.url).await?;
    let candidates = extract_links(&listing, &source.url, source.selector.as_deref())?;
    info!(candidates = candidates.len(), cap, max_candidates, "Listing page scanned");

    let mut articles = Vec::new();
    for (checked, url) in candidates.iter().take(max_candidates).enumerate() {
        if articles.len() >= cap {
            break;
        }
        if checked > 0 && !ctx.request_delay.is_zero() {
            sleep(ctx.request_delay).await;
        }

        let html = match transport.get_text(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, error = %e, "Skipping article");
                continue;
            }
        };

        let page = scrape_article(&html, url, ctx.max_content_chars);
        match POLICY.admit(page.date, &ctx.window) {
            Some(published_at) => {
                if published_at == PublishedAt::Unknown {
                    debug!(url = %url, "No publication date found; keeping as unknown");
                }
                debug!(title = %truncate_for_log(&page.title, 80), "Accepted article");
                articles.push(record(source, &page.title, url, published_at, page.text));
            }
            None => debug!(url = %url, "Article older than cutoff"),
        }
    }

    info!(accepted = articles.len(), "Web source processed");
    Ok(articles)
}

/// Title, main text, and best date of one article page.
///
/// Metadata found by the reader view wins; otherwise the full date cascade
/// runs on the raw HTML.
pub(crate) fn scrape_article(html: &str, url: &str, max_chars: usize) -> ScrapedPage {
    let extracted = extract_article(html, max_chars);
    let date = extracted.date.or_else(|| extract_date(html, url));
    ScrapedPage {
        title: extracted.title,
        text: extracted.text,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use crate::strategies::test_support::*;
    use chrono::TimeZone;

    #[test]
    fn test_candidate_ceiling_follows_source_limits() {
        let ctx = context(5);
        let mut source = descriptor(SourceKind::Web);
        assert_eq!(candidate_ceiling(&source, ctx.cap_for(&source)), 15);

        source.max_articles = Some(2);
        assert_eq!(candidate_ceiling(&source, ctx.cap_for(&source)), 2);

        source.max_candidates = Some(7);
        assert_eq!(candidate_ceiling(&source, ctx.cap_for(&source)), 7);
    }

    #[test]
    fn test_metadata_date_beats_cascade() {
        let html = r#"<html><head>
            <meta name="parsely-pub-date" content="2025-02-21T08:00:00Z">
            <meta property="article:published_time" content="2025-01-01T00:00:00Z">
            </head><body><h1>Story</h1><p>Text</p></body></html>"#;
        let page = scrape_article(html, "https://example.com/story", 100);
        assert_eq!(page.title, "Story");
        assert_eq!(
            page.date,
            Some(Utc.with_ymd_and_hms(2025, 2, 21, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_cascade_used_without_metadata() {
        let html = r#"<html><body><h1>Story</h1><time datetime="2025-02-20T10:00:00Z">yesterday</time></body></html>"#;
        let page = scrape_article(html, "https://example.com/story", 100);
        assert_eq!(
            page.date,
            Some(Utc.with_ymd_and_hms(2025, 2, 20, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_url_path_is_the_last_resort() {
        let html = "<html><body><h1>Story</h1></body></html>";
        let page = scrape_article(html, "https://example.com/2025/02/19/story", 100);
        assert_eq!(
            page.date,
            Some(Utc.with_ymd_and_hms(2025, 2, 19, 0, 0, 0).unwrap())
        );
        let undated = scrape_article(html, "https://example.com/story", 100);
        assert_eq!(undated.date, None);
    }
}
