//! RSS 0.9x/1.0/2.0, Atom, and JSON Feed sources.
//!
//! The feed document is fetched once and handed to `feed-rs`. Entries are
//! walked in document order; an entry's date is its published timestamp,
//! falling back to its updated one. Every timestamp goes through the lenient
//! [`dates::resolve`], which tries RFC 2822/3339 first. Entries without a
//! date are dropped.

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::{info, instrument};

use super::xml::{html_entities_to_numeric, without_declaration};
use super::{CrawlContext, DatePolicy, record};
use crate::dates;
use crate::error::CrawlError;
use crate::extract::html_to_text;
use crate::models::{ArticleRecord, SourceDescriptor};
use crate::transport::Transport;

const POLICY: DatePolicy = DatePolicy::DropOnUnknown;

/// Fetch `source` as a feed and keep up to the cap of in-window entries.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch(
    transport: &Transport,
    source: &SourceDescriptor,
    ctx: &CrawlContext,
) -> Result<Vec<ArticleRecord>, CrawlError> {
    let body = transport.get_text(&source.url).await?;
    let entries = parse_feed(&body)?;
    let articles = select_entries(&entries, source, ctx);
    info!(
        entries = entries.len(),
        accepted = articles.len(),
        "Feed processed"
    );
    Ok(articles)
}

/// Parse an already-decoded feed body into its entries, in document order.
///
/// # Errors
///
/// [`CrawlError::Feed`] when the body is not a feed `feed-rs` understands.
pub(crate) fn parse_feed(body: &str) -> Result<Vec<Entry>, CrawlError> {
    let xml = html_entities_to_numeric(without_declaration(body));
    let feed = parser::Builder::new()
        .timestamp_parser(dates::resolve)
        .build()
        .parse(xml.as_bytes())?;
    Ok(feed.entries)
}

/// Apply the window, the date policy, and the cap to parsed entries.
pub(crate) fn select_entries(
    entries: &[Entry],
    source: &SourceDescriptor,
    ctx: &CrawlContext,
) -> Vec<ArticleRecord> {
    let cap = ctx.cap_for(source);
    let mut articles = Vec::new();

    for entry in entries {
        if articles.len() >= cap {
            break;
        }
        let Some(published_at) = POLICY.admit(entry_published(entry), &ctx.window) else {
            continue;
        };
        let url = entry_link(entry).unwrap_or(&source.url);
        let summary = entry_summary(entry)
            .map(|raw| html_to_text(raw, ctx.max_content_chars))
            .unwrap_or_default();
        articles.push(record(source, entry_title(entry), url, published_at, summary));
    }

    articles
}

fn entry_title(entry: &Entry) -> &str {
    entry
        .title
        .as_ref()
        .map(|t| t.content.as_str())
        .unwrap_or_default()
}

fn entry_published(entry: &Entry) -> Option<DateTime<Utc>> {
    entry.published.or(entry.updated)
}

/// `rel="alternate"` (or no rel) first, then any link at all.
fn entry_link(entry: &Entry) -> Option<&str> {
    let usable = || {
        entry
            .links
            .iter()
            .map(|link| (link, link.href.trim()))
            .filter(|(_, href)| !href.is_empty())
    };
    usable()
        .find(|(link, _)| {
            link.rel
                .as_deref()
                .is_none_or(|rel| rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| usable().next())
        .map(|(_, href)| href)
}

/// Short-form summary if present, else the first content block.
fn entry_summary(entry: &Entry) -> Option<&str> {
    entry
        .summary
        .as_ref()
        .map(|s| s.content.as_str())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| {
            entry
                .content
                .as_ref()
                .and_then(|c| c.body.as_deref())
                .filter(|b| !b.trim().is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PublishedAt, SourceKind};
    use crate::strategies::test_support::*;

    fn rss(items: &[(String, String, String)]) -> String {
        let body: String = items
            .iter()
            .map(|(title, link, date)| {
                format!(
                    "<item><title>{title}</title><link>{link}</link><pubDate>{date}</pubDate>\
                     <description><![CDATA[<p>About <b>{title}</b></p>]]></description></item>"
                )
            })
            .collect();
        format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Chan</title><link>https://example.com/</link><description>d</description>{body}</channel></rss>"#)
    }

    fn item(title: &str, link: &str, published: DateTime<Utc>) -> (String, String, String) {
        (title.to_string(), link.to_string(), published.to_rfc2822())
    }

    fn select(xml: &str, cap: usize) -> Vec<ArticleRecord> {
        let entries = parse_feed(xml).unwrap();
        select_entries(&entries, &descriptor(SourceKind::Feed), &context(cap))
    }

    #[test]
    fn test_rss_items_keep_document_order() {
        let xml = rss(&[
            item("One", "https://example.com/1", hours_ago(2)),
            item("Two", "https://example.com/2", hours_ago(3)),
        ]);
        let articles = select(&xml, 5);
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "One");
        assert_eq!(articles[0].url, "https://example.com/1");
        assert_eq!(articles[0].summary, "About One");
        assert_eq!(articles[0].published_at, PublishedAt::At(hours_ago(2)));
        assert_eq!(articles[1].title, "Two");
    }

    #[test]
    fn test_atom_prefers_alternate_link_and_published_date() {
        let xml = format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title>
  <id>urn:feed</id>
  <updated>{updated}</updated>
  <entry>
    <title>Rust &amp; friends</title>
    <id>urn:entry:1</id>
    <link rel="replies" href="https://example.com/a/comments"/>
    <link rel="alternate" href="https://example.com/a"/>
    <updated>{updated}</updated>
    <published>{published}</published>
    <summary>Body text</summary>
  </entry>
</feed>"#,
            updated = hours_ago(1).to_rfc3339(),
            published = hours_ago(5).to_rfc3339(),
        );
        let articles = select(&xml, 5);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Rust & friends");
        assert_eq!(articles[0].url, "https://example.com/a");
        assert_eq!(articles[0].published_at, PublishedAt::At(hours_ago(5)));
        assert_eq!(articles[0].summary, "Body text");
    }

    #[test]
    fn test_html_entities_do_not_lose_title_or_summary() {
        let xml = format!(
            r#"<rss version="2.0"><channel><title>C</title><link>https://e.com/</link><description>d</description>
            <item><title>Apple&rsquo;s new chip</title><link>https://e.com/a</link>
            <pubDate>{}</pubDate><description>Fast&nbsp;and cheap</description></item>
            </channel></rss>"#,
            hours_ago(1).to_rfc2822()
        );
        let articles = select(&xml, 5);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Apple\u{2019}s new chip");
        assert_eq!(articles[0].url, "https://e.com/a");
        assert_eq!(articles[0].summary, "Fast and cheap");
    }

    #[test]
    fn test_wrong_weekday_still_dates_the_entry() {
        // 2025-02-21 was a Friday.
        let xml = r#"<rss version="2.0"><channel><title>C</title><link>https://e.com/</link><description>d</description>
            <item><title>Sloppy</title><link>https://e.com/s</link><pubDate>Thu, 21 Feb 2025 10:00:00 GMT</pubDate></item>
            </channel></rss>"#;
        let articles = select(xml, 5);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].published_at, PublishedAt::At(hours_ago(2)));
    }

    #[test]
    fn test_lenient_date_is_used() {
        let xml = r#"<rss version="2.0"><channel><title>C</title><link>https://e.com/</link><description>d</description>
            <item><title>Naive</title><link>https://e.com/n</link><pubDate>2025-02-21 07:30</pubDate></item>
            </channel></rss>"#;
        let articles = select(xml, 5);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].published_at.to_string(), "2025-02-21T07:30:00+00:00");
    }

    #[test]
    fn test_stale_declaration_encoding_is_ignored() {
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
             <rss version=\"2.0\"><channel><title>C</title><link>https://e.com/</link><description>d</description>\
             <item><title>Caf\u{e9} na\u{ef}ve</title><link>https://e.com/c</link><pubDate>{}</pubDate></item>\
             </channel></rss>",
            hours_ago(1).to_rfc2822()
        );
        let articles = select(&xml, 5);
        assert_eq!(articles[0].title, "Caf\u{e9} na\u{ef}ve");
    }

    #[test]
    fn test_non_feed_is_an_error() {
        assert!(matches!(
            parse_feed("<html><body>not a feed</body></html>"),
            Err(CrawlError::Feed(_))
        ));
    }

    #[test]
    fn test_select_filters_window_and_drops_undated() {
        let xml = format!(
            r#"<rss version="2.0"><channel><title>C</title><link>https://e.com/</link><description>d</description>
            <item><title>Fresh</title><link>https://e.com/fresh</link><pubDate>{}</pubDate><description>Hello &lt;b&gt;there&lt;/b&gt;</description></item>
            <item><title>Undated</title><link>https://e.com/undated</link></item>
            <item><title>Old</title><link>https://e.com/old</link><pubDate>{}</pubDate></item>
            </channel></rss>"#,
            hours_ago(2).to_rfc2822(),
            hours_ago(72).to_rfc2822(),
        );
        let articles = select(&xml, 5);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Fresh");
        assert_eq!(articles[0].summary, "Hello there");
        assert_eq!(articles[0].source, "Example");
    }

    #[test]
    fn test_select_respects_cap_in_document_order() {
        let items: Vec<_> = (0..5)
            .map(|i| item(&format!("T{i}"), &format!("https://e.com/{i}"), hours_ago(i + 1)))
            .collect();
        let articles = select(&rss(&items), 3);
        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["T0", "T1", "T2"]);
    }

    #[test]
    fn test_missing_link_falls_back_to_source_url_and_summary_is_truncated() {
        let long = "word ".repeat(100);
        let xml = format!(
            r#"<rss version="2.0"><channel><title>C</title><link>https://e.com/</link><description>d</description>
            <item><title>No link</title><pubDate>{}</pubDate><description>{long}</description></item></channel></rss>"#,
            hours_ago(1).to_rfc2822()
        );
        let articles = select(&xml, 5);
        assert_eq!(articles[0].url, "https://example.com/source");
        assert_eq!(articles[0].summary.chars().count(), 200);
    }
}
