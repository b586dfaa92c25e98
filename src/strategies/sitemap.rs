//! XML sitemaps, sitemap indexes, and Google News sitemaps.
//!
//! The root document is fetched once. An index is expanded into its child
//! sitemaps, read in document order until the cap is met; any other urlset is
//! itself the only leaf. Sitemaps carry no body text, so every record has an
//! empty summary.

use chrono::{DateTime, Utc};
use quick_xml::NsReader;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use tracing::{debug, info, instrument, warn};

use super::xml::text_of;
use super::{CrawlContext, DatePolicy, record};
use crate::dates;
use crate::error::CrawlError;
use crate::models::{ArticleRecord, SourceDescriptor};
use crate::transport::Transport;

const POLICY: DatePolicy = DatePolicy::DropOnUnknown;

const SITEMAP_NS: &[u8] = b"http://www.sitemaps.org/schemas/sitemap/0.9";
const NEWS_NS: &[u8] = b"http://www.google.com/schemas/sitemap-news/0.9";

/// A parsed sitemap file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SitemapDocument {
    /// Child sitemap URLs of a `<sitemapindex>`.
    Index(Vec<String>),
    /// Entries of a `<urlset>`.
    UrlSet(Vec<SitemapUrl>),
}

/// One `<url>` entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct SitemapUrl {
    pub loc: String,
    pub lastmod: Option<String>,
    pub news_title: Option<String>,
    pub news_publication_date: Option<String>,
}

impl SitemapUrl {
    /// News publication date, falling back to `lastmod`.
    fn published(&self) -> Option<DateTime<Utc>> {
        self.news_publication_date
            .as_deref()
            .and_then(dates::resolve)
            .or_else(|| self.lastmod.as_deref().and_then(dates::resolve))
    }

    fn title(&self) -> &str {
        self.news_title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.loc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vocabulary {
    Sitemap,
    News,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Loc,
    Lastmod,
    NewsTitle,
    NewsPublicationDate,
}

impl Field {
    fn of(vocabulary: Vocabulary, local: &[u8]) -> Option<Self> {
        match (vocabulary, local) {
            (Vocabulary::Sitemap, b"loc") => Some(Field::Loc),
            (Vocabulary::Sitemap, b"lastmod") => Some(Field::Lastmod),
            (Vocabulary::News, b"title") => Some(Field::NewsTitle),
            (Vocabulary::News, b"publication_date") => Some(Field::NewsPublicationDate),
            _ => None,
        }
    }

    fn slot(self, url: &mut SitemapUrl) -> &mut String {
        match self {
            Field::Loc => &mut url.loc,
            Field::Lastmod => url.lastmod.get_or_insert_with(String::new),
            Field::NewsTitle => url.news_title.get_or_insert_with(String::new),
            Field::NewsPublicationDate => {
                url.news_publication_date.get_or_insert_with(String::new)
            }
        }
    }
}

fn vocabulary(ns: &ResolveResult<'_>) -> Vocabulary {
    match ns {
        ResolveResult::Unbound => Vocabulary::Sitemap,
        ResolveResult::Bound(Namespace(uri)) if *uri == SITEMAP_NS => Vocabulary::Sitemap,
        ResolveResult::Bound(Namespace(uri)) if *uri == NEWS_NS => Vocabulary::News,
        _ => Vocabulary::Other,
    }
}

/// Fetch `source` as a sitemap (or sitemap index) and keep up to the cap of
/// in-window URLs across all leaves.
///
/// # Errors
///
/// Only when the root document cannot be fetched or parsed. A child sitemap
/// that fails is logged and skipped.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn fetch(
    transport: &Transport,
    source: &SourceDescriptor,
    ctx: &CrawlContext,
) -> Result<Vec<ArticleRecord>, CrawlError> {
    let cap = ctx.cap_for(source);
    let root = transport.get_text(&source.url).await?;
    let mut articles = Vec::new();

    match parse_sitemap(&root)? {
        SitemapDocument::UrlSet(urls) => {
            accept_urls(&urls, source, ctx, cap, &mut articles);
        }
        SitemapDocument::Index(children) => {
            info!(children = children.len(), "Expanding sitemap index");
            for child in &children {
                if articles.len() >= cap {
                    break;
                }
                match read_leaf(transport, child).await {
                    Ok(urls) => accept_urls(&urls, source, ctx, cap, &mut articles),
                    Err(e) => warn!(sitemap = %child, error = %e, "Skipping child sitemap"),
                }
            }
        }
    }

    info!(accepted = articles.len(), "Sitemap processed");
    Ok(articles)
}

async fn read_leaf(transport: &Transport, url: &str) -> Result<Vec<SitemapUrl>, CrawlError> {
    let body = transport.get_text(url).await?;
    match parse_sitemap(&body)? {
        SitemapDocument::UrlSet(urls) => Ok(urls),
        SitemapDocument::Index(nested) => {
            debug!(sitemap = %url, nested = nested.len(), "Nested sitemap index not followed");
            Ok(Vec::new())
        }
    }
}

/// Append in-window URLs to `articles` until it holds `cap` records.
pub(crate) fn accept_urls(
    urls: &[SitemapUrl],
    source: &SourceDescriptor,
    ctx: &CrawlContext,
    cap: usize,
    articles: &mut Vec<ArticleRecord>,
) {
    for url in urls {
        if articles.len() >= cap {
            break;
        }
        let Some(published_at) = POLICY.admit(url.published(), &ctx.window) else {
            continue;
        };
        articles.push(record(
            source,
            url.title(),
            &url.loc,
            published_at,
            String::new(),
        ));
    }
}

/// Parse a `<urlset>` or `<sitemapindex>` document.
///
/// # Errors
///
/// [`CrawlError::NotASitemap`] for any other root element and
/// [`CrawlError::Xml`] for malformed XML before the first complete entry.
pub(crate) fn parse_sitemap(xml: &str) -> Result<SitemapDocument, CrawlError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut is_index: Option<bool> = None;
    let mut entries: Vec<SitemapUrl> = Vec::new();
    let mut current: Option<SitemapUrl> = None;
    let mut field: Option<Field> = None;

    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => {
                let vocab = vocabulary(&ns);
                let local = e.local_name();
                match is_index {
                    None => {
                        is_index = match (vocab, local.as_ref()) {
                            (Vocabulary::Sitemap, b"sitemapindex") => Some(true),
                            (Vocabulary::Sitemap, b"urlset") => Some(false),
                            _ => {
                                return Err(CrawlError::NotASitemap {
                                    root: String::from_utf8_lossy(local.as_ref()).into_owned(),
                                });
                            }
                        };
                    }
                    Some(_) if current.is_none() => {
                        if vocab == Vocabulary::Sitemap
                            && matches!(local.as_ref(), b"url" | b"sitemap")
                        {
                            current = Some(SitemapUrl::default());
                        }
                    }
                    Some(_) => field = Field::of(vocab, local.as_ref()),
                }
            }
            Ok((ns, Event::End(e))) => {
                let vocab = vocabulary(&ns);
                if vocab == Vocabulary::Sitemap
                    && matches!(e.local_name().as_ref(), b"url" | b"sitemap")
                {
                    if let Some(entry) = current.take() {
                        if !entry.loc.trim().is_empty() {
                            entries.push(entry);
                        }
                    }
                }
                field = None;
            }
            Ok((_, Event::Text(e))) => {
                if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    f.slot(entry).push_str(&text_of(&e));
                }
            }
            Ok((_, Event::CData(e))) => {
                if let (Some(f), Some(entry)) = (field, current.as_mut()) {
                    f.slot(entry)
                        .push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Ok((_, Event::Eof)) => break,
            Err(e) if entries.is_empty() => return Err(CrawlError::Xml(e)),
            Err(e) => {
                warn!(error = %e, kept = entries.len(), "Sitemap XML broke off; keeping entries read so far");
                break;
            }
            _ => {}
        }
    }

    for entry in &mut entries {
        entry.loc = entry.loc.trim().to_string();
    }

    match is_index {
        Some(true) => Ok(SitemapDocument::Index(
            entries.into_iter().map(|entry| entry.loc).collect(),
        )),
        Some(false) => Ok(SitemapDocument::UrlSet(entries)),
        None => Err(CrawlError::NotASitemap {
            root: String::new(),
        }),
    }
}
