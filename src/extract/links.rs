//! Candidate article links on a listing page.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{Attempt, first_match, static_selector};
use crate::error::CrawlError;

static ANCHOR: Lazy<Selector> = Lazy::new(|| static_selector("a[href]"));
static ARTICLE: Lazy<Selector> = Lazy::new(|| static_selector("article"));
static HEADING_ANCHOR: Lazy<Selector> =
    Lazy::new(|| static_selector("h1 a[href], h2 a[href], h3 a[href], h4 a[href]"));
static MAIN_HEADINGS: Lazy<Selector> =
    Lazy::new(|| static_selector("main h2 a, main h3 a, main h4 a"));
static TITLE_CLASSES: Lazy<Selector> = Lazy::new(|| {
    static_selector(
        ".post-title a, .entry-title a, .article-title a, .news-title a, .item-title a, h2 > a, h3 > a",
    )
});

/// Paths that are navigation, taxonomy, or legal pages rather than articles.
static NOISE_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)/(tag|tags|category|categories|author|page|search|login|signup|about|contact|privacy|terms)(/|$)",
    )
    .expect("valid noise path regex")
});

/// Article links found on `html`, resolved against `base_url`.
///
/// With a `selector`, only matching elements are used. Otherwise the first
/// heuristic that yields a usable link wins: `<article>` blocks, headings
/// inside `<main>`, then common title classes; failing all three, every
/// anchor on the page. A tier whose links are all noise counts as empty.
/// Results keep first-seen order and contain no exact duplicates.
///
/// # Errors
///
/// [`CrawlError::InvalidUrl`] if `base_url` does not parse and
/// [`CrawlError::InvalidSelector`] if `selector` is not valid CSS.
pub fn extract_links(
    html: &str,
    base_url: &str,
    selector: Option<&str>,
) -> Result<Vec<String>, CrawlError> {
    let base = Url::parse(base_url).map_err(|source| CrawlError::InvalidUrl {
        url: base_url.to_string(),
        source,
    })?;
    let document = Html::parse_document(html);

    let links = match selector {
        Some(css) => {
            let explicit = Selector::parse(css).map_err(|e| CrawlError::InvalidSelector {
                selector: css.to_string(),
                reason: format!("{e:?}"),
            })?;
            links_of(document.select(&explicit), &base)
        }
        None => heuristic_links(&document, &base),
    };

    Ok(links.into_iter().unique().collect())
}

fn heuristic_links(document: &Html, base: &Url) -> Vec<String> {
    let in_articles = || non_empty(links_of(document.select(&ARTICLE), base));
    let in_main_headings = || non_empty(links_of(document.select(&MAIN_HEADINGS), base));
    let in_title_classes = || non_empty(links_of(document.select(&TITLE_CLASSES), base));
    let attempts: [Attempt<'_, Vec<String>>; 3] = [&in_articles, &in_main_headings, &in_title_classes];

    first_match(&attempts).unwrap_or_else(|| links_of(document.select(&ANCHOR), base))
}

fn non_empty(links: Vec<String>) -> Option<Vec<String>> {
    (!links.is_empty()).then_some(links)
}

/// An anchor contributes its own link. Any other element contributes the
/// link of its first heading anchor, else of its first anchor that survives
/// [`normalize`], so a category badge ahead of the headline is passed over.
fn links_of<'a>(elements: impl Iterator<Item = ElementRef<'a>>, base: &Url) -> Vec<String> {
    elements
        .filter_map(|el| {
            if el.value().name() == "a" {
                return el.value().attr("href").and_then(|href| normalize(href, base));
            }
            el.select(&HEADING_ANCHOR)
                .chain(el.select(&ANCHOR))
                .filter_map(|a| a.value().attr("href"))
                .find_map(|href| normalize(href, base))
        })
        .collect()
}

fn normalize(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }
    if NOISE_PATH.is_match(resolved.path()) {
        return None;
    }
    Some(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://news.example.com/latest/";

    #[test]
    fn test_article_containers_take_priority() {
        let html = r#"<body>
            <nav><a href="/home">Home</a></nav>
            <article><h2><a href="/2025/02/21/first">First</a></h2><a href="/2025/02/21/first#comments">c</a></article>
            <article><a href="second">Second</a></article>
            <footer><a href="/elsewhere">x</a></footer>
        </body>"#;
        let links = extract_links(html, BASE, None).unwrap();
        assert_eq!(
            links,
            vec![
                "https://news.example.com/2025/02/21/first",
                "https://news.example.com/latest/second",
            ]
        );
    }

    #[test]
    fn test_main_headings_used_when_no_articles() {
        let html = r#"<body>
            <a href="/sidebar">side</a>
            <main><h3><a href="/one">One</a></h3><p><a href="/inline">inline</a></p><h4><a href="/two">Two</a></h4></main>
        </body>"#;
        let links = extract_links(html, BASE, None).unwrap();
        assert_eq!(
            links,
            vec!["https://news.example.com/one", "https://news.example.com/two"]
        );
    }

    #[test]
    fn test_title_classes_used_when_no_main() {
        let html = r#"<div><a href="/nav">nav</a>
            <div class="entry-title"><a href="/post-a">A</a></div>
            <h2><a href="/post-b">B</a></h2></div>"#;
        let links = extract_links(html, BASE, None).unwrap();
        assert_eq!(
            links,
            vec![
                "https://news.example.com/post-a",
                "https://news.example.com/post-b",
            ]
        );
    }

    #[test]
    fn test_falls_back_to_every_anchor() {
        let html = r#"<div><a href="/x">x</a><span><a href="https://other.example.org/y">y</a></span></div>"#;
        let links = extract_links(html, BASE, None).unwrap();
        assert_eq!(
            links,
            vec!["https://news.example.com/x", "https://other.example.org/y"]
        );
    }

    #[test]
    fn test_explicit_selector_is_exclusive() {
        let html = r#"<article><a href="/from-article">a</a></article>
            <ul class="stories"><li><a href="/s1">1</a></li><li><a href="/s2">2</a></li></ul>"#;
        let links = extract_links(html, BASE, Some("ul.stories a")).unwrap();
        assert_eq!(
            links,
            vec!["https://news.example.com/s1", "https://news.example.com/s2"]
        );
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let result = extract_links("<a href='/x'>x</a>", BASE, Some("a[[["));
        assert!(matches!(result, Err(CrawlError::InvalidSelector { .. })));
    }

    #[test]
    fn test_deduplicates_exact_urls_keeping_first_seen_order() {
        let html = r#"<a href="/b">b</a><a href="/a">a</a><a href="https://news.example.com/b">b again</a>"#;
        let links = extract_links(html, BASE, None).unwrap();
        assert_eq!(
            links,
            vec!["https://news.example.com/b", "https://news.example.com/a"]
        );
    }

    #[test]
    fn test_drops_noise_paths_and_non_http_schemes() {
        let html = r##"
            <a href="/tag/foo">tag</a>
            <a href="/category/bar">cat</a>
            <a href="/Author/jane/">author</a>
            <a href="/page/2">page</a>
            <a href="/about">about</a>
            <a href="mailto:news@example.com">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="#top">top</a>
            <a href="/tagged-stories/keep">keep</a>"##;
        let links = extract_links(html, BASE, None).unwrap();
        assert_eq!(links, vec!["https://news.example.com/tagged-stories/keep"]);
    }

    #[test]
    fn test_headline_wins_over_badge_link_in_article() {
        let html = r#"<body>
            <article><a href="/category/ai">AI</a><h2><a href="/post-1">P1</a></h2></article>
            <article><a href="/category/ai">AI</a><h2><a href="/post-2">P2</a></h2></article>
        </body>"#;
        let links = extract_links(html, "https://e.com/", None).unwrap();
        assert_eq!(links, vec!["https://e.com/post-1", "https://e.com/post-2"]);
    }

    #[test]
    fn test_article_without_heading_uses_first_usable_anchor() {
        let html = r#"<article><a href="/tag/rust">rust</a><a href="mailto:x@e.com">m</a><a href="/story">Story</a></article>"#;
        let links = extract_links(html, "https://e.com/", None).unwrap();
        assert_eq!(links, vec!["https://e.com/story"]);
    }

    #[test]
    fn test_tier_with_only_noise_links_falls_through() {
        let html = r#"<body>
            <article><a href="/tag/x">x</a></article>
            <main><h2><a href="/real-story">Real</a></h2></main>
        </body>"#;
        let links = extract_links(html, "https://e.com/", None).unwrap();
        assert_eq!(links, vec!["https://e.com/real-story"]);
    }

    #[test]
    fn test_invalid_base_url_is_an_error() {
        assert!(matches!(
            extract_links("<a href='/x'>x</a>", "not a url", None),
            Err(CrawlError::InvalidUrl { .. })
        ));
    }
}
