//! Readability-style extraction of one article page: title, main text, and
//! any publication date embedded as page metadata.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{Attempt, collapse_whitespace, first_match, static_selector, visible_text};
use crate::dates;
use crate::utils::truncate_chars;

/// A content container needs at least this much paragraph text to be trusted.
const MIN_CONTAINER_TEXT: usize = 140;

static OG_TITLE: Lazy<Selector> = Lazy::new(|| static_selector(r#"meta[property="og:title"]"#));
static H1: Lazy<Selector> = Lazy::new(|| static_selector("h1"));
static TITLE: Lazy<Selector> = Lazy::new(|| static_selector("title"));
static BODY: Lazy<Selector> = Lazy::new(|| static_selector("body"));
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| static_selector("p"));
static ITEMPROP_PUBLISHED: Lazy<Selector> =
    Lazy::new(|| static_selector(r#"[itemprop="datePublished"]"#));
static NAMED_DATE_META: Lazy<Selector> = Lazy::new(|| {
    static_selector(
        r#"meta[name="parsely-pub-date"], meta[name="sailthru.date"], meta[name="publish-date"], meta[name="publication_date"]"#,
    )
});
static ABBR_PUBLISHED: Lazy<Selector> = Lazy::new(|| static_selector("abbr.published[title]"));

static CONTENT_CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main",
        r#"[role="main"]"#,
        r#"[itemprop="articleBody"]"#,
        ".entry-content",
        ".post-content",
        ".article-body",
        ".article-content",
        ".story-body",
    ]
    .into_iter()
    .map(static_selector)
    .collect()
});

/// What the reader view of an article page yields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedArticle {
    /// Empty when the page has no usable title.
    pub title: String,
    /// Main text, whitespace-collapsed and truncated.
    pub text: String,
    /// Date from page metadata (microdata and publisher tags), if any.
    pub date: Option<DateTime<Utc>>,
}

/// Extract title, main text (at most `max_chars` characters), and metadata date.
pub fn extract_article(html: &str, max_chars: usize) -> ExtractedArticle {
    let document = Html::parse_document(html);
    ExtractedArticle {
        title: extract_title(&document),
        text: truncate_chars(&main_text(&document), max_chars),
        date: metadata_date(&document),
    }
}

/// Plain text of an HTML fragment (feed summaries, content blocks), truncated
/// to `max_chars` characters.
pub fn html_to_text(html: &str, max_chars: usize) -> String {
    let fragment = Html::parse_fragment(html);
    truncate_chars(&visible_text(fragment.root_element()), max_chars)
}

fn extract_title(document: &Html) -> String {
    let og = || {
        document
            .select(&OG_TITLE)
            .filter_map(|m| m.value().attr("content"))
            .map(collapse_whitespace)
            .find(|t| !t.is_empty())
    };
    let heading = || {
        document
            .select(&H1)
            .map(visible_text)
            .find(|t| !t.is_empty())
    };
    let title = || {
        document
            .select(&TITLE)
            .map(visible_text)
            .find(|t| !t.is_empty())
    };
    let attempts: [Attempt<'_, String>; 3] = [&og, &heading, &title];
    first_match(&attempts).unwrap_or_default()
}

fn main_text(document: &Html) -> String {
    let known = CONTENT_CONTAINERS.iter().find_map(|selector| {
        document
            .select(selector)
            .map(paragraph_text)
            .find(|text| text.chars().count() >= MIN_CONTAINER_TEXT)
    });
    if let Some(text) = known {
        return text;
    }

    if let Some(text) = densest_paragraph_parent(document).filter(|t| !t.is_empty()) {
        return text;
    }

    document
        .select(&BODY)
        .next()
        .map(visible_text)
        .unwrap_or_else(|| visible_text(document.root_element()))
}

/// Text of the `<p>` children of `element`, or its whole text when it has none.
fn paragraph_text(element: ElementRef<'_>) -> String {
    let paragraphs: Vec<String> = element
        .select(&PARAGRAPH)
        .map(visible_text)
        .filter(|t| !t.is_empty())
        .collect();
    if paragraphs.is_empty() {
        visible_text(element)
    } else {
        paragraphs.join(" ")
    }
}

/// The element whose direct `<p>` children carry the most text. Ties go to
/// the earliest in document order.
fn densest_paragraph_parent(document: &Html) -> Option<String> {
    let mut scores: Vec<(ElementRef<'_>, usize)> = Vec::new();
    for paragraph in document.select(&PARAGRAPH) {
        let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let len = visible_text(paragraph).chars().count();
        match scores.iter_mut().find(|(el, _)| el.id() == parent.id()) {
            Some((_, score)) => *score += len,
            None => scores.push((parent, len)),
        }
    }

    let mut best: Option<(ElementRef<'_>, usize)> = None;
    for (el, score) in scores {
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((el, score));
        }
    }

    best.map(|(el, _)| paragraph_text(el))
}

fn metadata_date(document: &Html) -> Option<DateTime<Utc>> {
    let itemprop = || {
        document.select(&ITEMPROP_PUBLISHED).find_map(|el| {
            let value = el.value();
            let raw = value
                .attr("datetime")
                .or_else(|| value.attr("content"))
                .map(str::to_string)
                .unwrap_or_else(|| visible_text(el));
            dates::resolve(&raw)
        })
    };
    let named = || {
        document
            .select(&NAMED_DATE_META)
            .filter_map(|m| m.value().attr("content"))
            .find_map(dates::resolve)
    };
    let abbr = || {
        document
            .select(&ABBR_PUBLISHED)
            .filter_map(|a| a.value().attr("title"))
            .find_map(dates::resolve)
    };
    let attempts: [Attempt<'_, DateTime<Utc>>; 3] = [&itemprop, &named, &abbr];
    first_match(&attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn long_paragraph(word: &str) -> String {
        std::iter::repeat_n(word, 40).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_title_prefers_og_then_h1_then_title() {
        let og = r#"<head><title>T</title><meta property="og:title" content="OG Title"></head><body><h1>H</h1></body>"#;
        assert_eq!(extract_article(og, 100).title, "OG Title");
        let h1 = r#"<head><title>T</title></head><body><h1> Heading  One </h1></body>"#;
        assert_eq!(extract_article(h1, 100).title, "Heading One");
        let title = r#"<head><title>Only Title</title></head><body></body>"#;
        assert_eq!(extract_article(title, 100).title, "Only Title");
        assert_eq!(extract_article("<p>x</p>", 100).title, "");
    }

    #[test]
    fn test_article_container_text_beats_chrome() {
        let html = format!(
            r#"<body><nav><p>Menu Menu Menu</p></nav><article><h1>Head</h1><p>{}</p><p>Second.</p></article><footer><p>Footer</p></footer></body>"#,
            long_paragraph("story")
        );
        let extracted = extract_article(&html, 10_000);
        assert!(extracted.text.starts_with("story story"));
        assert!(extracted.text.ends_with("Second."));
        assert!(!extracted.text.contains("Menu"));
        assert!(!extracted.text.contains("Footer"));
    }

    #[test]
    fn test_densest_block_used_without_known_container() {
        let html = format!(
            r#"<body><div class="side"><p>short aside</p></div><div class="c"><p>{}</p><p>{}</p></div></body>"#,
            long_paragraph("alpha"),
            long_paragraph("beta")
        );
        let text = extract_article(&html, 10_000).text;
        assert!(text.starts_with("alpha"));
        assert!(text.contains("beta"));
        assert!(!text.contains("aside"));
    }

    #[test]
    fn test_body_text_when_no_paragraphs() {
        let html = "<body><div>Just some <b>text</b></div><script>ignored()</script></body>";
        assert_eq!(extract_article(html, 100).text, "Just some text");
    }

    #[test]
    fn test_text_is_truncated_by_characters() {
        let html = "<body><div>héllo wörld</div></body>";
        assert_eq!(extract_article(html, 5).text, "héllo");
    }

    #[test]
    fn test_metadata_date_from_microdata_and_publisher_tags() {
        let micro = r#"<body><span itemprop="datePublished" content="2025-02-21T10:00:00Z">Feb 21</span></body>"#;
        assert_eq!(
            extract_article(micro, 10).date,
            Some(Utc.with_ymd_and_hms(2025, 2, 21, 10, 0, 0).unwrap())
        );
        let parsely = r#"<head><meta name="parsely-pub-date" content="2025-02-20T08:30:00Z"></head>"#;
        assert_eq!(
            extract_article(parsely, 10).date,
            Some(Utc.with_ymd_and_hms(2025, 2, 20, 8, 30, 0).unwrap())
        );
        assert_eq!(extract_article("<p>none</p>", 10).date, None);
    }

    #[test]
    fn test_html_to_text_strips_markup_and_entities() {
        assert_eq!(
            html_to_text("<p>Rust &amp; <b>WebAssembly</b></p>\n<p>news</p>", 100),
            "Rust & WebAssembly news"
        );
        assert_eq!(html_to_text("plain words", 5), "plain");
    }
}
