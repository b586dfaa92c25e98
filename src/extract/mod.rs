//! Signals pulled out of raw HTML.
//!
//! - [`date`]: publication date cascade (structured data, meta tags, `<time>`, URL)
//! - [`links`]: candidate article links on a listing page
//! - [`content`]: readability-style title/body/metadata extraction for one article
//!
//! All functions here are synchronous and own their parsed document for the
//! duration of the call, so callers can use them freely between awaits.

pub mod content;
pub mod date;
pub mod links;

pub use content::{ExtractedArticle, extract_article, html_to_text};
pub use date::extract_date;
pub use links::extract_links;

use scraper::{ElementRef, Selector};

/// An attempt in a priority-ordered fallback chain.
pub(crate) type Attempt<'a, T> = &'a dyn Fn() -> Option<T>;

/// Run `attempts` in order and return the first hit.
pub(crate) fn first_match<T>(attempts: &[Attempt<'_, T>]) -> Option<T> {
    attempts.iter().find_map(|attempt| attempt())
}

/// Parse a selector that is known at compile time.
pub(crate) fn static_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Text of `element` with `<script>`, `<style>` and `<noscript>` bodies left out
/// and runs of whitespace collapsed to single spaces.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"))
        });
        if !hidden {
            out.push(' ');
            out.push_str(text);
        }
    }
    collapse_whitespace(&out)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
