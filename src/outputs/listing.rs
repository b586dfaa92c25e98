//! Plain-text listing of collected articles, printed after a run.

use std::fmt::Write;

use crate::models::ArticleRecord;
use crate::utils::truncate_chars;

/// Characters of summary shown per article.
const SUMMARY_PREVIEW_CHARS: usize = 100;

/// One block per article, in collection order:
///
/// ```text
/// [Example Blog] Some headline
///   2025-02-21T09:30:00+00:00 | https://blog.example.com/some-headline
///   First hundred characters of the summary...
/// ```
///
/// The summary line is omitted when there is no summary.
pub fn render_listing(articles: &[ArticleRecord]) -> String {
    let mut out = String::new();
    for article in articles {
        let _ = writeln!(out, "[{}] {}", article.source, article.title);
        let _ = writeln!(out, "  {} | {}", article.published_at, article.url);
        if !article.summary.is_empty() {
            let preview = truncate_chars(&article.summary, SUMMARY_PREVIEW_CHARS);
            let ellipsis = if preview.len() < article.summary.len() { "..." } else { "" };
            let _ = writeln!(out, "  {preview}{ellipsis}");
        }
    }
    let _ = writeln!(out, "{} article(s)", articles.len());
    out
}
