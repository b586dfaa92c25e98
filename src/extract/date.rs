//! Publication date cascade for a single HTML page.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::{Attempt, collapse_whitespace, first_match, static_selector};
use crate::dates;

static LD_JSON: Lazy<Selector> = Lazy::new(|| static_selector(r#"script[type*="ld+json"]"#));
static META: Lazy<Selector> = Lazy::new(|| static_selector("meta"));
static TIME: Lazy<Selector> = Lazy::new(|| static_selector("time"));

const STRUCTURED_DATE_FIELDS: [&str; 3] = ["datePublished", "dateModified", "dateCreated"];

/// Checked in this order; each key is matched against both `property` and `name`.
const META_DATE_KEYS: [&str; 6] = [
    "article:published_time",
    "article:modified_time",
    "og:updated_time",
    "date",
    "pubdate",
    "DC.date",
];

/// Best publication date for the page at `url`.
///
/// Structured data beats meta tags, meta tags beat `<time>` elements, and a
/// date in the URL path is the last resort. A malformed JSON-LD block is
/// skipped, not fatal.
pub fn extract_date(html: &str, url: &str) -> Option<DateTime<Utc>> {
    let document = Html::parse_document(html);

    let structured = || structured_data_date(&document);
    let meta = || meta_tag_date(&document);
    let time = || time_element_date(&document);
    let from_url = || dates::date_from_url_path(url);
    let attempts: [Attempt<'_, DateTime<Utc>>; 4] = [&structured, &meta, &time, &from_url];

    first_match(&attempts)
}

fn structured_data_date(document: &Html) -> Option<DateTime<Utc>> {
    document.select(&LD_JSON).find_map(|script| {
        let raw = script.text().collect::<String>();
        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => date_in_json_ld(&value),
            Err(e) => {
                debug!(error = %e, "Skipping malformed JSON-LD block");
                None
            }
        }
    })
}

fn date_in_json_ld(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Object(map) => STRUCTURED_DATE_FIELDS
            .iter()
            .filter_map(|field| map.get(*field).and_then(Value::as_str))
            .find_map(dates::resolve)
            .or_else(|| map.get("@graph").and_then(date_in_json_ld)),
        Value::Array(items) => items.iter().find_map(date_in_json_ld),
        _ => None,
    }
}

fn meta_tag_date(document: &Html) -> Option<DateTime<Utc>> {
    META_DATE_KEYS.iter().find_map(|key| {
        document
            .select(&META)
            .filter(|meta| {
                let el = meta.value();
                el.attr("property")
                    .into_iter()
                    .chain(el.attr("name"))
                    .any(|attr| attr.eq_ignore_ascii_case(key))
            })
            .filter_map(|meta| meta.value().attr("content"))
            .find_map(dates::resolve)
    })
}

fn time_element_date(document: &Html) -> Option<DateTime<Utc>> {
    document.select(&TIME).find_map(|time| {
        let candidate = time
            .value()
            .attr("datetime")
            .map(str::to_string)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| collapse_whitespace(&time.text().collect::<String>()));
        dates::resolve(&candidate)
    })
}
