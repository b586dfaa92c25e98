//! Date resolution for the free-form timestamps found in feeds, sitemaps, and
//! HTML metadata.
//!
//! Everything here is pure: no clock reads, no I/O. Inputs without an offset
//! are taken to be UTC, and every successful parse is normalized to
//! [`DateTime<Utc>`]. Unparseable input yields `None`, never an error.
//!
//! Relative phrases ("3 hours ago") are deliberately unsupported because they
//! would make the result depend on the wall clock.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

/// `/2025/02/21/`, `/2025-02-21/` or `/20250221/`.
static DATE_IN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(\d{4})[/-](\d{2})[/-](\d{2})/|/(\d{8})/").expect("valid url date regex")
});

/// A leading day name, which chrono checks against the date and rejects on mismatch.
static WEEKDAY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(mon|tue|wed|thu|fri|sat|sun)[a-z]*\.?,?\s+").expect("valid weekday regex")
});

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex"));

/// Trailing zone abbreviations that neither RFC 2822 nor `%z` understand.
const ZONE_ABBREVIATIONS: [(&str, &str); 17] = [
    ("UTC", "+0000"),
    ("GMT", "+0000"),
    ("UT", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("JST", "+0900"),
    ("KST", "+0900"),
    ("HKT", "+0800"),
];

const OFFSET_FORMATS: [&str; 9] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%d %H:%M %z",
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M %z",
    "%d %b %Y %H:%M:%S %z",
    "%a %b %d %H:%M:%S %z %Y",
];

const NAIVE_DATETIME_FORMATS: [&str; 14] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y%m%dT%H%M%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y, %I:%M %p",
    "%d %B %Y %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 14] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%b. %d, %Y",
    "%A, %B %d, %Y",
    "%a, %d %b %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y年%m月%d日",
];

/// Parse any supported date/time representation into a UTC instant.
///
/// Tries, in order: RFC 3339, RFC 2822, offset-bearing ISO-like and mail
/// formats (after mapping `Z` and common zone abbreviations to numeric
/// offsets), naive date-times (assumed UTC), bare dates (UTC midnight), and
/// ten-digit Unix timestamps.
pub fn resolve(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(dt) = parse_strict(trimmed) {
        return Some(dt);
    }

    let cleaned = normalize_zone(&ORDINAL_SUFFIX.replace_all(trimmed, "$1"));

    // Publishers get the day name wrong; the date itself is still usable.
    resolve_cleaned(&cleaned).or_else(|| {
        let without_weekday = WEEKDAY_PREFIX.replace(&cleaned, "");
        if without_weekday.len() < cleaned.len() {
            resolve_cleaned(&without_weekday)
        } else {
            None
        }
    })
}

fn resolve_cleaned(cleaned: &str) -> Option<DateTime<Utc>> {
    if let Some(dt) = parse_strict(cleaned) {
        return Some(dt);
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(cleaned, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(cleaned, fmt) {
            return utc_midnight(date);
        }
    }

    if cleaned.len() == 10 && cleaned.bytes().all(|b| b.is_ascii_digit()) {
        let secs: i64 = cleaned.parse().ok()?;
        return DateTime::from_timestamp(secs, 0);
    }

    None
}

/// RFC 3339 or RFC 2822 only. Feed dates that are well-formed take this path.
pub fn parse_strict(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_rfc2822(text))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Lowest-confidence fallback: a date encoded in the URL path.
///
/// Only the first `/YYYY/MM/DD/`, `/YYYY-MM-DD/` or `/YYYYMMDD/` occurrence is
/// considered; an impossible calendar date yields `None`.
pub fn date_from_url_path(url: &str) -> Option<DateTime<Utc>> {
    let path = url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    let caps = DATE_IN_URL.captures(&path)?;
    let (y, m, d) = if let Some(year) = caps.get(1) {
        (
            year.as_str().parse().ok()?,
            caps.get(2)?.as_str().parse().ok()?,
            caps.get(3)?.as_str().parse().ok()?,
        )
    } else {
        let raw = caps.get(4)?.as_str();
        (
            raw[..4].parse().ok()?,
            raw[4..6].parse().ok()?,
            raw[6..8].parse().ok()?,
        )
    };

    utc_midnight(NaiveDate::from_ymd_opt(y, m, d)?)
}

/// Canonical string form used in article records, e.g. `2025-02-21T10:00:00+00:00`.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

fn utc_midnight(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive))
}

fn normalize_zone(text: &str) -> String {
    if let Some(stripped) = text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        if stripped.ends_with(|c: char| c.is_ascii_digit()) {
            return format!("{stripped}+0000");
        }
    }

    for (abbr, offset) in ZONE_ABBREVIATIONS {
        if let Some(stripped) = text.strip_suffix(abbr) {
            if stripped.ends_with(' ') {
                return format!("{stripped}{offset}");
            }
        }
    }

    text.to_string()
}
