//! Text handling shared by the feed and sitemap strategies.
//!
//! Publishers routinely put HTML named entities (`&rsquo;`, `&nbsp;`) into
//! XML, where only the five predefined ones are legal. These helpers resolve
//! them instead of losing the surrounding text.

use std::borrow::Cow;
use std::fmt::Write;

use quick_xml::escape::{resolve_html5_entity, resolve_predefined_entity};
use quick_xml::events::BytesText;

fn resolve_entity(name: &str) -> Option<&'static str> {
    resolve_predefined_entity(name).or_else(|| resolve_html5_entity(name))
}

/// Unescaped text of `event`, resolving XML and HTML5 entities. A reference
/// nobody knows leaves the run verbatim.
pub(crate) fn text_of(event: &BytesText<'_>) -> String {
    event
        .unescape_with(resolve_entity)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| String::from_utf8_lossy(&**event).into_owned())
}

/// Rewrite HTML5 named entities outside CDATA sections as numeric character
/// references, which every XML parser accepts. Predefined XML entities,
/// numeric references, and unknown names are left alone.
pub(crate) fn html_entities_to_numeric(xml: &str) -> Cow<'_, str> {
    if !xml.contains('&') {
        return Cow::Borrowed(xml);
    }

    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(pos) = rest.find(['&', '<']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with("<![CDATA[") {
            let end = rest.find("]]>").map_or(rest.len(), |i| i + 3);
            out.push_str(&rest[..end]);
            rest = &rest[end..];
            continue;
        }
        if rest.starts_with('<') {
            out.push('<');
            rest = &rest[1..];
            continue;
        }

        let name_len = rest[1..]
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len() - 1);
        let name = &rest[1..1 + name_len];
        let terminated = rest[1 + name_len..].starts_with(';');
        let replacement = if terminated && resolve_predefined_entity(name).is_none() {
            resolve_html5_entity(name)
        } else {
            None
        };

        match replacement {
            Some(text) => {
                for c in text.chars() {
                    let _ = write!(out, "&#x{:X};", u32::from(c));
                }
                rest = &rest[name_len + 2..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// `xml` without its `<?xml ...?>` declaration. The body has already been
/// decoded to UTF-8, so a stale `encoding="..."` must not reach the parser.
pub(crate) fn without_declaration(xml: &str) -> &str {
    let start = xml.trim_start_matches('\u{feff}').trim_start();
    if start.starts_with("<?xml") {
        if let Some(end) = start.find("?>") {
            return &start[end + 2..];
        }
    }
    xml
}
