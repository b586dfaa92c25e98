//! The crawler's only door to the network.
//!
//! A [`Transport`] is built once per run from the configured timeout and
//! user agent and handed to every strategy. It is cheap to clone: the
//! underlying `reqwest::Client` shares one connection pool.

use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

use crate::error::CrawlError;

/// How far into the body to look for an in-document charset declaration.
const SNIFF_LEN: usize = 1024;

/// `<?xml ... encoding="..."?>` or `<meta charset="...">` /
/// `<meta http-equiv="Content-Type" content="...; charset=...">`.
static DECLARED_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<\?xml[^>]*\bencoding\s*=\s*["']([\w.:-]+)["']|<meta[^>]*\bcharset\s*=\s*["']?([\w.:-]+)"#)
        .expect("valid charset regex")
});

/// Body and status of a successful (2xx) response.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    /// `charset` parameter of the `Content-Type` header, if any.
    pub charset: Option<String>,
    pub body: Vec<u8>,
}

impl Fetched {
    /// The body's character encoding: a byte-order mark, then the header
    /// charset, then a declaration near the top of the document, then UTF-8.
    pub fn encoding(&self) -> &'static Encoding {
        if let Some((bom, _)) = Encoding::for_bom(&self.body) {
            return bom;
        }
        self.charset
            .as_deref()
            .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
            .or_else(|| declared_encoding(&self.body))
            .unwrap_or(UTF_8)
    }

    /// Body decoded with [`Fetched::encoding`], replacing invalid sequences.
    pub fn text(&self) -> String {
        let (text, encoding, had_errors) = self.encoding().decode(&self.body);
        if had_errors {
            debug!(encoding = encoding.name(), "Body had undecodable bytes");
        }
        text.into_owned()
    }
}

fn declared_encoding(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(SNIFF_LEN)];
    let caps = DECLARED_CHARSET.captures(head)?;
    let label = caps.get(1).or_else(|| caps.get(2))?;
    Encoding::for_label(label.as_bytes())
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}

#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    /// Build a client that applies `timeout` and `user_agent` to every request.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the underlying client cannot be
    /// constructed (e.g., invalid TLS config).
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url`.
    ///
    /// # Errors
    ///
    /// - [`CrawlError::UnexpectedStatus`] for any non-2xx response.
    /// - [`CrawlError::Http`] for network failures and timeouts.
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Result<Fetched, CrawlError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(charset_param);
        let body = response.bytes().await?.to_vec();
        debug!(status = status.as_u16(), bytes = body.len(), ?charset, "Fetched");
        Ok(Fetched {
            status: status.as_u16(),
            charset,
            body,
        })
    }

    /// GET `url` and decode the body as text in its declared encoding.
    pub async fn get_text(&self, url: &str) -> Result<String, CrawlError> {
        Ok(self.get(url).await?.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetched(charset: Option<&str>, body: &[u8]) -> Fetched {
        Fetched {
            status: 200,
            charset: charset.map(str::to_string),
            body: body.to_vec(),
        }
    }

    #[test]
    fn test_charset_param_is_read_from_content_type() {
        assert_eq!(
            charset_param("text/html; charset=ISO-8859-1"),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(
            charset_param(r#"application/rss+xml;Charset="utf-8""#),
            Some("utf-8".to_string())
        );
        assert_eq!(charset_param("text/html"), None);
    }

    #[test]
    fn test_header_charset_decodes_latin1() {
        let page = fetched(Some("iso-8859-1"), b"<title>Caf\xe9 na\xefve</title>");
        assert_eq!(page.text(), "<title>Caf\u{e9} na\u{ef}ve</title>");
    }

    #[test]
    fn test_xml_declaration_names_the_encoding() {
        let feed = fetched(
            None,
            b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><rss><title>Caf\xe9</title></rss>",
        );
        assert_eq!(feed.encoding().name(), "windows-1252");
        assert!(feed.text().contains("Caf\u{e9}"));
    }

    #[test]
    fn test_meta_charset_names_the_encoding() {
        let page = fetched(
            None,
            b"<html><head><meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1251\"></head>\xcf\xf0\xe8</html>",
        );
        assert_eq!(page.encoding().name(), "windows-1251");
        assert!(page.text().contains("\u{41f}\u{440}\u{438}"));
    }

    #[test]
    fn test_unlabelled_body_is_utf8() {
        let page = fetched(None, "<p>caf\u{e9}</p>".as_bytes());
        assert_eq!(page.encoding(), UTF_8);
        assert_eq!(page.text(), "<p>caf\u{e9}</p>");
    }

    #[test]
    fn test_bom_beats_a_wrong_header() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice("caf\u{e9}".as_bytes());
        let page = fetched(Some("iso-8859-1"), &body);
        assert_eq!(page.text(), "caf\u{e9}");
    }
}
