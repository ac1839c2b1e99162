//! Response body decoding.
//!
//! Bodies are decoded with the charset named by the `Content-Type` header,
//! falling back to a charset declared in the markup and finally to UTF-8.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

/// Markup only declares a charset near the top.
const SNIFF_LIMIT: usize = 1024;

/// `charset=` parameter of a `Content-Type` header value.
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i);\s*charset\s*=\s*["']?([^"';\s]+)"#).expect("valid regex")
});

/// `<meta charset="...">` or the `charset=` inside an http-equiv content value.
#[allow(clippy::expect_used)]
static MARKUP_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s;>]+)"#).expect("valid regex")
});

/// Pick the body encoding from the header, then the markup, then UTF-8.
#[must_use]
pub fn detect_encoding(body: &[u8], content_type: Option<&str>) -> &'static Encoding {
    let from_header = content_type
        .and_then(|value| capture(&HEADER_CHARSET_RE, value))
        .and_then(|label| Encoding::for_label(label.as_bytes()));
    if let Some(encoding) = from_header {
        return encoding;
    }

    let head = String::from_utf8_lossy(&body[..body.len().min(SNIFF_LIMIT)]);
    capture(&MARKUP_CHARSET_RE, &head)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8)
}

/// Decode `body` to a string. Invalid sequences become U+FFFD.
///
/// # Examples
///
/// ```
/// use scrapekit::encoding::decode_body;
///
/// let text = decode_body(b"Caf\xE9", Some("text/html; charset=ISO-8859-1"));
/// assert_eq!(text, "Café");
/// ```
#[must_use]
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = detect_encoding(body, content_type);
    trace!(encoding = encoding.name(), bytes = body.len(), "decoding body");

    if encoding == UTF_8 {
        return String::from_utf8_lossy(body).into_owned();
    }

    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
