//! Soft redirect discovery in HTML pages.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::dom::Document;
use crate::options::Options;
use crate::url_utils::absolute_http_url;

/// `document.location = "<url>";` with either quote style.
#[allow(clippy::expect_used)]
static SCRIPT_REDIRECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"document\.location\s*=\s*['"]([^'"]+)['"]\s*;"#).expect("valid regex")
});

/// URL carried by the first `<meta>` tag's `content` attribute.
///
/// Only the first meta tag is inspected. The URL is everything from the first
/// `http` onward, with trailing quotes removed, and must parse as an absolute
/// http(s) URL.
#[must_use]
pub fn meta_refresh_url(doc: &Document) -> Option<String> {
    let Some(meta) = doc.nodes_with_tag("meta").next() else {
        debug!("META not found");
        return None;
    };

    let content = meta.attr("content").unwrap_or_default();
    let Some(start) = content.find("http") else {
        debug!(content, "META no URL detected");
        return None;
    };

    let url = content[start..].trim_end_matches(['"', '\'']).trim();
    if absolute_http_url(url).is_none() {
        debug!(url, "META URL is not absolute");
        return None;
    }
    debug!(url, "META URL detected");
    Some(url.to_string())
}

/// Target of the last `document.location` assignment across all scripts.
#[must_use]
pub fn script_redirect_url(doc: &Document) -> Option<String> {
    let url = doc
        .nodes_with_tag("script")
        .filter_map(|script| {
            SCRIPT_REDIRECT_RE
                .captures_iter(&script.text())
                .last()
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        })
        .last();

    match &url {
        Some(url) => debug!(url = url.as_str(), "Script redirect detected"),
        None => debug!("Script redirect not found"),
    }
    url
}

/// Meta refresh first, then script assignment, each only when enabled.
#[must_use]
pub fn find_redirect(doc: &Document, options: &Options) -> Option<String> {
    let meta = options
        .follow_meta_refresh
        .then(|| meta_refresh_url(doc))
        .flatten();
    meta.or_else(|| {
        options
            .follow_script_redirects
            .then(|| script_redirect_url(doc))
            .flatten()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_refresh_url() {
        let doc = Document::parse(
            r#"<html><head><meta http-equiv="refresh" content="0;url=http://example.com/final"></head></html>"#,
        );
        assert_eq!(meta_refresh_url(&doc).as_deref(), Some("http://example.com/final"));
    }

    #[test]
    fn test_meta_refresh_trims_quotes() {
        let doc = Document::parse(
            r#"<meta http-equiv="refresh" content="5; URL='https://example.com/x'">"#,
        );
        assert_eq!(meta_refresh_url(&doc).as_deref(), Some("https://example.com/x"));
    }

    #[test]
    fn test_only_first_meta_is_inspected() {
        let doc = Document::parse(
            r#"<head><meta charset="utf-8"><meta http-equiv="refresh" content="0;url=http://a/b"></head>"#,
        );
        assert!(meta_refresh_url(&doc).is_none());
    }

    #[test]
    fn test_meta_without_http_token() {
        let doc = Document::parse(r#"<meta http-equiv="refresh" content="0;url=/relative">"#);
        assert!(meta_refresh_url(&doc).is_none());
        assert!(meta_refresh_url(&Document::parse("<p>no meta</p>")).is_none());
    }

    #[test]
    fn test_meta_with_malformed_url_falls_back_to_script() {
        let doc = Document::parse(
            r#"<head><meta content="0;url=httpnothing"></head>
            <body><script>document.location = "/moved";</script></body>"#,
        );
        assert!(meta_refresh_url(&doc).is_none());
        assert_eq!(find_redirect(&doc, &Options::default()).as_deref(), Some("/moved"));
    }

    #[test]
    fn test_script_redirect_last_match_wins() {
        let doc = Document::parse(
            r#"<body>
            <script>document.location = "/first";</script>
            <script>if (x) { document.location='/second'; }</script>
            </body>"#,
        );
        assert_eq!(script_redirect_url(&doc).as_deref(), Some("/second"));
    }

    #[test]
    fn test_script_redirect_requires_semicolon() {
        let doc = Document::parse(r#"<script>document.location = "/x"</script>"#);
        assert!(script_redirect_url(&doc).is_none());
    }

    #[test]
    fn test_find_redirect_prefers_meta() {
        let doc = Document::parse(
            r#"<head><meta content="0;url=http://meta.example/"></head>
            <body><script>document.location="http://script.example/";</script></body>"#,
        );
        let options = Options::default();
        assert_eq!(find_redirect(&doc, &options).as_deref(), Some("http://meta.example/"));

        let no_meta = Options {
            follow_meta_refresh: false,
            ..Options::default()
        };
        assert_eq!(find_redirect(&doc, &no_meta).as_deref(), Some("http://script.example/"));

        let neither = Options {
            follow_meta_refresh: false,
            follow_script_redirects: false,
            ..Options::default()
        };
        assert!(find_redirect(&doc, &neither).is_none());
    }
}
