//! URL Utility Functions
//!
//! Resolution of redirect targets against the previously fetched URL, and the
//! normalization used to recognize a URL the resolver has already visited.

use tracing::debug;
use url::{ParseError, Url};

use crate::error::{Error, Result};

/// `s` parsed as an absolute `http`/`https` URL with a host, or `None`.
#[must_use]
pub fn absolute_http_url(s: &str) -> Option<Url> {
    let s = s.trim();
    if !s.starts_with("http://") && !s.starts_with("https://") {
        return None;
    }
    Url::parse(s).ok().filter(|url| url.host().is_some())
}

/// Make `raw` a minimally valid absolute URL.
///
/// * With no previous URL, a scheme-less input gets `http://`.
/// * With a previous URL, scheme and host are inherited and a path without a
///   leading `/` is joined onto the previous URL's directory.
///
/// Surrounding whitespace and quotes (common in meta refresh values) are
/// stripped first.
///
/// # Examples
/// ```
/// use scrapekit::url_utils::tidy_url;
/// use url::Url;
///
/// let previous = Url::parse("http://h/a/b")?;
/// assert_eq!(tidy_url("page2", Some(&previous))?.as_str(), "http://h/a/page2");
/// assert_eq!(tidy_url("/next", Some(&previous))?.as_str(), "http://h/next");
/// assert_eq!(tidy_url("example.com/x", None)?.as_str(), "http://example.com/x");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn tidy_url(raw: &str, previous: Option<&Url>) -> Result<Url> {
    let raw = raw.trim().trim_matches(['"', '\'']).trim();
    debug!(input = raw, "tidy URL");

    if raw.is_empty() {
        return Err(invalid(raw, "empty URL"));
    }

    let resolved = match Url::parse(raw) {
        Err(ParseError::RelativeUrlWithoutBase) => match previous {
            Some(base) => base.join(raw),
            None => Url::parse(&format!("http://{raw}")),
        },
        parsed => parsed,
    }
    .map_err(|err| invalid(raw, &err.to_string()))?;

    debug!(output = %resolved, "tidy URL");
    Ok(resolved)
}

/// Normalize a URL by removing the fragment and a trailing path slash.
#[must_use]
pub fn normalize_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(&path[..path.len() - 1]);
    }

    url.to_string()
}

fn invalid(url: &str, reason: &str) -> Error {
    Error::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap_or_else(|e| panic!("Failed to parse base URL {s}: {e}"))
    }

    #[test]
    fn test_absolute_http_url() {
        let url = absolute_http_url("  https://example.com/path ").expect("absolute");
        assert_eq!(url.as_str(), "https://example.com/path");

        for raw in ["/relative/path", "example.com", "", "ftp://example.com", "httpfoo", "http://"] {
            assert!(absolute_http_url(raw).is_none(), "{raw:?}");
        }
    }

    #[test]
    fn test_tidy_relative_path_joins_directory() {
        let prev = base("http://h/a/b");
        let url = tidy_url("page2", Some(&prev)).expect("resolves");
        assert_eq!(url.as_str(), "http://h/a/page2");
    }

    #[test]
    fn test_tidy_absolute_path_inherits_scheme_and_host() {
        let prev = base("https://example.com:8443/deep/path?q=1");
        let url = tidy_url("/next", Some(&prev)).expect("resolves");
        assert_eq!(url.as_str(), "https://example.com:8443/next");
    }

    #[test]
    fn test_tidy_protocol_relative() {
        let prev = base("https://example.com/");
        let url = tidy_url("//cdn.example.com/x", Some(&prev)).expect("resolves");
        assert_eq!(url.as_str(), "https://cdn.example.com/x");
    }

    #[test]
    fn test_tidy_absolute_ignores_previous() {
        let prev = base("http://h/a/b");
        let url = tidy_url("https://other.com/page", Some(&prev)).expect("resolves");
        assert_eq!(url.as_str(), "https://other.com/page");
    }

    #[test]
    fn test_tidy_without_previous_defaults_to_http() {
        let url = tidy_url("example.com/start", None).expect("resolves");
        assert_eq!(url.as_str(), "http://example.com/start");
    }

    #[test]
    fn test_tidy_strips_quotes() {
        let url = tidy_url(" 'http://example.com/final' ", None).expect("resolves");
        assert_eq!(url.as_str(), "http://example.com/final");
    }

    #[test]
    fn test_tidy_empty_is_error() {
        assert!(matches!(tidy_url("  ", None), Err(Error::InvalidUrl { .. })));
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url(&base("https://example.com/page#section")),
            "https://example.com/page"
        );
        assert_eq!(
            normalize_url(&base("https://example.com/path/")),
            "https://example.com/path"
        );
        assert_eq!(
            normalize_url(&base("https://example.com/")),
            "https://example.com/"
        );
    }
}
