//! Configuration options for fetching and redirect resolution.
//!
//! The `Options` struct controls how far the resolver follows redirects,
//! which soft-redirect forms it honors, and how the HTTP fetcher is built.

use std::time::Duration;

use crate::error::{Error, Result};

/// Configuration options for redirect resolution and fetching.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use scrapekit::Options;
///
/// // Use defaults
/// let options = Options::default();
///
/// // Customize specific fields
/// let options = Options {
///     max_redirects: 3,
///     follow_script_redirects: false,
///     ..Options::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum number of redirect hops followed before giving up.
    ///
    /// Counts both status-code redirects and soft (content) redirects.
    ///
    /// Default: `10`
    pub max_redirects: usize,

    /// Follow a URL found in the first `<meta>` tag's `content` attribute.
    ///
    /// Default: `true`
    pub follow_meta_refresh: bool,

    /// Follow `document.location = "...";` assignments found in scripts.
    ///
    /// Default: `true`
    pub follow_script_redirects: bool,

    /// Request timeout for the HTTP fetcher.
    ///
    /// Default: `30s`
    pub timeout: Duration,

    /// User agent sent by the HTTP fetcher.
    ///
    /// `None` picks one of the built-in desktop browser user agents.
    ///
    /// Default: `None`
    pub user_agent: Option<String>,

    /// Proxy URL applied to every request of the HTTP fetcher.
    ///
    /// Default: `None`
    pub proxy: Option<String>,

    /// Keep a cookie jar across hops.
    ///
    /// Default: `true`
    pub cookies: bool,
}

impl Options {
    /// Check that the options describe a usable configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_redirects == 0 {
            return Err(Error::TooManyRedirects(0));
        }
        Ok(())
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            follow_meta_refresh: true,
            follow_script_redirects: true,
            timeout: Duration::from_secs(30),
            user_agent: None,
            proxy: None,
            cookies: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();

        assert_eq!(opts.max_redirects, 10);
        assert!(opts.follow_meta_refresh);
        assert!(opts.follow_script_redirects);
        assert_eq!(opts.timeout, Duration::from_secs(30));
        assert!(opts.user_agent.is_none());
        assert!(opts.proxy.is_none());
        assert!(opts.cookies);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_zero_redirect_budget_rejected() {
        let opts = Options {
            max_redirects: 0,
            ..Options::default()
        };

        assert!(matches!(opts.validate(), Err(Error::TooManyRedirects(0))));
    }

    #[test]
    fn test_boolean_options_can_be_toggled() {
        let opts = Options {
            follow_meta_refresh: false,
            follow_script_redirects: false,
            cookies: false,
            ..Options::default()
        };

        assert!(!opts.follow_meta_refresh);
        assert!(!opts.follow_script_redirects);
        assert!(!opts.cookies);
    }
}
