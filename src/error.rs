//! Error types for scrapekit.
//!
//! This module defines the error types returned by DOM, JSON and redirect
//! operations. Structural problems (bad markup, unparsable JSON) degrade to
//! "no result" at the call site; only fetch failures and redirect loops end
//! a resolution chain.

/// Error type for scrapekit operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The markup tokenizer did not produce a usable token tree.
    #[error("HTML parsing unavailable: {0}")]
    ParseUnavailable(String),

    /// Every JSON isolation and repair stage failed.
    #[error("Not JSON: {0}")]
    NotJson(String),

    /// An arithmetic expression could not be parsed or evaluated.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// A URL could not be parsed or resolved against the previous hop.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The fetch collaborator failed (network, TLS, timeout).
    #[error("Fetch failed for {url}: {reason}")]
    Fetch {
        /// The URL that was being fetched.
        url: String,
        /// Transport error description.
        reason: String,
    },

    /// A redirect chain revisited a URL it had already fetched.
    #[error("Redirect loop detected at {0}")]
    RedirectLoop(String),

    /// A redirect chain exceeded the configured hop budget.
    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),
}

/// Result type alias for scrapekit operations.
pub type Result<T> = std::result::Result<T, Error>;
