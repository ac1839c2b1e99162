//! # scrapekit
//!
//! Scraping helpers built around an indexed DOM.
//!
//! Markup is parsed once into a flat, document-ordered arena with a tag index,
//! so structural queries never walk the whole tree. On top of that sit text
//! reconstruction, best-effort JSON extraction from `<script>` blobs, and a
//! redirect resolver that follows both status and soft (meta refresh and
//! script) redirects.
//!
//! ## Quick Start
//!
//! ```rust
//! use scrapekit::{Document, JsonShape};
//!
//! let html = r#"<html><body>
//! <div class="price">42 EUR</div>
//! <script>var config = {id: 7, name: 'widget'};</script>
//! </body></html>"#;
//!
//! let doc = Document::parse(html);
//! assert_eq!(doc.find_text_for_class("div", "price"), "42 EUR");
//!
//! let config = doc.find_json_for_script_with_key_shape("config", JsonShape::Dictionary)?;
//! assert_eq!(config["id"], 7);
//! assert_eq!(config["name"], "widget");
//! # Ok::<(), scrapekit::Error>(())
//! ```
//!
//! ## Features
//!
//! - **Indexed DOM**: document-order node ids, O(depth) descendant checks
//! - **Text reconstruction**: a node's own text or its reading-order text
//! - **JSON repair**: unquoted keys, single quotes and integer arithmetic
//! - **Redirect resolution**: `3xx`, `<meta>` refresh and `document.location`
//!
//! The `http` feature (on by default) provides a blocking network
//! [`Fetcher`].

mod error;
mod options;

/// Indexed DOM, tokenizer adapter and query engine.
pub mod dom;

/// Script JSON isolation and repair.
pub mod json;

/// Integer arithmetic used by JSON value repair.
pub mod expr;

/// The fetch seam used by the redirect resolver.
pub mod fetch;

/// Blocking HTTP fetcher.
#[cfg(feature = "http")]
pub mod http;

/// Redirect resolution over a fetcher.
pub mod redirect;

/// URL resolution and normalization.
pub mod url_utils;

/// Character encoding detection and transcoding.
pub mod encoding;

// Public API - re-exports
pub use dom::{Document, DomNode, Node, NodeId};
pub use error::{Error, Result};
pub use fetch::{Fetcher, Method, Request, Response};
#[cfg(feature = "http")]
pub use http::HttpFetcher;
pub use json::{extract_json, JsonMap, JsonShape};
pub use options::Options;
pub use redirect::{ContentKind, Outcome, Resolved, Resolver};

/// Parse raw HTML bytes into a [`Document`], detecting the charset from the
/// markup.
///
/// # Example
///
/// ```rust
/// use scrapekit::parse_bytes;
///
/// let html = b"<html><head><meta charset=\"ISO-8859-1\"></head><body><p>Caf\xE9</p></body></html>";
/// let doc = parse_bytes(html);
/// assert_eq!(doc.find("p", &[])[0].text(), "Café");
/// ```
#[must_use]
pub fn parse_bytes(html: &[u8]) -> Document {
    Document::parse(&encoding::decode_body(html, None))
}

/// Resolve `url` over the network with the given options.
///
/// # Example
///
/// ```rust,no_run
/// use scrapekit::{resolve, Options};
///
/// let resolved = resolve("http://example.com/", &Options::default())?;
/// if let Some(body) = resolved.content() {
///     println!("{}: {} bytes", resolved.url, body.len());
/// }
/// # Ok::<(), scrapekit::Error>(())
/// ```
#[cfg(feature = "http")]
#[allow(clippy::missing_errors_doc)]
pub fn resolve(url: &str, options: &Options) -> Result<Resolved> {
    let fetcher = HttpFetcher::new(options)?;
    Resolver::new(fetcher, options.clone()).resolve(url)
}
