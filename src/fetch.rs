//! The fetch collaborator.
//!
//! The redirect resolver never talks to the network itself. It hands a
//! [`Request`] to a [`Fetcher`] and inspects the [`Response`] it gets back.
//! [`crate::http::HttpFetcher`] is the network implementation; tests plug in
//! canned responses.

use std::collections::HashMap;

use url::{form_urlencoded, Url};

use crate::encoding::decode_body;
use crate::error::Result;

pub const CONTENT_TYPE_HTML: &str = "text/html";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_XML: &str = "text/xml";
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Performs one HTTP exchange without following redirects.
pub trait Fetcher {
    /// Send `request` and return the raw response.
    ///
    /// Transport failures are reported as [`crate::Error::Fetch`]. Non-2xx
    /// statuses are not errors.
    fn fetch(&self, request: &Request) -> Result<Response>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, request: &Request) -> Result<Response> {
        (**self).fetch(request)
    }
}

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

/// An outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// A plain GET.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A GET whose query string is replaced by the URL-encoded `args`.
    ///
    /// ```
    /// use scrapekit::fetch::Request;
    /// use url::Url;
    ///
    /// let url = Url::parse("http://example.com/search?old=1")?;
    /// let request = Request::get_query(url, &[("q", "a b"), ("page", "2")]);
    /// assert_eq!(request.url.as_str(), "http://example.com/search?q=a+b&page=2");
    /// # Ok::<(), url::ParseError>(())
    /// ```
    #[must_use]
    pub fn get_query(mut url: Url, args: &[(&str, &str)]) -> Self {
        url.set_query(None);
        if !args.is_empty() {
            url.query_pairs_mut().extend_pairs(args);
        }
        Self::get(url)
    }

    /// A POST with a URL-encoded form body.
    #[must_use]
    pub fn post_form(url: Url, args: &[(&str, &str)]) -> Self {
        let body = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(args)
            .finish();
        Self::post(url, CONTENT_TYPE_FORM, body.into_bytes())
    }

    /// A POST with an arbitrary body.
    #[must_use]
    pub fn post(url: Url, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::Post,
            url,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: Some(body.into()),
        }
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// A received response. Header names are stored lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Response {
    /// Build a response, lowercasing header names.
    pub fn new<K, V>(status: u16, headers: impl IntoIterator<Item = (K, V)>, body: Vec<u8>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
                .collect(),
            body,
        }
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Get the Content-Type header.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get the Location header.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Body decoded to UTF-8 using the declared charset.
    #[must_use]
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type())
    }
}
