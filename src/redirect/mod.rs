//! Redirect resolution.
//!
//! A [`Resolver`] fetches a URL and keeps following redirects until a page
//! settles. Two kinds of redirect are followed:
//!
//! * status redirects (`301`, `302`, `303`, `307`, `308`) via `Location`,
//! * soft redirects in `200 text/html` pages: the first `<meta>` tag's
//!   `content` URL, or failing that a `document.location = "...";` script
//!   assignment (see [`detect`]).
//!
//! Every follow-up hop is a `GET` against a URL resolved relative to the
//! previous one. The chain is bounded by [`Options::max_redirects`] and a
//! visited set, so loops end in an error instead of fetching forever.

pub mod detect;

use std::collections::HashSet;

use tracing::{debug, warn};
use url::Url;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::fetch::{
    Fetcher, Request, Response, CONTENT_TYPE_HTML, CONTENT_TYPE_JSON, CONTENT_TYPE_XML,
};
use crate::json::{from_json, JsonMap};
use crate::options::Options;
use crate::url_utils::{normalize_url, tidy_url};

/// Status codes answered by following `Location`.
pub const REDIRECT_STATUSES: &[u16] = &[301, 302, 303, 307, 308];

/// Coarse classification of a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Json,
    Xml,
    Other,
}

impl ContentKind {
    /// Classify a `Content-Type` header value by its media-type prefix.
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let media = content_type.unwrap_or_default().trim().to_ascii_lowercase();
        if media.starts_with(CONTENT_TYPE_HTML) {
            Self::Html
        } else if media.starts_with(CONTENT_TYPE_JSON) {
            Self::Json
        } else if media.starts_with(CONTENT_TYPE_XML) {
            Self::Xml
        } else {
            Self::Other
        }
    }
}

/// Why resolution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A `200` page with nothing further to follow.
    Done,
    /// A `200` JSON response whose body does not parse.
    Unusable,
    /// A redirect was detected but carried no usable URL.
    NoRedirectTarget,
    /// A status that is neither `200` nor a followed redirect.
    UnhandledStatus(u16),
}

/// The last response of a redirect chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// URL of the final request.
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub kind: ContentKind,
    /// Raw body of the final response.
    pub body: Vec<u8>,
    pub outcome: Outcome,
    /// Number of redirects followed.
    pub hops: usize,
}

impl Resolved {
    /// Final body as text.
    #[must_use]
    pub fn text(&self) -> String {
        crate::encoding::decode_body(&self.body, self.content_type.as_deref())
    }

    /// The usable result of the chain: the final body for [`Outcome::Done`]
    /// and [`Outcome::NoRedirectTarget`], nothing otherwise.
    #[must_use]
    pub fn content(&self) -> Option<String> {
        matches!(self.outcome, Outcome::Done | Outcome::NoRedirectTarget).then(|| self.text())
    }

    /// The decoded body of a usable JSON response. A top-level array sits
    /// under [`crate::json::ARRAY_KEY`].
    #[must_use]
    pub fn json(&self) -> Option<JsonMap> {
        if self.kind != ContentKind::Json || self.outcome != Outcome::Done {
            return None;
        }
        from_json(&self.text()).ok()
    }
}

enum Step {
    Follow(String),
    Stop(Outcome),
}

/// Follows redirect chains through a [`Fetcher`].
///
/// # Example
///
/// ```rust,no_run
/// use scrapekit::{HttpFetcher, Options, Resolver};
///
/// let options = Options::default();
/// let resolver = Resolver::new(HttpFetcher::new(&options)?, options);
/// let resolved = resolver.resolve("example.com")?;
/// println!("{} -> {}", resolved.url, resolved.status);
/// # Ok::<(), scrapekit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Resolver<F> {
    fetcher: F,
    options: Options,
}

impl<F: Fetcher> Resolver<F> {
    pub fn new(fetcher: F, options: Options) -> Self {
        Self { fetcher, options }
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// `GET` `url` and follow redirects. A scheme-less URL gets `http://`.
    pub fn resolve(&self, url: &str) -> Result<Resolved> {
        self.resolve_request(Request::get(tidy_url(url, None)?))
    }

    /// Send `request` and follow redirects with `GET`s.
    ///
    /// # Errors
    ///
    /// * [`Error::Fetch`] when the fetcher fails on any hop,
    /// * [`Error::RedirectLoop`] when a hop revisits an already fetched URL,
    /// * [`Error::TooManyRedirects`] when more than `max_redirects` hops are needed.
    pub fn resolve_request(&self, request: Request) -> Result<Resolved> {
        self.options.validate()?;

        let mut request = request;
        let mut visited = HashSet::new();
        let mut hops = 0;

        loop {
            if !visited.insert((request.method, normalize_url(&request.url))) {
                warn!(url = %request.url, "redirect loop");
                return Err(Error::RedirectLoop(request.url.to_string()));
            }

            let response = self.fetcher.fetch(&request)?;
            let target = match self.classify(&response) {
                Step::Follow(target) => target,
                Step::Stop(outcome) => return Ok(finish(request.url, response, outcome, hops)),
            };

            let next = match tidy_url(&target, Some(&request.url)) {
                Ok(next) => next,
                Err(err) => {
                    debug!(redirect = target.as_str(), error = %err, "unusable redirect target");
                    return Ok(finish(request.url, response, Outcome::NoRedirectTarget, hops));
                }
            };

            hops += 1;
            if hops > self.options.max_redirects {
                warn!(limit = self.options.max_redirects, url = %next, "too many redirects");
                return Err(Error::TooManyRedirects(self.options.max_redirects));
            }

            debug!(hop = hops, from = %request.url, to = %next, "following redirect");
            request = Request::get(next);
        }
    }

    fn classify(&self, response: &Response) -> Step {
        match response.status {
            200 => self.classify_content(response),
            status if REDIRECT_STATUSES.contains(&status) => match response.location() {
                Some(location) if !location.trim().is_empty() => {
                    debug!(status, location, "Location redirect");
                    Step::Follow(location.to_string())
                }
                _ => {
                    debug!(status, "redirect without Location");
                    Step::Stop(Outcome::NoRedirectTarget)
                }
            },
            status => {
                warn!(status, "Unhandled status");
                Step::Stop(Outcome::UnhandledStatus(status))
            }
        }
    }

    fn classify_content(&self, response: &Response) -> Step {
        match ContentKind::from_content_type(response.content_type()) {
            ContentKind::Html => {
                debug!("HTML detected");
                let doc = Document::parse(&response.text());
                match detect::find_redirect(&doc, &self.options) {
                    Some(target) => Step::Follow(target),
                    None => Step::Stop(Outcome::Done),
                }
            }
            ContentKind::Json => {
                debug!("JSON detected");
                match from_json(&response.text()) {
                    Ok(_) => Step::Stop(Outcome::Done),
                    Err(err) => {
                        debug!(error = %err, "JSON body unusable");
                        Step::Stop(Outcome::Unusable)
                    }
                }
            }
            kind => {
                debug!(?kind, content_type = response.content_type(), "returning content as-is");
                Step::Stop(Outcome::Done)
            }
        }
    }
}

fn finish(url: Url, response: Response, outcome: Outcome, hops: usize) -> Resolved {
    let content_type = response.content_type().map(str::to_string);
    Resolved {
        url,
        status: response.status,
        kind: ContentKind::from_content_type(content_type.as_deref()),
        content_type,
        body: response.body,
        outcome,
        hops,
    }
}
