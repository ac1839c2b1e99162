//! Blocking HTTP implementation of [`Fetcher`].
//!
//! Redirects are never followed by the client; the resolver decides what a
//! redirect status means. Cookies set on one hop are sent on the next.

use std::time::SystemTime;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::Proxy;
use tracing::debug;

use crate::error::{Error, Result};
use crate::fetch::{Fetcher, Method, Request, Response};
use crate::options::Options;

/// Desktop browser user agents used when none is configured.
pub const USER_AGENTS: &[&str] = &[
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Chrome on Linux
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    // Firefox on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    // Safari on Mac
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// Pick one of [`USER_AGENTS`].
#[must_use]
pub fn random_user_agent() -> &'static str {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map_or(0, |d| d.subsec_nanos() as usize);
    USER_AGENTS[nanos % USER_AGENTS.len()]
}

/// [`Fetcher`] backed by a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client from `options`.
    ///
    /// Fails if the proxy URL is invalid or the TLS backend cannot start.
    pub fn new(options: &Options) -> Result<Self> {
        let user_agent = options
            .user_agent
            .clone()
            .unwrap_or_else(|| random_user_agent().to_string());

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .timeout(options.timeout)
            .redirect(Policy::none())
            .cookie_store(options.cookies)
            .gzip(true)
            .brotli(true);

        if let Some(proxy_url) = &options.proxy {
            let proxy = Proxy::all(proxy_url).map_err(|e| Error::InvalidUrl {
                url: proxy_url.clone(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| Error::Fetch {
            url: String::new(),
            reason: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &Request) -> Result<Response> {
        debug!(method = ?request.method, url = %request.url, "fetch");
        let fetch_error = |e: reqwest::Error| Error::Fetch {
            url: request.url.to_string(),
            reason: e.to_string(),
        };

        let mut builder = match request.method {
            Method::Get => self.client.get(request.url.clone()),
            Method::Post => self.client.post(request.url.clone()),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(fetch_error)?;
        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().map_err(fetch_error)?.to_vec();

        debug!(status, bytes = body.len(), "fetched");
        Ok(Response::new(status, headers, body))
    }
}
