//! HTTP collaborator used by remote imports.
//!
//! The reader never talks to the network itself; it goes through an
//! [`HttpClient`]. A blocking implementation over reqwest is available with
//! the `fetch` feature, and tests substitute their own.

#[cfg(feature = "fetch")]
use std::time::Duration;

#[cfg(feature = "fetch")]
use url::Url;

use crate::error::Result;
#[cfg(feature = "fetch")]
use crate::error::FeedError;

/// A response as seen by the reader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
    /// Response headers, when the client exposes them.
    pub headers: Option<Vec<(String, String)>>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into(), headers: None }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.get_or_insert_with(Vec::new).push((name.into(), value.into()));
        self
    }

    /// The first value of a header, matched case-insensitively.
    pub fn header_line(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Performs GET requests on behalf of the reader.
pub trait HttpClient {
    /// Issues a GET with the extra request headers.
    fn get(&self, uri: &str, headers: &[(String, String)]) -> Result<Response>;

    /// Whether the client sends request headers and reports response
    /// headers. Conditional GET is only attempted with such clients.
    fn is_header_aware(&self) -> bool {
        false
    }
}

/// HTTP client configuration for fetching feeds.
///
/// This struct controls timeout and user agent settings for HTTP requests.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// Custom User-Agent string.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 30, user_agent: format!("feedscope/{}", env!("CARGO_PKG_VERSION")) }
    }
}

/// Blocking reqwest client.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
    config: FetchConfig,
}

#[cfg(feature = "fetch")]
impl ReqwestClient {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[cfg(feature = "fetch")]
impl HttpClient for ReqwestClient {
    fn get(&self, uri: &str, headers: &[(String, String)]) -> Result<Response> {
        let parsed = Url::parse(uri).map_err(|e| FeedError::InvalidUrl(format!("{}: {}", uri, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FeedError::InvalidUrl(format!("unsupported scheme in {}", uri)));
        }

        let mut request = self.client.get(parsed).header(
            "Accept",
            "application/atom+xml,application/rss+xml,application/rdf+xml,application/xml;q=0.9,text/html;q=0.8,*/*;q=0.5",
        );
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() { FeedError::Timeout { timeout: self.config.timeout } } else { FeedError::Http(e) }
        })?;

        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.to_string(), value.to_string())))
            .collect();
        let body = response.text()?;
        tracing::debug!(uri, status, "fetched");

        Ok(Response { status, body, headers: Some(response_headers) })
    }

    fn is_header_aware(&self) -> bool {
        true
    }
}
