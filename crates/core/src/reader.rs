//! Import orchestration.
//!
//! The [`Reader`] owns everything an import needs: the extension registry,
//! the registered extension lists, an optional HTTP client and an optional
//! cache. Nothing is global; two readers never share state.
//!
//! # Example
//!
//! ```rust
//! use feedscope_core::{FeedType, Reader};
//!
//! let reader = Reader::new();
//! let doc = reader
//!     .import_string(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>T</title></feed>"#)
//!     .unwrap();
//!
//! assert_eq!(doc.feed_type(), FeedType::Atom10);
//! assert_eq!(doc.into_feed().unwrap().title().as_deref(), Some("T"));
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use sha2::{Digest, Sha256};

use crate::cache::FeedCache;
use crate::discovery::FeedLinkSet;
use crate::document::FeedDocument;
use crate::error::{FeedError, Result};
use crate::extension::{CORE_EXTENSIONS, ExtensionManager, ExtensionRole, StandaloneExtensionManager};
use crate::facade::{AtomEntry, AtomFeed, Entry, FacadeContext, FallbackOrder, Feed, RssFeed};
use crate::feed_type::{self, FeedType};
use crate::http::{HttpClient, Response};
use crate::pubsubhubbub;

/// Configuration for a [`Reader`].
///
/// # Example
///
/// ```rust
/// use feedscope_core::ReaderConfig;
///
/// let config = ReaderConfig::builder()
///     .http_conditional_get(true)
///     .cache_prefix("my_app_")
///     .build();
/// assert!(config.http_conditional_get);
/// ```
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Extensions registered at construction, in fallback order (default:
    /// every core extension).
    pub core_extensions: Vec<String>,

    /// Whether cached imports revalidate with a conditional GET (default: false).
    pub http_conditional_get: bool,

    /// Per-accessor extension priority (default: [`FallbackOrder::default`]).
    pub fallback: FallbackOrder,

    /// Prefix of every cache key (default: `feedscope_reader_`).
    pub cache_prefix: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            core_extensions: CORE_EXTENSIONS.iter().map(|name| name.to_string()).collect(),
            http_conditional_get: false,
            fallback: FallbackOrder::default(),
            cache_prefix: "feedscope_reader_".to_string(),
        }
    }
}

impl ReaderConfig {
    /// Creates a new builder for ReaderConfig.
    pub fn builder() -> ReaderConfigBuilder {
        ReaderConfigBuilder::new()
    }
}

/// Builder for ReaderConfig.
pub struct ReaderConfigBuilder {
    config: ReaderConfig,
}

impl ReaderConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ReaderConfig::default() }
    }

    /// Sets the extensions registered at construction.
    pub fn core_extensions<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.config.core_extensions = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether cached imports use conditional GET.
    pub fn http_conditional_get(mut self, value: bool) -> Self {
        self.config.http_conditional_get = value;
        self
    }

    /// Sets the per-accessor extension priority.
    pub fn fallback(mut self, value: FallbackOrder) -> Self {
        self.config.fallback = value;
        self
    }

    /// Sets the cache key prefix.
    pub fn cache_prefix(mut self, value: impl Into<String>) -> Self {
        self.config.cache_prefix = value.into();
        self
    }

    /// Builds the config.
    pub fn build(self) -> ReaderConfig {
        self.config
    }
}

impl Default for ReaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of an import: a feed, or a standalone Atom entry.
pub enum ImportedDocument {
    Feed(Box<dyn Feed>),
    Entry(Box<dyn Entry>),
}

impl ImportedDocument {
    pub fn feed_type(&self) -> FeedType {
        match self {
            Self::Feed(feed) => feed.feed_type(),
            Self::Entry(entry) => entry.feed_type(),
        }
    }

    pub fn as_feed(&self) -> Option<&dyn Feed> {
        match self {
            Self::Feed(feed) => Some(feed.as_ref()),
            Self::Entry(_) => None,
        }
    }

    pub fn as_entry(&self) -> Option<&dyn Entry> {
        match self {
            Self::Entry(entry) => Some(entry.as_ref()),
            Self::Feed(_) => None,
        }
    }

    pub fn into_feed(self) -> Option<Box<dyn Feed>> {
        match self {
            Self::Feed(feed) => Some(feed),
            Self::Entry(_) => None,
        }
    }

    pub fn into_entry(self) -> Option<Box<dyn Entry>> {
        match self {
            Self::Entry(entry) => Some(entry),
            Self::Feed(_) => None,
        }
    }

    /// Feeds remember where they were fetched from; entries ignore it.
    fn stamp(&mut self, uri: &str) {
        if let Self::Feed(feed) = self {
            feed.set_original_source_uri(uri.to_string());
        }
    }
}

impl fmt::Debug for ImportedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feed(_) => write!(f, "ImportedDocument::Feed({})", self.feed_type()),
            Self::Entry(_) => write!(f, "ImportedDocument::Entry({})", self.feed_type()),
        }
    }
}

/// Builder for [`Reader`].
///
/// # Example
///
/// ```rust
/// use feedscope_core::{MemoryCache, Reader, ReaderConfig};
///
/// let reader = Reader::builder()
///     .config(ReaderConfig::builder().core_extensions(["DublinCore", "Atom"]).build())
///     .cache(MemoryCache::new())
///     .build();
/// assert!(reader.is_registered("Atom"));
/// assert!(!reader.is_registered("Slash"));
/// ```
#[derive(Default)]
pub struct ReaderBuilder {
    config: ReaderConfig,
    manager: Option<Rc<dyn ExtensionManager>>,
    http_client: Option<Box<dyn HttpClient>>,
    cache: Option<Box<dyn FeedCache>>,
}

impl ReaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses another extension registry; populate it before handing it over.
    pub fn extension_manager(mut self, manager: Rc<dyn ExtensionManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    pub fn http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.http_client = Some(Box::new(client));
        self
    }

    pub fn cache(mut self, cache: impl FeedCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    /// Builds the reader and registers the configured core extensions.
    ///
    /// Core names the registry does not know are logged and skipped.
    pub fn build(self) -> Reader {
        let manager = self.manager.unwrap_or_else(|| Rc::new(StandaloneExtensionManager::default()));
        let mut reader = Reader {
            config: self.config,
            manager,
            http_client: self.http_client,
            cache: self.cache,
            feed_extensions: Vec::new(),
            entry_extensions: Vec::new(),
            core_extensions: Vec::new(),
        };

        for name in reader.config.core_extensions.clone() {
            if let Err(e) = reader.register_extension(&name) {
                tracing::warn!(extension = %name, error = %e, "skipping core extension");
            }
        }
        reader
    }
}

/// Imports feeds from strings, files and URIs.
pub struct Reader {
    config: ReaderConfig,
    manager: Rc<dyn ExtensionManager>,
    http_client: Option<Box<dyn HttpClient>>,
    cache: Option<Box<dyn FeedCache>>,
    feed_extensions: Vec<String>,
    entry_extensions: Vec<String>,
    core_extensions: Vec<String>,
}

impl Reader {
    /// A reader with the default configuration and registry, no HTTP client
    /// and no cache.
    pub fn new() -> Self {
        ReaderBuilder::new().build()
    }

    pub fn builder() -> ReaderBuilder {
        ReaderBuilder::new()
    }

    pub fn with_http_client(mut self, client: impl HttpClient + 'static) -> Self {
        self.http_client = Some(Box::new(client));
        self
    }

    pub fn with_cache(mut self, cache: impl FeedCache + 'static) -> Self {
        self.cache = Some(Box::new(cache));
        self
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn extension_manager(&self) -> &Rc<dyn ExtensionManager> {
        &self.manager
    }

    pub fn http_client(&self) -> Option<&dyn HttpClient> {
        self.http_client.as_deref()
    }

    pub fn cache(&self) -> Option<&dyn FeedCache> {
        self.cache.as_deref()
    }

    /// Registered extension names, in registration order.
    pub fn registered_extensions(&self) -> &[String] {
        &self.core_extensions
    }

    /// Registers an extension by name for every role the registry knows it
    /// under. Registering a name twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::ExtensionNotFound`] when neither `<name>/Feed`
    /// nor `<name>/Entry` is registered with the extension manager.
    pub fn register_extension(&mut self, name: &str) -> Result<()> {
        if self.is_registered(name) {
            return Ok(());
        }

        let as_feed = self.manager.has(&ExtensionRole::Feed.key(name));
        let as_entry = self.manager.has(&ExtensionRole::Entry.key(name));
        if !as_feed && !as_entry {
            return Err(FeedError::ExtensionNotFound(name.to_string()));
        }

        if as_feed {
            self.feed_extensions.push(name.to_string());
        }
        if as_entry {
            self.entry_extensions.push(name.to_string());
        }
        self.core_extensions.push(name.to_string());
        tracing::debug!(extension = name, feed = as_feed, entry = as_entry, "registered extension");
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.core_extensions.iter().any(|registered| registered == name)
    }

    /// Classifies a document without importing it.
    pub fn detect_type(&self, text: &str) -> Result<FeedType> {
        feed_type::detect_type(text, false)
    }

    /// Imports a feed (or a standalone Atom entry) from its XML text.
    ///
    /// # Errors
    ///
    /// - [`FeedError::InvalidInput`] for empty input or a DOCTYPE declaration
    /// - [`FeedError::Parse`] when the XML is not well formed
    /// - [`FeedError::UnsupportedFeedType`] when the document is not a feed
    pub fn import_string(&self, text: &str) -> Result<ImportedDocument> {
        if text.trim().is_empty() {
            return Err(FeedError::InvalidInput("Only non empty strings are allowed as input".to_string()));
        }

        let document = Rc::new(FeedDocument::parse(text)?);
        let feed_type = FeedType::detect(&document, false);
        tracing::debug!(feed_type = %feed_type, encoding = document.encoding(), "detected feed type");

        let context = Rc::new(self.facade_context());
        let code = feed_type.code();
        if code.starts_with("rss") {
            Ok(ImportedDocument::Feed(Box::new(RssFeed::new(document, feed_type, context))))
        } else if code.ends_with("entry") {
            Ok(ImportedDocument::Entry(Box::new(AtomEntry::standalone(document, context))))
        } else if code.starts_with("atom") {
            Ok(ImportedDocument::Feed(Box::new(AtomFeed::new(document, feed_type, context))))
        } else {
            Err(FeedError::UnsupportedFeedType(feed_type))
        }
    }

    /// Imports a feed from a local file.
    pub fn import_file(&self, path: impl AsRef<Path>) -> Result<ImportedDocument> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|source| FeedError::FileRead { path: path.to_path_buf(), source })?;
        self.import_string(&text)
    }

    /// Imports a feed from a URI through the HTTP client and cache.
    pub fn import(&self, uri: &str) -> Result<ImportedDocument> {
        self.import_with(uri, None, None)
    }

    /// Imports a feed from a URI, supplying validators for conditional GET.
    ///
    /// With a cache and conditional GET enabled, a cached body is revalidated
    /// with `If-None-Match`/`If-Modified-Since` (taken from the arguments or
    /// from the cache) and reused on `304`. With a cache alone, a cached body
    /// is imported without any request. Without a cache the body is fetched
    /// and the resulting feed remembers `uri` as its original source.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::MissingHttpClient`] when a request is needed but
    /// the reader has no HTTP client, and [`FeedError::HttpStatus`] for any
    /// unexpected status code, besides the errors of [`Reader::import_string`].
    pub fn import_with(
        &self, uri: &str, etag: Option<&str>, last_modified: Option<&str>,
    ) -> Result<ImportedDocument> {
        let Some(cache) = self.cache.as_deref() else {
            let response = fetch_ok(self.client()?, uri, &[])?;
            let mut document = self.import_string(&response.body)?;
            document.stamp(uri);
            return Ok(document);
        };

        let key = self.cache_key(uri);
        let cached = cache.get_item(&key);

        if !self.config.http_conditional_get {
            if let Some(body) = cached {
                tracing::debug!(uri, "cache hit");
                return self.import_string(&body);
            }

            let response = fetch_ok(self.client()?, uri, &[])?;
            store(cache, &key, &response.body);
            return self.import_string(&response.body);
        }

        let client = self.client()?;
        let mut headers = Vec::new();
        if cached.is_some() && client.is_header_aware() {
            let etag = etag.map(str::to_string).or_else(|| cache.get_item(&format!("{}_etag", key)));
            let last_modified =
                last_modified.map(str::to_string).or_else(|| cache.get_item(&format!("{}_lastmodified", key)));

            if let Some(etag) = etag {
                headers.push(("If-None-Match".to_string(), etag));
            }
            if let Some(last_modified) = last_modified {
                headers.push(("If-Modified-Since".to_string(), last_modified));
            }
        }

        let response = client.get(uri, &headers)?;
        tracing::debug!(uri, status = response.status, conditional = !headers.is_empty(), "fetched feed");
        match (response.status, cached) {
            (304, Some(body)) => {
                tracing::debug!(uri, "not modified, using cached body");
                self.import_string(&body)
            }
            (200, _) => {
                store(cache, &key, &response.body);
                if client.is_header_aware() {
                    if let Some(etag) = response.header_line("ETag") {
                        store(cache, &format!("{}_etag", key), etag);
                    }
                    if let Some(last_modified) = response.header_line("Last-Modified") {
                        store(cache, &format!("{}_lastmodified", key), last_modified);
                    }
                }
                self.import_string(&response.body)
            }
            (status, _) => Err(FeedError::HttpStatus { uri: uri.to_string(), status }),
        }
    }

    /// Fetches an HTML page and collects the feed links it advertises.
    pub fn find_feed_links(&self, uri: &str) -> Result<FeedLinkSet> {
        let response = fetch_ok(self.client()?, uri, &[])?;
        Ok(FeedLinkSet::from_html(&response.body, uri))
    }

    /// The PubSubHubbub hubs a feed advertises.
    pub fn detect_hubs(&self, feed: &dyn Feed) -> Vec<String> {
        pubsubhubbub::detect_hubs(feed)
    }

    /// The cache key of a URI: the configured prefix and the hex SHA-256 of
    /// the URI.
    pub fn cache_key(&self, uri: &str) -> String {
        format!("{}{:x}", self.config.cache_prefix, Sha256::digest(uri.as_bytes()))
    }

    fn client(&self) -> Result<&dyn HttpClient> {
        self.http_client.as_deref().ok_or(FeedError::MissingHttpClient)
    }

    fn facade_context(&self) -> FacadeContext {
        FacadeContext::new(
            Rc::clone(&self.manager),
            self.feed_extensions.clone(),
            self.entry_extensions.clone(),
            self.config.fallback.clone(),
        )
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("config", &self.config)
            .field("extensions", &self.core_extensions)
            .field("http_client", &self.http_client.is_some())
            .field("cache", &self.cache.is_some())
            .finish()
    }
}

fn fetch_ok(client: &dyn HttpClient, uri: &str, headers: &[(String, String)]) -> Result<Response> {
    let response = client.get(uri, headers)?;
    tracing::debug!(uri, status = response.status, "fetched");
    if response.status != 200 {
        return Err(FeedError::HttpStatus { uri: uri.to_string(), status: response.status });
    }
    Ok(response)
}

/// Cache writes never fail an import.
fn store(cache: &dyn FeedCache, key: &str, value: &str) {
    if let Err(e) = cache.set_item(key, value) {
        tracing::warn!(key, error = %e, "cache write failed");
    }
}
