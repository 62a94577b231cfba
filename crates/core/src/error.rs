//! Error types for feed reading operations.
//!
//! This module defines the main error type [`FeedError`] which represents
//! everything that can go wrong while loading, classifying and importing a
//! feed document, fetching it over HTTP, or looking up extensions.
//!
//! Absence of a field is never an error: accessors on feeds and entries
//! return `None` or an empty collection instead.
//!
//! # Example
//!
//! ```rust
//! use feedscope_core::{FeedError, Reader};
//!
//! let reader = Reader::new();
//! match reader.import_string("") {
//!     Err(FeedError::InvalidInput(msg)) => println!("rejected: {}", msg),
//!     Err(e) => println!("Error: {}", e),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

use sxd_xpath::ExecutionError;

use crate::feed_type::FeedType;

/// Main error type for feed reading operations.
#[derive(Error, Debug)]
pub enum FeedError {
    /// Caller-supplied data is structurally wrong before any I/O happens.
    ///
    /// Empty input, non-textual input and documents carrying a DOCTYPE
    /// declaration all land here.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The document was classified but no facade exists for its type.
    #[error("Unsupported feed type '{0}': not a valid Atom, RSS or RDF feed")]
    UnsupportedFeedType(FeedType),

    /// The XML parser rejected the document.
    #[error("Failed to parse XML: {0}")]
    Parse(String),

    /// The HTTP collaborator answered with an unexpected status code.
    #[error("Feed failed to load from {uri}, got response code {status}")]
    HttpStatus { uri: String, status: u16 },

    /// HTTP request errors from reqwest.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// A remote import was requested but the reader has no HTTP client.
    #[error("No HTTP client configured for remote imports")]
    MissingHttpClient,

    /// Reading a feed from disk failed.
    #[error("Failed to read file {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache backend failure.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Neither a feed nor an entry extension is registered under the name.
    #[error("Could not load extension '{0}' using the extension manager")]
    ExtensionNotFound(String),

    /// Registry lookup failure.
    #[error("Extension '{0}' not found in the registry")]
    NotFound(String),

    /// Entry index outside the collection.
    #[error("Entry index {index} out of range (feed has {count} entries)")]
    OutOfRange { index: usize, count: usize },

    /// Programmer error, such as registering a plugin with the wrong role.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// XPath compilation or evaluation errors.
    #[error("XPath error: {0}")]
    XPath(String),

    /// A date string could not be parsed in strict mode.
    #[error("Could not load date due to unrecognised format (should follow RFC 822 or ISO 8601): {0}")]
    InvalidDate(String),

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Snapshot serialization failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl From<ExecutionError> for FeedError {
    fn from(err: ExecutionError) -> Self {
        FeedError::XPath(err.to_string())
    }
}

/// Result type alias for FeedError.
///
/// This is a convenience alias for `std::result::Result<T, FeedError>`.
pub type Result<T> = std::result::Result<T, FeedError>;
