pub mod cache;
pub mod date;
pub mod discovery;
pub mod document;
pub mod error;
pub mod extension;
pub mod facade;
pub mod feed_type;
pub mod http;
pub mod model;
pub mod namespaces;
pub mod pubsubhubbub;
pub mod reader;
pub mod snapshot;

pub use cache::{FeedCache, FileCache, MemoryCache};
pub use date::{parse_date, parse_date_strict};
pub use discovery::{FeedLink, FeedLinkSet};
pub use document::{FeedDocument, XPathScope};
pub use error::{FeedError, Result};
pub use extension::{
    CORE_EXTENSIONS, EntryExtension, Extension, ExtensionFactory, ExtensionManager, ExtensionPluginManager,
    ExtensionRole, FeedExtension, StandaloneExtensionManager,
};
pub use facade::{Accessor, AtomEntry, AtomFeed, Entry, FacadeContext, FallbackOrder, Feed, RssEntry, RssFeed};
pub use feed_type::{FeedType, detect_type};
pub use http::{FetchConfig, HttpClient, Response};
#[cfg(feature = "fetch")]
pub use http::ReqwestClient;
pub use model::{Author, Category, Enclosure, Image};
pub use reader::{ImportedDocument, Reader, ReaderBuilder, ReaderConfig, ReaderConfigBuilder};
pub use snapshot::{EntrySnapshot, FeedSnapshot};
