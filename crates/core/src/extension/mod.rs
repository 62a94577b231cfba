//! Extension probes for namespace vocabularies.
//!
//! An extension is a bundle of accessors over one vocabulary (Dublin Core,
//! Slash, iTunes...). Each comes in up to two roles: a [`FeedExtension`] bound
//! to a channel/feed node and an [`EntryExtension`] bound to an item/entry
//! node. Every accessor has a default "not applicable" implementation, so a
//! probe only overrides what its vocabulary actually carries.
//!
//! Probes are created through an [`ExtensionManager`], keyed by
//! `"<Name>/Feed"` or `"<Name>/Entry"`. The manager builds a fresh instance
//! per call, bound to the scope of the facade that asked for it.

pub mod atom;
pub mod content;
pub mod creative_commons;
pub mod dublin_core;
pub mod plugin_manager;
pub mod podcast;
pub mod slash;
pub mod standalone;
pub mod syndication;
pub mod thread;
pub mod well_formed_web;

use std::any::Any;
use std::fmt;

use time::OffsetDateTime;

use crate::document::XPathScope;
use crate::error::Result;
use crate::model::{Author, Category, Enclosure, Image};

pub use plugin_manager::ExtensionPluginManager;
pub use standalone::StandaloneExtensionManager;

/// Accessors an extension may contribute to a feed facade.
pub trait FeedExtension: Any {
    /// The extension name, e.g. `DublinCore`.
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn id(&self) -> Option<String> {
        None
    }

    fn title(&self) -> Option<String> {
        None
    }

    fn description(&self) -> Option<String> {
        None
    }

    fn authors(&self) -> Vec<Author> {
        Vec::new()
    }

    fn categories(&self) -> Vec<Category> {
        Vec::new()
    }

    fn copyright(&self) -> Option<String> {
        None
    }

    fn date_created(&self) -> Option<OffsetDateTime> {
        None
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        None
    }

    fn generator(&self) -> Option<String> {
        None
    }

    fn image(&self) -> Option<Image> {
        None
    }

    fn language(&self) -> Option<String> {
        None
    }

    fn link(&self) -> Option<String> {
        None
    }

    fn feed_link(&self) -> Option<String> {
        None
    }

    fn hubs(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Accessors an extension may contribute to an entry facade.
pub trait EntryExtension: Any {
    /// The extension name, e.g. `Slash`.
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn id(&self) -> Option<String> {
        None
    }

    fn title(&self) -> Option<String> {
        None
    }

    fn description(&self) -> Option<String> {
        None
    }

    fn content(&self) -> Option<String> {
        None
    }

    fn authors(&self) -> Vec<Author> {
        Vec::new()
    }

    fn categories(&self) -> Vec<Category> {
        Vec::new()
    }

    fn date_created(&self) -> Option<OffsetDateTime> {
        None
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        None
    }

    fn links(&self) -> Vec<String> {
        Vec::new()
    }

    fn enclosure(&self) -> Option<Enclosure> {
        None
    }

    fn comment_count(&self) -> Option<u64> {
        None
    }

    fn comment_link(&self) -> Option<String> {
        None
    }

    fn comment_feed_link(&self) -> Option<String> {
        None
    }
}

/// The two capability roles an extension instance can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionRole {
    Feed,
    Entry,
}

impl ExtensionRole {
    /// Registry key suffix for the role.
    pub fn suffix(self) -> &'static str {
        match self {
            ExtensionRole::Feed => "Feed",
            ExtensionRole::Entry => "Entry",
        }
    }

    /// Registry key for an extension name in this role.
    pub fn key(self, name: &str) -> String {
        format!("{}/{}", name, self.suffix())
    }
}

/// A bound extension instance.
pub enum Extension {
    Feed(Box<dyn FeedExtension>),
    Entry(Box<dyn EntryExtension>),
}

impl Extension {
    pub fn role(&self) -> ExtensionRole {
        match self {
            Extension::Feed(_) => ExtensionRole::Feed,
            Extension::Entry(_) => ExtensionRole::Entry,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Extension::Feed(ext) => ext.name(),
            Extension::Entry(ext) => ext.name(),
        }
    }

    pub fn into_feed(self) -> Option<Box<dyn FeedExtension>> {
        match self {
            Extension::Feed(ext) => Some(ext),
            Extension::Entry(_) => None,
        }
    }

    pub fn into_entry(self) -> Option<Box<dyn EntryExtension>> {
        match self {
            Extension::Entry(ext) => Some(ext),
            Extension::Feed(_) => None,
        }
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Extension({})", self.role().key(self.name()))
    }
}

/// Builds a probe bound to a facade scope.
pub type ExtensionFactory = fn(XPathScope) -> Extension;

/// Lookup of extension probes by registry key.
pub trait ExtensionManager {
    /// Whether a probe is registered under `name`.
    fn has(&self, name: &str) -> bool;

    /// Builds a new probe instance bound to `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::NotFound`](crate::FeedError::NotFound) when
    /// nothing is registered under `name`.
    fn get(&self, name: &str, scope: XPathScope) -> Result<Extension>;
}

/// Extension names registered by a default reader, in fallback order.
pub const CORE_EXTENSIONS: [&str; 9] = [
    dublin_core::NAME,
    atom::NAME,
    content::NAME,
    slash::NAME,
    well_formed_web::NAME,
    thread::NAME,
    podcast::NAME,
    creative_commons::NAME,
    syndication::NAME,
];

/// Every probe shipped with the crate, keyed as `<Name>/<Role>`.
pub fn standard_extensions() -> Vec<(String, ExtensionFactory)> {
    use ExtensionRole::{Entry, Feed};

    let extensions: [(&str, ExtensionRole, ExtensionFactory); 13] = [
        (atom::NAME, Entry, |scope| Extension::Entry(Box::new(atom::Entry::new(scope)))),
        (atom::NAME, Feed, |scope| Extension::Feed(Box::new(atom::Feed::new(scope)))),
        (content::NAME, Entry, |scope| Extension::Entry(Box::new(content::Entry::new(scope)))),
        (creative_commons::NAME, Entry, |scope| Extension::Entry(Box::new(creative_commons::Entry::new(scope)))),
        (creative_commons::NAME, Feed, |scope| Extension::Feed(Box::new(creative_commons::Feed::new(scope)))),
        (dublin_core::NAME, Entry, |scope| Extension::Entry(Box::new(dublin_core::Entry::new(scope)))),
        (dublin_core::NAME, Feed, |scope| Extension::Feed(Box::new(dublin_core::Feed::new(scope)))),
        (podcast::NAME, Entry, |scope| Extension::Entry(Box::new(podcast::Entry::new(scope)))),
        (podcast::NAME, Feed, |scope| Extension::Feed(Box::new(podcast::Feed::new(scope)))),
        (slash::NAME, Entry, |scope| Extension::Entry(Box::new(slash::Entry::new(scope)))),
        (syndication::NAME, Feed, |scope| Extension::Feed(Box::new(syndication::Feed::new(scope)))),
        (thread::NAME, Entry, |scope| Extension::Entry(Box::new(thread::Entry::new(scope)))),
        (well_formed_web::NAME, Entry, |scope| Extension::Entry(Box::new(well_formed_web::Entry::new(scope)))),
    ];

    extensions.into_iter().map(|(name, role, factory)| (role.key(name), factory)).collect()
}

/// Parses a non-negative integer element value.
pub(crate) fn parse_count(value: Option<String>) -> Option<u64> {
    value.and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_keys() {
        assert_eq!(ExtensionRole::Entry.key("DublinCore"), "DublinCore/Entry");
        assert_eq!(ExtensionRole::Feed.key("Syndication"), "Syndication/Feed");
    }

    #[test]
    fn test_standard_set_covers_core_names() {
        let keys: Vec<String> = standard_extensions().into_iter().map(|(key, _)| key).collect();
        for name in CORE_EXTENSIONS {
            assert!(
                keys.contains(&ExtensionRole::Feed.key(name)) || keys.contains(&ExtensionRole::Entry.key(name)),
                "{} has no registered role",
                name
            );
        }
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some(" 321 ".to_string())), Some(321));
        assert_eq!(parse_count(Some("many".to_string())), None);
        assert_eq!(parse_count(None), None);
    }
}
