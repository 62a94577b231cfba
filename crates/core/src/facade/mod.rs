//! Uniform read facades over RSS, RDF and Atom documents.
//!
//! A [`Feed`] wraps the channel (or `atom:feed`) node and owns a lazily built
//! collection of [`Entry`] facades. Every accessor resolves through a
//! fallback chain: the format's own elements first, then the bound extension
//! probes in registration order (or in the order configured for that accessor
//! by [`FallbackOrder`]), and finally `None` or an empty `Vec`. Absent data
//! never produces an error.
//!
//! # Example
//!
//! ```rust
//! use feedscope_core::Reader;
//!
//! let xml = r#"<rss version="2.0"><channel><title>T</title>
//!     <item><title>One</title></item></channel></rss>"#;
//! let feed = Reader::new().import_string(xml).unwrap().into_feed().unwrap();
//!
//! assert_eq!(feed.title().as_deref(), Some("T"));
//! for entry in feed.entries() {
//!     assert_eq!(entry.title().as_deref(), Some("One"));
//! }
//! ```

mod atom_entry;
mod atom_feed;
mod rss_entry;
mod rss_feed;

pub use atom_entry::AtomEntry;
pub use atom_feed::AtomFeed;
pub use rss_entry::RssEntry;
pub use rss_feed::RssFeed;

use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::rc::Rc;

use time::OffsetDateTime;

use crate::document::XPathScope;
use crate::error::{FeedError, Result};
use crate::extension::{
    CORE_EXTENSIONS, EntryExtension, ExtensionManager, ExtensionRole, FeedExtension, StandaloneExtensionManager,
    atom, content, slash, thread, well_formed_web,
};
use crate::feed_type::FeedType;
use crate::model::{Author, Category, Enclosure, Image, unique};

/// The accessors whose extension order can be configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    Id,
    Title,
    Description,
    Content,
    Authors,
    Categories,
    Copyright,
    DateCreated,
    DateModified,
    Enclosure,
    Generator,
    Image,
    Language,
    Link,
    FeedLink,
    Hubs,
    CommentCount,
    CommentLink,
    CommentFeedLink,
}

/// Per-accessor extension priority.
///
/// Extensions named for an accessor are consulted first, in the given order;
/// the remaining bound extensions follow in registration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackOrder {
    overrides: HashMap<Accessor, Vec<String>>,
}

impl FallbackOrder {
    /// No overrides: registration order everywhere.
    pub fn registration_order() -> Self {
        Self { overrides: HashMap::new() }
    }

    pub fn set(&mut self, accessor: Accessor, names: Vec<String>) {
        self.overrides.insert(accessor, names);
    }

    pub fn with(mut self, accessor: Accessor, names: &[&str]) -> Self {
        self.set(accessor, names.iter().map(|name| name.to_string()).collect());
        self
    }

    pub fn get(&self, accessor: Accessor) -> &[String] {
        self.overrides.get(&accessor).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Default for FallbackOrder {
    fn default() -> Self {
        Self::registration_order()
            .with(Accessor::CommentCount, &[slash::NAME, thread::NAME, atom::NAME])
            .with(Accessor::CommentFeedLink, &[well_formed_web::NAME, atom::NAME])
            .with(Accessor::Content, &[content::NAME, atom::NAME])
    }
}

/// What every facade of one import shares: the registry, the registered
/// extension names per role and the fallback configuration.
pub struct FacadeContext {
    manager: Rc<dyn ExtensionManager>,
    feed_extensions: Vec<String>,
    entry_extensions: Vec<String>,
    fallback: FallbackOrder,
}

impl FacadeContext {
    pub fn new(
        manager: Rc<dyn ExtensionManager>, feed_extensions: Vec<String>, entry_extensions: Vec<String>,
        fallback: FallbackOrder,
    ) -> Self {
        Self { manager, feed_extensions, entry_extensions, fallback }
    }

    /// The standard registry with every core extension bound.
    pub fn standard() -> Self {
        let manager = StandaloneExtensionManager::new();
        let registered = |role: ExtensionRole| -> Vec<String> {
            CORE_EXTENSIONS
                .iter()
                .filter(|name| manager.has(&role.key(name)))
                .map(|name| name.to_string())
                .collect()
        };
        let feed_extensions = registered(ExtensionRole::Feed);
        let entry_extensions = registered(ExtensionRole::Entry);

        Self::new(Rc::new(manager), feed_extensions, entry_extensions, FallbackOrder::default())
    }

    pub fn fallback(&self) -> &FallbackOrder {
        &self.fallback
    }

    pub fn feed_extensions(&self) -> &[String] {
        &self.feed_extensions
    }

    pub fn entry_extensions(&self) -> &[String] {
        &self.entry_extensions
    }
}

/// The extension probes bound to one facade, in registration order.
pub struct ExtensionSet<E: ?Sized> {
    extensions: Vec<(String, Box<E>)>,
}

impl<E: ?Sized> ExtensionSet<E> {
    pub fn get(&self, name: &str) -> Option<&E> {
        self.extensions.iter().find(|(n, _)| n == name).map(|(_, extension)| extension.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.extensions.iter().map(|(_, extension)| extension.as_ref())
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Consultation order: `order` first, then registration order.
    fn ordered(&self, order: &[String], skip: &[&str]) -> Vec<&E> {
        let mut names: Vec<&str> = order
            .iter()
            .map(String::as_str)
            .filter(|name| !skip.contains(name) && self.get(name).is_some())
            .collect();
        for (name, _) in &self.extensions {
            let name = name.as_str();
            if !skip.contains(&name) && !names.contains(&name) {
                names.push(name);
            }
        }

        names.into_iter().filter_map(|name| self.get(name)).collect()
    }

    /// First `Some` produced by the extensions.
    pub fn first<T>(&self, order: &[String], skip: &[&str], f: impl Fn(&E) -> Option<T>) -> Option<T> {
        self.ordered(order, skip).into_iter().find_map(f)
    }

    /// First non-empty list produced by the extensions.
    pub fn first_nonempty<T>(&self, order: &[String], skip: &[&str], f: impl Fn(&E) -> Vec<T>) -> Vec<T> {
        self.ordered(order, skip)
            .into_iter()
            .map(f)
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }
}

impl ExtensionSet<dyn FeedExtension> {
    pub(crate) fn for_feed(context: &FacadeContext, scope: &XPathScope) -> Self {
        let mut extensions: Vec<(String, Box<dyn FeedExtension>)> = Vec::new();
        for name in &context.feed_extensions {
            match context.manager.get(&ExtensionRole::Feed.key(name), scope.clone()) {
                Ok(extension) => match extension.into_feed() {
                    Some(extension) => extensions.push((name.clone(), extension)),
                    None => tracing::warn!(extension = %name, "registered feed extension has the entry role"),
                },
                Err(e) => tracing::warn!(extension = %name, error = %e, "skipping feed extension"),
            }
        }
        Self { extensions }
    }
}

impl ExtensionSet<dyn EntryExtension> {
    pub(crate) fn for_entry(context: &FacadeContext, scope: &XPathScope) -> Self {
        let mut extensions: Vec<(String, Box<dyn EntryExtension>)> = Vec::new();
        for name in &context.entry_extensions {
            match context.manager.get(&ExtensionRole::Entry.key(name), scope.clone()) {
                Ok(extension) => match extension.into_entry() {
                    Some(extension) => extensions.push((name.clone(), extension)),
                    None => tracing::warn!(extension = %name, "registered entry extension has the feed role"),
                },
                Err(e) => tracing::warn!(extension = %name, error = %e, "skipping entry extension"),
            }
        }
        Self { extensions }
    }
}

/// Lazily built entry facades, cached by index, plus the iteration cursor.
pub struct EntryCollection<E> {
    items: Vec<OnceCell<E>>,
    cursor: Cell<usize>,
}

impl<E> EntryCollection<E> {
    pub fn new(count: usize) -> Self {
        Self { items: (0..count).map(|_| OnceCell::new()).collect(), cursor: Cell::new(0) }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The facade at `index`, built by `build` on first access.
    pub fn get_or_build(&self, index: usize, build: impl FnOnce(usize) -> E) -> Result<&E> {
        let cell = self
            .items
            .get(index)
            .ok_or(FeedError::OutOfRange { index, count: self.items.len() })?;
        Ok(cell.get_or_init(|| build(index)))
    }

    pub fn position(&self) -> usize {
        self.cursor.get()
    }

    pub fn advance(&self) {
        self.cursor.set(self.cursor.get() + 1);
    }

    pub fn rewind(&self) {
        self.cursor.set(0);
    }
}

/// Read access to a feed document (RSS channel, RDF channel or Atom feed).
pub trait Feed {
    fn as_dyn(&self) -> &dyn Feed;

    fn feed_type(&self) -> FeedType;

    fn scope(&self) -> &XPathScope;

    /// Extension probes bound to the feed node.
    fn extensions(&self) -> &ExtensionSet<dyn FeedExtension>;

    fn id(&self) -> Option<String>;

    fn title(&self) -> Option<String>;

    fn description(&self) -> Option<String>;

    /// All authors, `None` when there are none.
    fn authors(&self) -> Option<Vec<Author>>;

    fn author(&self, index: usize) -> Option<Author> {
        self.authors().and_then(|authors| authors.into_iter().nth(index))
    }

    fn categories(&self) -> Vec<Category>;

    fn copyright(&self) -> Option<String>;

    fn date_created(&self) -> Option<OffsetDateTime>;

    fn date_modified(&self) -> Option<OffsetDateTime>;

    /// Like [`Feed::date_modified`], but a present and malformed native date
    /// is an error.
    fn date_modified_strict(&self) -> Result<Option<OffsetDateTime>>;

    fn last_build_date(&self) -> Option<OffsetDateTime> {
        None
    }

    fn generator(&self) -> Option<String>;

    fn language(&self) -> Option<String>;

    fn link(&self) -> Option<String>;

    /// The URI of the feed itself.
    fn feed_link(&self) -> Option<String>;

    /// PubSubHubbub hubs advertised by the document.
    fn hubs(&self) -> Vec<String>;

    fn image(&self) -> Option<Image>;

    fn icon(&self) -> Option<String> {
        None
    }

    fn base_url(&self) -> Option<String> {
        self.scope().base_url()
    }

    /// Declared XML encoding, `UTF-8` by default.
    fn encoding(&self) -> String {
        self.scope().document().encoding().to_string()
    }

    /// The URI the feed was fetched from, when the reader recorded it.
    fn original_source_uri(&self) -> Option<String>;

    fn set_original_source_uri(&mut self, uri: String);

    /// Number of entries.
    fn count(&self) -> usize;

    /// The entry facade at `index`.
    fn entry(&self, index: usize) -> Result<&dyn Entry>;

    fn position(&self) -> usize;

    fn advance(&self);

    fn rewind(&self);

    /// The entry under the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::OutOfRange`] when the cursor is past the last
    /// entry, which is always the case for a feed without entries.
    fn current(&self) -> Result<&dyn Entry> {
        self.entry(self.position())
    }

    /// Iterates over all entries from the start.
    fn entries(&self) -> Entries<'_> {
        Entries { feed: self.as_dyn(), index: 0 }
    }
}

impl dyn Feed + '_ {
    /// The bound extension probe of concrete type `T`.
    pub fn extension_as<T: 'static>(&self) -> Option<&T> {
        self.extensions().iter().find_map(|extension| extension.as_any().downcast_ref::<T>())
    }
}

/// Read access to one item or entry.
pub trait Entry {
    fn as_dyn(&self) -> &dyn Entry;

    fn feed_type(&self) -> FeedType;

    fn scope(&self) -> &XPathScope;

    /// Extension probes bound to the entry node.
    fn extensions(&self) -> &ExtensionSet<dyn EntryExtension>;

    /// Position within the owning feed.
    fn index(&self) -> usize;

    fn id(&self) -> Option<String>;

    fn title(&self) -> Option<String>;

    fn description(&self) -> Option<String>;

    fn content(&self) -> Option<String>;

    fn authors(&self) -> Option<Vec<Author>>;

    fn author(&self, index: usize) -> Option<Author> {
        self.authors().and_then(|authors| authors.into_iter().nth(index))
    }

    fn categories(&self) -> Vec<Category>;

    fn date_created(&self) -> Option<OffsetDateTime>;

    fn date_modified(&self) -> Option<OffsetDateTime>;

    fn date_modified_strict(&self) -> Result<Option<OffsetDateTime>>;

    fn enclosure(&self) -> Option<Enclosure>;

    fn links(&self) -> Vec<String>;

    fn link(&self, index: usize) -> Option<String> {
        self.links().into_iter().nth(index)
    }

    fn permalink(&self) -> Option<String> {
        self.link(0)
    }

    fn comment_count(&self) -> Option<u64>;

    fn comment_link(&self) -> Option<String>;

    fn comment_feed_link(&self) -> Option<String>;

    fn base_url(&self) -> Option<String> {
        self.scope().base_url()
    }

    fn encoding(&self) -> String {
        self.scope().document().encoding().to_string()
    }

    /// The `atom:source` feed this entry was copied from.
    fn source(&self) -> Option<Box<dyn Feed>> {
        None
    }
}

impl dyn Entry + '_ {
    /// The bound extension probe of concrete type `T`.
    pub fn extension_as<T: 'static>(&self) -> Option<&T> {
        self.extensions().iter().find_map(|extension| extension.as_any().downcast_ref::<T>())
    }
}

/// Iterator over the entries of a feed.
pub struct Entries<'a> {
    feed: &'a dyn Feed,
    index: usize,
}

impl<'a> Iterator for Entries<'a> {
    type Item = &'a dyn Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.feed.entry(self.index).ok()?;
        self.index += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.feed.count().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}

/// Path to an RSS element below the scoped node, namespaced for RDF.
pub(crate) fn rss_path(scope: &XPathScope, element: &str) -> String {
    if scope.feed_type().is_rdf() {
        scope.path(&format!("/rss:{}", element))
    } else {
        scope.path(&format!("/{}", element))
    }
}

/// The RSS namespace an RDF document's elements live in.
pub(crate) fn rss_namespace(feed_type: FeedType) -> &'static str {
    if feed_type == FeedType::Rss090 { crate::namespaces::RSS_090 } else { crate::namespaces::RSS_10 }
}

/// Native values followed by Dublin Core ones, duplicates removed.
pub(crate) fn merge<T: PartialEq>(native: Vec<T>, dublin_core: Vec<T>) -> Vec<T> {
    unique(concat(native, dublin_core))
}

/// Native values followed by Dublin Core ones, duplicates kept.
pub(crate) fn concat<T>(native: Vec<T>, dublin_core: Vec<T>) -> Vec<T> {
    let mut values = native;
    values.extend(dublin_core);
    values
}

/// `Some` for a non-empty list.
pub(crate) fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    (!values.is_empty()).then_some(values)
}

/// Strict parse of a native date, deferring to `fallback` when it is absent.
pub(crate) fn strict_date(
    raw: Option<String>, fallback: impl FnOnce() -> Option<OffsetDateTime>,
) -> Result<Option<OffsetDateTime>> {
    match raw {
        Some(raw) => crate::date::parse_date_strict(&raw).map(Some),
        None => Ok(fallback()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fallback_order() {
        let order = FallbackOrder::default();
        assert_eq!(order.get(Accessor::CommentCount), ["Slash", "Thread", "Atom"]);
        assert_eq!(order.get(Accessor::CommentFeedLink), ["WellFormedWeb", "Atom"]);
        assert!(order.get(Accessor::Title).is_empty());
    }

    #[test]
    fn test_entry_collection_bounds() {
        let collection: EntryCollection<String> = EntryCollection::new(2);
        let built = collection.get_or_build(1, |index| format!("entry {}", index)).unwrap();
        assert_eq!(built, "entry 1");

        let cached = collection.get_or_build(1, |_| unreachable!()).unwrap();
        assert_eq!(cached, "entry 1");

        assert!(matches!(
            collection.get_or_build(2, |_| String::new()),
            Err(FeedError::OutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_cursor() {
        let collection: EntryCollection<()> = EntryCollection::new(3);
        collection.advance();
        collection.advance();
        assert_eq!(collection.position(), 2);
        collection.rewind();
        assert_eq!(collection.position(), 0);
    }

    #[test]
    fn test_standard_context_roles() {
        let context = FacadeContext::standard();
        assert!(context.feed_extensions().iter().any(|name| name == "Syndication"));
        assert!(!context.entry_extensions().iter().any(|name| name == "Syndication"));
        assert_eq!(context.entry_extensions()[0], "DublinCore");
    }
}
