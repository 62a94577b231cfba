use std::rc::Rc;

use time::OffsetDateTime;

use super::{
    Accessor, AtomEntry, Entry, EntryCollection, ExtensionSet, FacadeContext, Feed, concat, merge, non_empty, strict_date,
};
use crate::document::{FeedDocument, XPathScope};
use crate::error::Result;
use crate::extension::{FeedExtension, atom, dublin_core};
use crate::feed_type::FeedType;
use crate::model::{Author, Category, Image};

const SKIP_NATIVE: [&str; 1] = [atom::NAME];

/// Facade over an `atom:feed` element, or over the `atom:source` of an
/// entry.
///
/// A source facade answers the same accessors but never has entries.
pub struct AtomFeed {
    scope: XPathScope,
    context: Rc<FacadeContext>,
    atom: atom::Feed,
    extensions: ExtensionSet<dyn FeedExtension>,
    entries: EntryCollection<AtomEntry>,
    is_source: bool,
    original_source_uri: Option<String>,
}

impl AtomFeed {
    pub fn new(document: Rc<FeedDocument>, feed_type: FeedType, context: Rc<FacadeContext>) -> Self {
        let scope = XPathScope::new(document, feed_type.channel_path(), feed_type);
        let count = scope.count(feed_type.item_path());
        Self::build(scope, context, count, false)
    }

    /// A feed facade over an entry's `atom:source` element.
    pub fn source(scope: XPathScope, context: Rc<FacadeContext>) -> Self {
        Self::build(scope, context, 0, true)
    }

    fn build(scope: XPathScope, context: Rc<FacadeContext>, count: usize, is_source: bool) -> Self {
        let atom = atom::Feed::new(scope.clone());
        let extensions = ExtensionSet::for_feed(&context, &scope);

        Self {
            scope,
            context,
            atom,
            extensions,
            entries: EntryCollection::new(count),
            is_source,
            original_source_uri: None,
        }
    }

    pub fn is_source(&self) -> bool {
        self.is_source
    }

    /// The native Atom accessors.
    pub fn atom(&self) -> &atom::Feed {
        &self.atom
    }

    fn order(&self, accessor: Accessor) -> &[String] {
        self.context.fallback().get(accessor)
    }
}

impl Feed for AtomFeed {
    fn as_dyn(&self) -> &dyn Feed {
        self
    }

    fn feed_type(&self) -> FeedType {
        self.scope.feed_type()
    }

    fn scope(&self) -> &XPathScope {
        &self.scope
    }

    fn extensions(&self) -> &ExtensionSet<dyn FeedExtension> {
        &self.extensions
    }

    fn id(&self) -> Option<String> {
        self.atom
            .id()
            .or_else(|| self.extensions.first(self.order(Accessor::Id), &SKIP_NATIVE, |ext| ext.id()))
            .or_else(|| self.title())
    }

    fn title(&self) -> Option<String> {
        self.atom
            .title()
            .or_else(|| self.extensions.first(self.order(Accessor::Title), &SKIP_NATIVE, |ext| ext.title()))
    }

    fn description(&self) -> Option<String> {
        self.atom.description().or_else(|| {
            self.extensions.first(self.order(Accessor::Description), &SKIP_NATIVE, |ext| ext.description())
        })
    }

    fn authors(&self) -> Option<Vec<Author>> {
        let dc = self.extensions.get(dublin_core::NAME).map(|dc| dc.authors()).unwrap_or_default();
        let authors = merge(self.atom.authors(), dc);
        if !authors.is_empty() {
            return Some(authors);
        }

        non_empty(self.extensions.first_nonempty(
            self.order(Accessor::Authors),
            &[atom::NAME, dublin_core::NAME],
            |ext| ext.authors(),
        ))
    }

    fn categories(&self) -> Vec<Category> {
        let dc = self.extensions.get(dublin_core::NAME).map(|dc| dc.categories()).unwrap_or_default();
        let categories = concat(self.atom.categories(), dc);
        if !categories.is_empty() {
            return categories;
        }

        self.extensions
            .first_nonempty(self.order(Accessor::Categories), &[atom::NAME, dublin_core::NAME], |ext| {
                ext.categories()
            })
    }

    fn copyright(&self) -> Option<String> {
        self.atom
            .copyright()
            .or_else(|| self.extensions.first(self.order(Accessor::Copyright), &SKIP_NATIVE, |ext| ext.copyright()))
    }

    fn date_created(&self) -> Option<OffsetDateTime> {
        self.atom.date_created().or_else(|| {
            self.extensions.first(self.order(Accessor::DateCreated), &SKIP_NATIVE, |ext| ext.date_created())
        })
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        self.atom.date_modified().or_else(|| {
            self.extensions.first(self.order(Accessor::DateModified), &SKIP_NATIVE, |ext| ext.date_modified())
        })
    }

    fn date_modified_strict(&self) -> Result<Option<OffsetDateTime>> {
        let raw = ["/atom:updated", "/atom:modified"]
            .iter()
            .find_map(|element| self.scope.trimmed(&self.scope.path(element)));

        strict_date(raw, || {
            self.extensions.first(self.order(Accessor::DateModified), &SKIP_NATIVE, |ext| ext.date_modified())
        })
    }

    fn generator(&self) -> Option<String> {
        self.atom
            .generator()
            .or_else(|| self.extensions.first(self.order(Accessor::Generator), &SKIP_NATIVE, |ext| ext.generator()))
    }

    fn language(&self) -> Option<String> {
        self.atom
            .language()
            .or_else(|| self.extensions.first(self.order(Accessor::Language), &SKIP_NATIVE, |ext| ext.language()))
    }

    fn link(&self) -> Option<String> {
        self.atom
            .link()
            .or_else(|| self.extensions.first(self.order(Accessor::Link), &SKIP_NATIVE, |ext| ext.link()))
    }

    fn feed_link(&self) -> Option<String> {
        self.atom
            .feed_link()
            .or_else(|| self.extensions.first(self.order(Accessor::FeedLink), &SKIP_NATIVE, |ext| ext.feed_link()))
            .or_else(|| self.original_source_uri.clone())
    }

    fn hubs(&self) -> Vec<String> {
        let hubs = self.atom.hubs();
        if !hubs.is_empty() {
            return hubs;
        }
        self.extensions.first_nonempty(self.order(Accessor::Hubs), &SKIP_NATIVE, |ext| ext.hubs())
    }

    fn image(&self) -> Option<Image> {
        self.atom
            .image()
            .or_else(|| self.extensions.first(self.order(Accessor::Image), &SKIP_NATIVE, |ext| ext.image()))
    }

    fn icon(&self) -> Option<String> {
        self.atom.icon()
    }

    fn original_source_uri(&self) -> Option<String> {
        self.original_source_uri.clone()
    }

    fn set_original_source_uri(&mut self, uri: String) {
        self.original_source_uri = Some(uri);
    }

    fn count(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, index: usize) -> Result<&dyn Entry> {
        let entry = self.entries.get_or_build(index, |index| {
            AtomEntry::new(Rc::clone(self.scope.document()), index, self.scope.feed_type(), Rc::clone(&self.context))
        })?;
        Ok(entry)
    }

    fn position(&self) -> usize {
        self.entries.position()
    }

    fn advance(&self) {
        self.entries.advance();
    }

    fn rewind(&self) {
        self.entries.rewind();
    }
}
