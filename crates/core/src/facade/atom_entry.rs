use std::rc::Rc;

use time::OffsetDateTime;

use super::{Accessor, AtomFeed, Entry, ExtensionSet, FacadeContext, Feed, concat, merge, non_empty, strict_date};
use crate::document::{FeedDocument, XPathScope};
use crate::error::Result;
use crate::extension::{EntryExtension, FeedExtension, atom, dublin_core};
use crate::feed_type::FeedType;
use crate::model::{Author, Category, Enclosure};

const SKIP_NATIVE: [&str; 1] = [atom::NAME];

/// Facade over an `atom:entry`, inside a feed or as a standalone document.
pub struct AtomEntry {
    scope: XPathScope,
    index: usize,
    context: Rc<FacadeContext>,
    atom: atom::Entry,
    extensions: ExtensionSet<dyn EntryExtension>,
    standalone: bool,
}

impl AtomEntry {
    pub fn new(document: Rc<FeedDocument>, index: usize, feed_type: FeedType, context: Rc<FacadeContext>) -> Self {
        let prefix = format!("{}[{}]", feed_type.item_path(), index + 1);
        Self::build(XPathScope::new(document, prefix, feed_type), index, context, false)
    }

    /// An entry that is the document element (`atom-10-entry`).
    pub fn standalone(document: Rc<FeedDocument>, context: Rc<FacadeContext>) -> Self {
        let scope = XPathScope::new(document, "/atom:entry", FeedType::Atom10Entry);
        Self::build(scope, 0, context, true)
    }

    fn build(scope: XPathScope, index: usize, context: Rc<FacadeContext>, standalone: bool) -> Self {
        let atom = atom::Entry::new(scope.clone());
        let extensions = ExtensionSet::for_entry(&context, &scope);

        Self { scope, index, context, atom, extensions, standalone }
    }

    pub fn is_standalone(&self) -> bool {
        self.standalone
    }

    /// The native Atom accessors.
    pub fn atom(&self) -> &atom::Entry {
        &self.atom
    }

    fn order(&self, accessor: Accessor) -> &[String] {
        self.context.fallback().get(accessor)
    }

    /// Entry authors, else the `atom:source` authors, else the feed's.
    fn native_authors(&self) -> Vec<Author> {
        let authors = self.atom.authors();
        if !authors.is_empty() {
            return authors;
        }

        let source = atom::Feed::new(self.scope.with_prefix(self.scope.path("/atom:source"))).authors();
        if !source.is_empty() || self.standalone {
            return source;
        }

        atom::Feed::new(self.scope.with_prefix(self.scope.feed_type().channel_path())).authors()
    }
}

impl Entry for AtomEntry {
    fn as_dyn(&self) -> &dyn Entry {
        self
    }

    fn feed_type(&self) -> FeedType {
        self.scope.feed_type()
    }

    fn scope(&self) -> &XPathScope {
        &self.scope
    }

    fn extensions(&self) -> &ExtensionSet<dyn EntryExtension> {
        &self.extensions
    }

    fn index(&self) -> usize {
        self.index
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

    fn content(&self) -> Option<String> {
        self.atom
            .content()
            .or_else(|| self.extensions.first(self.order(Accessor::Content), &SKIP_NATIVE, |ext| ext.content()))
            .or_else(|| self.description())
    }

    fn authors(&self) -> Option<Vec<Author>> {
        let dc = self.extensions.get(dublin_core::NAME).map(|dc| dc.authors()).unwrap_or_default();
        let authors = merge(self.native_authors(), dc);
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

    fn enclosure(&self) -> Option<Enclosure> {
        self.atom
            .enclosure()
            .or_else(|| self.extensions.first(self.order(Accessor::Enclosure), &SKIP_NATIVE, |ext| ext.enclosure()))
    }

    fn links(&self) -> Vec<String> {
        let links = self.atom.links();
        if !links.is_empty() {
            return links;
        }
        self.extensions.first_nonempty(self.order(Accessor::Link), &SKIP_NATIVE, |ext| ext.links())
    }

    fn comment_count(&self) -> Option<u64> {
        self.extensions
            .first(self.order(Accessor::CommentCount), &[], |ext| ext.comment_count())
            .or_else(|| self.atom.comment_count())
    }

    fn comment_link(&self) -> Option<String> {
        self.extensions
            .first(self.order(Accessor::CommentLink), &[], |ext| ext.comment_link())
            .or_else(|| self.atom.comment_link())
    }

    fn comment_feed_link(&self) -> Option<String> {
        self.extensions
            .first(self.order(Accessor::CommentFeedLink), &[], |ext| ext.comment_feed_link())
            .or_else(|| self.atom.comment_feed_link())
    }

    fn source(&self) -> Option<Box<dyn Feed>> {
        if !self.atom.has_source() {
            return None;
        }

        let scope = self.scope.with_prefix(self.scope.path("/atom:source"));
        Some(Box::new(AtomFeed::source(scope, Rc::clone(&self.context))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:thr="http://purl.org/syndication/thread/1.0"
        xmlns:slash="http://purl.org/rss/1.0/modules/slash/">
        <title>Feed</title>
        <author><name>Feed Author</name></author>
        <entry>
          <id>urn:1</id>
          <title>One</title>
          <summary>Short</summary>
          <content type="html">&lt;p&gt;Long&lt;/p&gt;</content>
          <link href="http://example.com/1"/>
          <link rel="replies" href="http://example.com/1/comments" thr:count="5"/>
          <slash:comments>321</slash:comments>
          <published>2009-03-07T08:03:50Z</published>
          <updated>2009-03-08T08:03:50Z</updated>
          <source>
            <id>urn:origin</id>
            <title>Origin</title>
            <author><name>Source Author</name></author>
          </source>
        </entry>
        <entry>
          <title>Two</title>
          <summary>Just a summary</summary>
          <thr:total>7</thr:total>
        </entry>
    </feed>"#;

    fn entry(index: usize) -> AtomEntry {
        let document = Rc::new(FeedDocument::parse(ATOM).unwrap());
        AtomEntry::new(document, index, FeedType::Atom10, Rc::new(FacadeContext::standard()))
    }

    #[test]
    fn test_entry_accessors() {
        let entry = entry(0);

        assert_eq!(entry.id().as_deref(), Some("urn:1"));
        assert_eq!(entry.title().as_deref(), Some("One"));
        assert_eq!(entry.description().as_deref(), Some("Short"));
        assert_eq!(entry.content().as_deref(), Some("<p>Long</p>"));
        assert_eq!(entry.permalink().as_deref(), Some("http://example.com/1"));
        assert!(entry.date_created() < entry.date_modified());
        assert_eq!(entry.authors(), Some(vec![Author::named("Source Author")]));
    }

    #[test]
    fn test_comment_count_prefers_slash() {
        assert_eq!(entry(0).comment_count(), Some(321));
        assert_eq!(entry(1).comment_count(), Some(7));
        assert_eq!(entry(0).comment_link(), None);
    }

    #[test]
    fn test_fallbacks() {
        let entry = entry(1);

        assert_eq!(entry.id().as_deref(), Some("Two"));
        assert_eq!(entry.content().as_deref(), Some("Just a summary"));
        assert_eq!(entry.authors(), Some(vec![Author::named("Feed Author")]));
        assert!(entry.source().is_none());
    }

    #[test]
    fn test_source_feed() {
        let source = entry(0).source().unwrap();

        assert_eq!(source.id().as_deref(), Some("urn:origin"));
        assert_eq!(source.title().as_deref(), Some("Origin"));
        assert_eq!(source.count(), 0);
        assert!(source.entry(0).is_err());
    }

    #[test]
    fn test_standalone_entry() {
        let xml = r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>urn:solo</id><title>Solo</title></entry>"#;
        let entry =
            AtomEntry::standalone(Rc::new(FeedDocument::parse(xml).unwrap()), Rc::new(FacadeContext::standard()));

        assert!(entry.is_standalone());
        assert_eq!(entry.feed_type(), FeedType::Atom10Entry);
        assert_eq!(entry.id().as_deref(), Some("urn:solo"));
        assert_eq!(entry.authors(), None);
    }
}
