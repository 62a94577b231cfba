use std::rc::Rc;

use time::OffsetDateTime;

use super::{
    Accessor, Entry, EntryCollection, ExtensionSet, FacadeContext, Feed, RssEntry, concat, merge, non_empty, rss_namespace,
    rss_path, strict_date,
};
use crate::date::parse_date;
use crate::document::{FeedDocument, XPathScope, attribute, child_text};
use crate::error::Result;
use crate::extension::{FeedExtension, dublin_core};
use crate::feed_type::FeedType;
use crate::model::{Author, Category, Image};

/// Facade over an RSS 0.9x/2.0 channel or an RDF (RSS 0.90/1.0) channel.
pub struct RssFeed {
    scope: XPathScope,
    context: Rc<FacadeContext>,
    extensions: ExtensionSet<dyn FeedExtension>,
    entries: EntryCollection<RssEntry>,
    original_source_uri: Option<String>,
}

impl RssFeed {
    pub fn new(document: Rc<FeedDocument>, feed_type: FeedType, context: Rc<FacadeContext>) -> Self {
        let scope = XPathScope::new(document, feed_type.channel_path(), feed_type);
        let extensions = ExtensionSet::for_feed(&context, &scope);
        let count = scope.count(feed_type.item_path());

        Self { scope, context, extensions, entries: EntryCollection::new(count), original_source_uri: None }
    }

    fn native(&self, element: &str) -> Option<String> {
        self.scope.trimmed(&rss_path(&self.scope, element))
    }

    fn rss_only(&self, element: &str) -> Option<String> {
        if self.scope.feed_type().is_rdf() { None } else { self.native(element) }
    }

    fn order(&self, accessor: Accessor) -> &[String] {
        self.context.fallback().get(accessor)
    }

    /// `author` and `managingEditor` values in RSS notation.
    fn native_authors(&self) -> Vec<Author> {
        if self.scope.feed_type().is_rdf() {
            return Vec::new();
        }

        ["author", "managingEditor"]
            .iter()
            .flat_map(|element| self.scope.strings(&self.scope.path(&format!("/{}", element))))
            .map(|value| Author::from_rss(&value).unwrap_or_else(|| Author::named(value.trim())))
            .collect()
    }

    fn native_categories(&self) -> Vec<Category> {
        if self.scope.feed_type().is_rdf() {
            return Vec::new();
        }

        self.scope.elements(&self.scope.path("/category"), |element| {
            let term = crate::document::text_content(element).trim().to_string();
            (!term.is_empty()).then(|| Category::new(term, attribute(element, "domain"), None))
        })
    }

    fn native_image(&self) -> Option<Image> {
        let path = if self.scope.feed_type().is_rdf() { "/rdf:RDF/rss:image" } else { "/rss/channel/image" };
        let ns = self.scope.feed_type().is_rdf().then(|| rss_namespace(self.scope.feed_type()));

        self.scope.first_element(path, |element| {
            let text = |name: &str| child_text(element, ns, name);
            let number = |name: &str| text(name).and_then(|value| value.parse().ok());

            Some(Image {
                uri: self.scope.absolutise(&text("url")?),
                link: text("link"),
                title: text("title"),
                description: text("description"),
                height: number("height"),
                width: number("width"),
            })
        })
    }
}

impl Feed for RssFeed {
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
        self.rss_only("guid")
            .or_else(|| self.extensions.first(self.order(Accessor::Id), &[], |ext| ext.id()))
            .or_else(|| self.title())
    }

    fn title(&self) -> Option<String> {
        self.native("title")
            .or_else(|| self.extensions.first(self.order(Accessor::Title), &[], |ext| ext.title()))
    }

    fn description(&self) -> Option<String> {
        self.native("description")
            .or_else(|| self.extensions.first(self.order(Accessor::Description), &[], |ext| ext.description()))
    }

    fn authors(&self) -> Option<Vec<Author>> {
        let dc = self.extensions.get(dublin_core::NAME).map(|dc| dc.authors()).unwrap_or_default();
        let authors = merge(self.native_authors(), dc);
        if !authors.is_empty() {
            return Some(authors);
        }

        non_empty(self.extensions.first_nonempty(self.order(Accessor::Authors), &[dublin_core::NAME], |ext| {
            ext.authors()
        }))
    }

    fn categories(&self) -> Vec<Category> {
        let dc = self.extensions.get(dublin_core::NAME).map(|dc| dc.categories()).unwrap_or_default();
        let categories = concat(self.native_categories(), dc);
        if !categories.is_empty() {
            return categories;
        }

        self.extensions
            .first_nonempty(self.order(Accessor::Categories), &[dublin_core::NAME], |ext| ext.categories())
    }

    fn copyright(&self) -> Option<String> {
        self.native("copyright")
            .or_else(|| self.extensions.first(self.order(Accessor::Copyright), &[], |ext| ext.copyright()))
    }

    fn date_created(&self) -> Option<OffsetDateTime> {
        self.extensions
            .first(self.order(Accessor::DateCreated), &[], |ext| ext.date_created())
            .or_else(|| self.date_modified())
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        self.rss_only("pubDate")
            .and_then(|date| parse_date(&date))
            .or_else(|| self.last_build_date())
            .or_else(|| self.extensions.first(self.order(Accessor::DateModified), &[], |ext| ext.date_modified()))
    }

    fn date_modified_strict(&self) -> Result<Option<OffsetDateTime>> {
        strict_date(self.rss_only("pubDate").or_else(|| self.rss_only("lastBuildDate")), || {
            self.extensions.first(self.order(Accessor::DateModified), &[], |ext| ext.date_modified())
        })
    }

    fn last_build_date(&self) -> Option<OffsetDateTime> {
        self.rss_only("lastBuildDate").and_then(|date| parse_date(&date))
    }

    fn generator(&self) -> Option<String> {
        self.rss_only("generator")
            .or_else(|| self.extensions.first(self.order(Accessor::Generator), &[], |ext| ext.generator()))
    }

    fn language(&self) -> Option<String> {
        self.rss_only("language")
            .or_else(|| self.extensions.first(self.order(Accessor::Language), &[], |ext| ext.language()))
    }

    fn link(&self) -> Option<String> {
        self.native("link")
            .map(|link| self.scope.absolutise(&link))
            .or_else(|| self.extensions.first(self.order(Accessor::Link), &[], |ext| ext.link()))
    }

    fn feed_link(&self) -> Option<String> {
        self.extensions
            .first(self.order(Accessor::FeedLink), &[], |ext| ext.feed_link())
            .or_else(|| self.original_source_uri.clone())
    }

    fn hubs(&self) -> Vec<String> {
        self.extensions.first_nonempty(self.order(Accessor::Hubs), &[], |ext| ext.hubs())
    }

    fn image(&self) -> Option<Image> {
        self.native_image()
            .or_else(|| self.extensions.first(self.order(Accessor::Image), &[], |ext| ext.image()))
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
            RssEntry::new(Rc::clone(self.scope.document()), index, self.scope.feed_type(), Rc::clone(&self.context))
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use time::macros::datetime;

    const RSS: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
    <rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:atom="http://www.w3.org/2005/Atom">
      <channel>
        <title>My Feed</title>
        <link>http://example.com/</link>
        <description>All about things</description>
        <language>en-us</language>
        <copyright>Copyright 2009</copyright>
        <managingEditor>editor@example.com (Ed Itor)</managingEditor>
        <dc:creator>Ed Itor</dc:creator>
        <category domain="http://example.com/cats">native</category>
        <dc:subject>dublin</dc:subject>
        <generator>Hand</generator>
        <pubDate>Sat, 07 Mar 2009 08:03:50 +0000</pubDate>
        <lastBuildDate>Sun, 08 Mar 2009 08:03:50 +0000</lastBuildDate>
        <atom:link rel="self" href="http://example.com/feed.xml"/>
        <atom:link rel="hub" href="http://pubsubhubbub.appspot.com/"/>
        <image><url>http://example.com/logo.png</url><title>Logo</title><link>http://example.com/</link>
          <width>88</width><height>31</height></image>
        <item><title>One</title></item>
        <item><title>Two</title></item>
      </channel>
    </rss>"#;

    fn feed(xml: &str, feed_type: FeedType) -> RssFeed {
        let document = Rc::new(FeedDocument::parse(xml).unwrap());
        RssFeed::new(document, feed_type, Rc::new(FacadeContext::standard()))
    }

    #[test]
    fn test_channel_accessors() {
        let feed = feed(RSS, FeedType::Rss20);

        assert_eq!(feed.title().as_deref(), Some("My Feed"));
        assert_eq!(feed.link().as_deref(), Some("http://example.com/"));
        assert_eq!(feed.description().as_deref(), Some("All about things"));
        assert_eq!(feed.language().as_deref(), Some("en-us"));
        assert_eq!(feed.copyright().as_deref(), Some("Copyright 2009"));
        assert_eq!(feed.generator().as_deref(), Some("Hand"));
        assert_eq!(feed.encoding(), "ISO-8859-1");
        assert_eq!(feed.feed_link().as_deref(), Some("http://example.com/feed.xml"));
        assert_eq!(feed.hubs(), vec!["http://pubsubhubbub.appspot.com/"]);
        assert_eq!(feed.id().as_deref(), Some("My Feed"));
    }

    #[test]
    fn test_dates() {
        let feed = feed(RSS, FeedType::Rss20);
        assert_eq!(feed.date_modified(), Some(datetime!(2009-03-07 08:03:50 UTC)));
        assert_eq!(feed.last_build_date(), Some(datetime!(2009-03-08 08:03:50 UTC)));
        assert_eq!(feed.date_created(), feed.date_modified());
    }

    #[test]
    fn test_authors_merge_with_dublin_core() {
        let feed = feed(RSS, FeedType::Rss20);
        let authors = feed.authors().unwrap();

        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].email.as_deref(), Some("editor@example.com"));
        assert_eq!(authors[1], Author::named("Ed Itor"));
        assert_eq!(feed.author(1), Some(Author::named("Ed Itor")));
        assert_eq!(feed.author(2), None);
    }

    #[test]
    fn test_native_categories_before_dublin_core() {
        let feed = feed(RSS, FeedType::Rss20);
        let terms: Vec<_> = feed.categories().into_iter().map(|c| c.term).collect();
        assert_eq!(terms, vec!["native", "dublin"]);
        assert_eq!(feed.categories()[0].scheme.as_deref(), Some("http://example.com/cats"));
    }

    #[test]
    fn test_image() {
        let image = feed(RSS, FeedType::Rss20).image().unwrap();
        assert_eq!(image.uri, "http://example.com/logo.png");
        assert_eq!(image.title.as_deref(), Some("Logo"));
        assert_eq!(image.width, Some(88));
        assert_eq!(image.height, Some(31));
    }

    #[test]
    fn test_entries_are_cached() {
        let feed = feed(RSS, FeedType::Rss20);
        assert_eq!(feed.count(), 2);

        let first = feed.entry(0).unwrap() as *const dyn Entry;
        let again = feed.entry(0).unwrap() as *const dyn Entry;
        assert!(std::ptr::addr_eq(first, again));
        assert!(matches!(feed.entry(2), Err(FeedError::OutOfRange { index: 2, count: 2 })));
    }

    #[test]
    fn test_absent_fields() {
        let feed = feed(r#"<rss version="2.0"><channel></channel></rss>"#, FeedType::Rss20);

        assert_eq!(feed.title(), None);
        assert_eq!(feed.id(), None);
        assert_eq!(feed.authors(), None);
        assert!(feed.categories().is_empty());
        assert_eq!(feed.date_modified(), None);
        assert_eq!(feed.image(), None);
        assert!(feed.hubs().is_empty());
        assert_eq!(feed.count(), 0);
        assert!(matches!(feed.current(), Err(FeedError::OutOfRange { index: 0, count: 0 })));
    }

    #[test]
    fn test_strict_date() {
        let feed = feed(r#"<rss version="2.0"><channel><pubDate>someday</pubDate></channel></rss>"#, FeedType::Rss20);
        assert_eq!(feed.date_modified(), None);
        assert!(matches!(feed.date_modified_strict(), Err(FeedError::InvalidDate(_))));
    }

    #[test]
    fn test_rdf_channel() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
            <channel rdf:about="http://example.com/"><title>RDF</title><link>http://example.com/</link></channel>
            <image rdf:about="http://example.com/i.png"><url>http://example.com/i.png</url></image>
            <item rdf:about="http://example.com/1"><title>One</title></item>
            </rdf:RDF>"#;
        let feed = feed(xml, FeedType::Rss10);

        assert_eq!(feed.title().as_deref(), Some("RDF"));
        assert_eq!(feed.link().as_deref(), Some("http://example.com/"));
        assert_eq!(feed.image().unwrap().uri, "http://example.com/i.png");
        assert_eq!(feed.count(), 1);
    }
}
