use std::rc::Rc;

use time::OffsetDateTime;

use super::{Accessor, Entry, ExtensionSet, FacadeContext, concat, merge, non_empty, rss_path, strict_date};
use crate::date::parse_date;
use crate::document::{FeedDocument, XPathScope, attribute, text_content};
use crate::error::Result;
use crate::extension::{EntryExtension, dublin_core};
use crate::feed_type::FeedType;
use crate::model::{Author, Category, Enclosure};

/// Facade over one RSS `item` (or RDF `rss:item`).
pub struct RssEntry {
    scope: XPathScope,
    index: usize,
    context: Rc<FacadeContext>,
    extensions: ExtensionSet<dyn EntryExtension>,
}

impl RssEntry {
    pub fn new(document: Rc<FeedDocument>, index: usize, feed_type: FeedType, context: Rc<FacadeContext>) -> Self {
        let prefix = format!("{}[{}]", feed_type.item_path(), index + 1);
        let scope = XPathScope::new(document, prefix, feed_type);
        let extensions = ExtensionSet::for_entry(&context, &scope);

        Self { scope, index, context, extensions }
    }

    fn native(&self, element: &str) -> Option<String> {
        self.scope.trimmed(&rss_path(&self.scope, element))
    }

    /// Elements RDF items do not carry.
    fn rss_only(&self, element: &str) -> Option<String> {
        if self.scope.feed_type().is_rdf() { None } else { self.native(element) }
    }

    fn order(&self, accessor: Accessor) -> &[String] {
        self.context.fallback().get(accessor)
    }

    fn native_authors(&self) -> Vec<Author> {
        if self.scope.feed_type().is_rdf() {
            return Vec::new();
        }

        self.scope
            .strings(&self.scope.path("/author"))
            .into_iter()
            .map(|value| Author::from_rss(&value).unwrap_or_else(|| Author::named(value.trim())))
            .collect()
    }

    fn native_categories(&self) -> Vec<Category> {
        if self.scope.feed_type().is_rdf() {
            return Vec::new();
        }

        self.scope.elements(&self.scope.path("/category"), |element| {
            let term = text_content(element).trim().to_string();
            (!term.is_empty()).then(|| Category::new(term, attribute(element, "domain"), None))
        })
    }

    fn native_enclosure(&self) -> Option<Enclosure> {
        if self.scope.feed_type().is_rdf() {
            return None;
        }

        self.scope.first_element(&self.scope.path("/enclosure"), |element| {
            Some(Enclosure {
                url: attribute(element, "url")?,
                length: attribute(element, "length").and_then(|length| length.parse().ok()),
                media_type: attribute(element, "type"),
            })
        })
    }
}

impl Entry for RssEntry {
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

    fn content(&self) -> Option<String> {
        self.extensions
            .first(self.order(Accessor::Content), &[], |ext| ext.content())
            .or_else(|| self.description())
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

    fn date_created(&self) -> Option<OffsetDateTime> {
        self.extensions
            .first(self.order(Accessor::DateCreated), &[], |ext| ext.date_created())
            .or_else(|| self.date_modified())
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        self.rss_only("pubDate")
            .and_then(|date| parse_date(&date))
            .or_else(|| self.extensions.first(self.order(Accessor::DateModified), &[], |ext| ext.date_modified()))
    }

    fn date_modified_strict(&self) -> Result<Option<OffsetDateTime>> {
        strict_date(self.rss_only("pubDate"), || {
            self.extensions.first(self.order(Accessor::DateModified), &[], |ext| ext.date_modified())
        })
    }

    fn enclosure(&self) -> Option<Enclosure> {
        self.native_enclosure()
            .or_else(|| self.extensions.first(self.order(Accessor::Enclosure), &[], |ext| ext.enclosure()))
    }

    fn links(&self) -> Vec<String> {
        let links: Vec<String> = self
            .scope
            .strings(&rss_path(&self.scope, "link"))
            .into_iter()
            .map(|link| self.scope.absolutise(&link))
            .collect();
        if !links.is_empty() {
            return links;
        }

        self.extensions.first_nonempty(self.order(Accessor::Link), &[], |ext| ext.links())
    }

    fn comment_count(&self) -> Option<u64> {
        self.extensions.first(self.order(Accessor::CommentCount), &[], |ext| ext.comment_count())
    }

    fn comment_link(&self) -> Option<String> {
        self.rss_only("comments")
            .map(|link| self.scope.absolutise(&link))
            .or_else(|| self.extensions.first(self.order(Accessor::CommentLink), &[], |ext| ext.comment_link()))
    }

    fn comment_feed_link(&self) -> Option<String> {
        self.extensions
            .first(self.order(Accessor::CommentFeedLink), &[], |ext| ext.comment_feed_link())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeedError;
    use time::macros::datetime;

    const RSS: &str = r#"<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:content="http://purl.org/rss/1.0/modules/content/"
        xmlns:slash="http://purl.org/rss/1.0/modules/slash/"
        xmlns:wfw="http://wellformedweb.org/CommentAPI/"><channel>
      <item>
        <title>First</title>
        <link>http://example.com/1</link>
        <description>Summary</description>
        <content:encoded><![CDATA[<p>Full</p>]]></content:encoded>
        <author>joe@example.com (Joe Bloggs)</author>
        <dc:creator>Jane Doe</dc:creator>
        <category domain="http://example.com/c">native</category>
        <dc:subject>dublin</dc:subject>
        <guid>http://example.com/guid/1</guid>
        <pubDate>Sat, 07 Mar 2009 08:03:50 +0000</pubDate>
        <comments>http://example.com/1#comments</comments>
        <slash:comments>321</slash:comments>
        <wfw:commentRss>http://example.com/1/comments.rss</wfw:commentRss>
        <enclosure url="http://example.com/a.mp3" length="1234" type="audio/mpeg"/>
      </item>
      <item>
        <description>Only a description</description>
        <dc:identifier>urn:dc:2</dc:identifier>
        <dc:date>2009-03-07T08:03:50Z</dc:date>
      </item>
      <item><enclosure length="1"/><pubDate>whenever</pubDate></item>
    </channel></rss>"#;

    fn entry(index: usize) -> RssEntry {
        let document = Rc::new(FeedDocument::parse(RSS).unwrap());
        RssEntry::new(document, index, FeedType::Rss20, Rc::new(FacadeContext::standard()))
    }

    #[test]
    fn test_native_accessors() {
        let entry = entry(0);

        assert_eq!(entry.id().as_deref(), Some("http://example.com/guid/1"));
        assert_eq!(entry.title().as_deref(), Some("First"));
        assert_eq!(entry.description().as_deref(), Some("Summary"));
        assert_eq!(entry.content().as_deref(), Some("<p>Full</p>"));
        assert_eq!(entry.permalink().as_deref(), Some("http://example.com/1"));
        assert_eq!(entry.date_modified(), Some(datetime!(2009-03-07 08:03:50 UTC)));
        assert_eq!(entry.date_created(), entry.date_modified());
        assert_eq!(entry.comment_count(), Some(321));
        assert_eq!(entry.comment_link().as_deref(), Some("http://example.com/1#comments"));
        assert_eq!(entry.comment_feed_link().as_deref(), Some("http://example.com/1/comments.rss"));
        assert_eq!(entry.index(), 0);
    }

    #[test]
    fn test_authors_and_categories_merge() {
        let entry = entry(0);

        let authors = entry.authors().unwrap();
        assert_eq!(authors[0].name.as_deref(), Some("Joe Bloggs"));
        assert_eq!(authors[1], Author::named("Jane Doe"));

        let terms: Vec<_> = entry.categories().into_iter().map(|c| c.term).collect();
        assert_eq!(terms, vec!["native", "dublin"]);
    }

    #[test]
    fn test_enclosure() {
        let enclosure = entry(0).enclosure().unwrap();
        assert_eq!(enclosure.url, "http://example.com/a.mp3");
        assert_eq!(enclosure.length, Some(1234));
        assert_eq!(enclosure.media_type.as_deref(), Some("audio/mpeg"));

        assert_eq!(entry(2).enclosure(), None);
    }

    #[test]
    fn test_fallbacks() {
        let entry = entry(1);

        assert_eq!(entry.id().as_deref(), Some("urn:dc:2"));
        assert_eq!(entry.title(), None);
        assert_eq!(entry.content().as_deref(), Some("Only a description"));
        assert_eq!(entry.date_modified(), Some(datetime!(2009-03-07 08:03:50 UTC)));
        assert_eq!(entry.authors(), None);
        assert!(entry.categories().is_empty());
        assert!(entry.links().is_empty());
        assert_eq!(entry.comment_count(), None);
    }

    #[test]
    fn test_idempotent_accessors() {
        let entry = entry(0);
        assert_eq!(entry.authors(), entry.authors());
        assert_eq!(entry.categories(), entry.categories());
        assert_eq!(entry.enclosure(), entry.enclosure());
    }

    #[test]
    fn test_strict_date() {
        let entry = entry(2);
        assert_eq!(entry.date_modified(), None);
        assert!(matches!(entry.date_modified_strict(), Err(FeedError::InvalidDate(_))));
        assert!(matches!(self::entry(1).date_modified_strict(), Ok(Some(_))));
    }
}
