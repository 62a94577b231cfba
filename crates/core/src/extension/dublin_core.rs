//! Dublin Core probes.
//!
//! Both Dublin Core 1.1 and 1.0 namespaces are accepted; 1.1 wins when an
//! element appears in both. Only direct children of the scoped node are
//! read, so item level `dc:creator` never leaks into the channel.

use std::any::Any;

use time::OffsetDateTime;

use super::{EntryExtension, FeedExtension};
use crate::date::parse_date;
use crate::document::XPathScope;
use crate::model::{Author, Category, unique};
use crate::namespaces;

pub const NAME: &str = "DublinCore";

const PREFIXES: [&str; 2] = ["dc11", "dc10"];

fn bind(scope: XPathScope) -> XPathScope {
    scope.bind("dc11", namespaces::DUBLIN_CORE_11).bind("dc10", namespaces::DUBLIN_CORE_10)
}

fn value(scope: &XPathScope, element: &str) -> Option<String> {
    PREFIXES
        .iter()
        .find_map(|prefix| scope.trimmed(&scope.path(&format!("/{}:{}", prefix, element))))
}

fn values(scope: &XPathScope, element: &str) -> Vec<String> {
    PREFIXES
        .iter()
        .map(|prefix| scope.strings(&scope.path(&format!("/{}:{}", prefix, element))))
        .find(|found| !found.is_empty())
        .unwrap_or_default()
        .into_iter()
        .map(|value| value.trim().to_string())
        .collect()
}

/// `dc:creator` names, falling back to `dc:publisher`.
fn authors(scope: &XPathScope) -> Vec<Author> {
    let mut names = values(scope, "creator");
    if names.is_empty() {
        names = values(scope, "publisher");
    }
    unique(names.into_iter().map(Author::named).collect())
}

fn categories(scope: &XPathScope) -> Vec<Category> {
    values(scope, "subject").into_iter().map(Category::term).collect()
}

fn date(scope: &XPathScope) -> Option<OffsetDateTime> {
    value(scope, "date").and_then(|date| parse_date(&date))
}

/// Dublin Core probe for an item or entry.
pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: bind(scope) }
    }

    pub fn publisher(&self) -> Option<String> {
        value(&self.scope, "publisher")
    }

    pub fn contributors(&self) -> Vec<Author> {
        values(&self.scope, "contributor").into_iter().map(Author::named).collect()
    }

    pub fn rights(&self) -> Option<String> {
        value(&self.scope, "rights")
    }
}

impl EntryExtension for Entry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn id(&self) -> Option<String> {
        value(&self.scope, "identifier")
    }

    fn title(&self) -> Option<String> {
        value(&self.scope, "title")
    }

    fn description(&self) -> Option<String> {
        value(&self.scope, "description")
    }

    fn authors(&self) -> Vec<Author> {
        authors(&self.scope)
    }

    fn categories(&self) -> Vec<Category> {
        categories(&self.scope)
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        date(&self.scope)
    }
}

/// Dublin Core probe for a channel or feed.
pub struct Feed {
    scope: XPathScope,
}

impl Feed {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: bind(scope) }
    }

    pub fn publisher(&self) -> Option<String> {
        value(&self.scope, "publisher")
    }
}

impl FeedExtension for Feed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn id(&self) -> Option<String> {
        value(&self.scope, "identifier")
    }

    fn title(&self) -> Option<String> {
        value(&self.scope, "title")
    }

    fn description(&self) -> Option<String> {
        value(&self.scope, "description")
    }

    fn authors(&self) -> Vec<Author> {
        authors(&self.scope)
    }

    fn categories(&self) -> Vec<Category> {
        categories(&self.scope)
    }

    fn copyright(&self) -> Option<String> {
        value(&self.scope, "rights")
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        date(&self.scope)
    }

    fn language(&self) -> Option<String> {
        value(&self.scope, "language")
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::document::FeedDocument;
    use crate::feed_type::FeedType;

    const RDF: &str = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
        xmlns="http://purl.org/rss/1.0/" xmlns:dc="http://purl.org/dc/elements/1.1/"
        xmlns:dc10="http://purl.org/dc/elements/1.0/">
        <channel rdf:about="http://example.com/">
          <title>Channel</title>
          <dc:publisher>Example Press</dc:publisher>
          <dc:language>en</dc:language>
          <dc:rights>CC-BY</dc:rights>
        </channel>
        <item rdf:about="http://example.com/1">
          <dc:creator>Alice</dc:creator>
          <dc:creator>Bob</dc:creator>
          <dc:creator>Alice</dc:creator>
          <dc10:creator>Carol</dc10:creator>
          <dc:subject>rust</dc:subject>
          <dc:subject>rust</dc:subject>
          <dc:date>2009-03-07T08:03:50Z</dc:date>
          <dc:identifier>urn:item:1</dc:identifier>
        </item>
        <item rdf:about="http://example.com/2">
          <dc10:title>Old namespace</dc10:title>
        </item>
    </rdf:RDF>"#;

    fn scope(prefix: &str) -> XPathScope {
        XPathScope::new(Rc::new(FeedDocument::parse(RDF).unwrap()), prefix, FeedType::Rss10)
    }

    #[test]
    fn test_entry_values() {
        let entry = Entry::new(scope("/rdf:RDF/rss:item[1]"));

        let names: Vec<_> = entry.authors().into_iter().filter_map(|a| a.name).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
        assert_eq!(entry.categories(), vec![Category::term("rust"), Category::term("rust")]);
        assert_eq!(entry.id().as_deref(), Some("urn:item:1"));
        assert!(entry.date_modified().is_some());
        assert_eq!(entry.title(), None);
    }

    #[test]
    fn test_dc10_fallback() {
        let entry = Entry::new(scope("/rdf:RDF/rss:item[2]"));
        assert_eq!(entry.title().as_deref(), Some("Old namespace"));
    }

    #[test]
    fn test_feed_publisher_as_author() {
        let feed = Feed::new(scope("/rdf:RDF/rss:channel"));

        assert_eq!(feed.authors(), vec![Author::named("Example Press")]);
        assert_eq!(feed.language().as_deref(), Some("en"));
        assert_eq!(feed.copyright().as_deref(), Some("CC-BY"));
    }
}
