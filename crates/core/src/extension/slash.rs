//! Slash module: comment counts and Slashdot style section metadata.

use std::any::Any;

use super::{EntryExtension, parse_count};
use crate::document::XPathScope;
use crate::namespaces;

pub const NAME: &str = "Slash";

pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: scope.bind("slash", namespaces::SLASH) }
    }

    pub fn section(&self) -> Option<String> {
        self.scope.trimmed(&self.scope.path("/slash:section"))
    }

    pub fn department(&self) -> Option<String> {
        self.scope.trimmed(&self.scope.path("/slash:department"))
    }

    /// Comment counts per thread level, from `slash:hit_parade`.
    pub fn hit_parade(&self) -> Vec<u64> {
        self.scope
            .trimmed(&self.scope.path("/slash:hit_parade"))
            .map(|parade| parade.split(',').filter_map(|hits| hits.trim().parse().ok()).collect())
            .unwrap_or_default()
    }
}

impl EntryExtension for Entry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn comment_count(&self) -> Option<u64> {
        parse_count(self.scope.trimmed(&self.scope.path("/slash:comments")))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::document::FeedDocument;
    use crate::feed_type::FeedType;

    #[test]
    fn test_slash_fields() {
        let xml = r#"<rss version="2.0" xmlns:slash="http://purl.org/rss/1.0/modules/slash/"><channel><item>
            <slash:section>news</slash:section>
            <slash:department>rust-is-fun</slash:department>
            <slash:comments>321</slash:comments>
            <slash:hit_parade>321,300,120,50,20,5,1</slash:hit_parade>
            </item></channel></rss>"#;
        let scope = XPathScope::new(Rc::new(FeedDocument::parse(xml).unwrap()), "/rss/channel/item[1]", FeedType::Rss20);
        let entry = Entry::new(scope);

        assert_eq!(entry.comment_count(), Some(321));
        assert_eq!(entry.section().as_deref(), Some("news"));
        assert_eq!(entry.department().as_deref(), Some("rust-is-fun"));
        assert_eq!(entry.hit_parade(), vec![321, 300, 120, 50, 20, 5, 1]);
    }
}
