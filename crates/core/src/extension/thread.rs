//! Atom threading extension (RFC 4685): `thr:total` and `thr:in-reply-to`.

use std::any::Any;

use serde::Serialize;

use super::{EntryExtension, parse_count};
use crate::document::{XPathScope, attribute};
use crate::namespaces;

pub const NAME: &str = "Thread";

/// A `thr:in-reply-to` reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InReplyTo {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: scope.bind("thr", namespaces::THREAD) }
    }

    pub fn in_reply_to(&self) -> Vec<InReplyTo> {
        self.scope.elements(&self.scope.path("/thr:in-reply-to"), |element| {
            Some(InReplyTo {
                reference: attribute(element, "ref")?,
                href: attribute(element, "href"),
                media_type: attribute(element, "type"),
                source: attribute(element, "source"),
            })
        })
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
        parse_count(self.scope.trimmed(&self.scope.path("/thr:total")))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::document::FeedDocument;
    use crate::feed_type::FeedType;

    #[test]
    fn test_thread_fields() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:thr="http://purl.org/syndication/thread/1.0">
            <entry><id>2</id><thr:total>321</thr:total>
            <thr:in-reply-to ref="tag:example.com,2009:1" href="http://example.com/1" type="text/html"/>
            <thr:in-reply-to href="http://example.com/no-ref"/>
            </entry></feed>"#;
        let scope =
            XPathScope::new(Rc::new(FeedDocument::parse(xml).unwrap()), "/atom:feed/atom:entry[1]", FeedType::Atom10);
        let entry = Entry::new(scope);

        assert_eq!(entry.comment_count(), Some(321));
        let replies = entry.in_reply_to();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].reference, "tag:example.com,2009:1");
        assert_eq!(replies[0].media_type.as_deref(), Some("text/html"));
    }
}
