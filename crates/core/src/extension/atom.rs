//! Atom vocabulary probes.
//!
//! These serve two purposes: they are the native accessors of the Atom
//! facades, and they pick up `atom:*` elements embedded in RSS channels and
//! items (self links, hubs, replies links). The `atom` prefix is bound to the
//! 1.0 or 0.3 namespace by the scope, so the same queries cover both
//! versions; 0.3 only element names (`tagline`, `modified`, `issued`...) are
//! tried after their 1.0 counterparts.

use std::any::Any;

use sxd_document::dom::Element;
use time::OffsetDateTime;

use super::{EntryExtension, FeedExtension, parse_count};
use crate::date::parse_date;
use crate::document::{XPathScope, attribute, child_text, inner_markup, text_content};
use crate::feed_type::FeedType;
use crate::model::{Author, Category, Enclosure, Image};
use crate::namespaces;

pub const NAME: &str = "Atom";

const COMMENT_FEED_TYPES: [&str; 2] = ["application/atom+xml", "application/rss+xml"];

fn atom_namespace(scope: &XPathScope) -> &'static str {
    if scope.feed_type() == FeedType::Atom03 { namespaces::ATOM_03 } else { namespaces::ATOM_10 }
}

/// Reads an Atom text construct (`title`, `summary`, `content`...).
///
/// `xhtml` content is the markup inside the wrapping `div`; `text` and
/// `html` are the element's text, entity references already resolved.
fn text_construct(scope: &XPathScope, relative: &str) -> Option<String> {
    scope
        .first_element(&scope.path(relative), |element| {
            let kind = attribute(element, "type").unwrap_or_else(|| "text".to_string());
            let value = if kind.contains("xhtml") {
                xhtml_div(element).map(inner_markup).unwrap_or_else(|| inner_markup(element))
            } else {
                text_content(element)
            };
            Some(value.trim().to_string())
        })
        .filter(|value| !value.is_empty())
}

fn xhtml_div(element: Element<'_>) -> Option<Element<'_>> {
    element.children().into_iter().filter_map(|child| child.element()).find(|child| {
        child.name().local_part() == "div" && child.name().namespace_uri() == Some(namespaces::XHTML)
    })
}

fn people(scope: &XPathScope, relative: &str) -> Vec<Author> {
    let ns = atom_namespace(scope);
    let authors = scope.elements(&scope.path(relative), |element| {
        let author = Author {
            name: child_text(element, Some(ns), "name"),
            email: child_text(element, Some(ns), "email"),
            uri: child_text(element, Some(ns), "uri").or_else(|| child_text(element, Some(ns), "url")),
        };
        (!author.is_empty()).then_some(author)
    });
    crate::model::unique(authors)
}

fn categories(scope: &XPathScope) -> Vec<Category> {
    scope.elements(&scope.path("/atom:category"), |element| {
        let term = attribute(element, "term")?;
        Some(Category::new(term, attribute(element, "scheme"), attribute(element, "label")))
    })
}

fn first_date(scope: &XPathScope, names: &[&str]) -> Option<OffsetDateTime> {
    names
        .iter()
        .find_map(|name| scope.trimmed(&scope.path(&format!("/atom:{}", name))))
        .and_then(|value| parse_date(&value))
}

/// `href` values of the links selected by `predicate`, resolved against
/// `xml:base`.
fn link_hrefs(scope: &XPathScope, predicate: &str) -> Vec<String> {
    scope
        .elements(&scope.path(&format!("/atom:link[{}]", predicate)), |element| attribute(element, "href"))
        .into_iter()
        .map(|href| scope.absolutise(&href))
        .collect()
}

const ALTERNATE: &str = "@rel='alternate' or not(@rel)";

/// Atom probe for an entry (or an RSS item carrying `atom:*` children).
pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: scope.bind("thr", namespaces::THREAD).bind("xhtml", namespaces::XHTML) }
    }

    pub fn scope(&self) -> &XPathScope {
        &self.scope
    }

    /// The declared `type` of `atom:content`, `text` when unspecified.
    pub fn content_type(&self) -> Option<String> {
        self.scope.first_element(&self.scope.path("/atom:content"), |element| {
            Some(attribute(element, "type").unwrap_or_else(|| "text".to_string()))
        })
    }

    pub fn contributors(&self) -> Vec<Author> {
        people(&self.scope, "/atom:contributor")
    }

    /// Whether the entry carries an `atom:source` element.
    pub fn has_source(&self) -> bool {
        self.scope.exists(&self.scope.path("/atom:source"))
    }

    fn replies(&self) -> Vec<(String, Option<String>, Option<u64>)> {
        self.scope.elements(&self.scope.path("/atom:link[@rel='replies']"), |element| {
            let href = attribute(element, "href")?;
            let count = parse_count(element.attribute_value((namespaces::THREAD, "count")).map(str::to_string));
            Some((self.scope.absolutise(&href), attribute(element, "type"), count))
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

    fn id(&self) -> Option<String> {
        self.scope.trimmed(&self.scope.path("/atom:id"))
    }

    fn title(&self) -> Option<String> {
        text_construct(&self.scope, "/atom:title")
    }

    fn description(&self) -> Option<String> {
        text_construct(&self.scope, "/atom:summary")
    }

    fn content(&self) -> Option<String> {
        text_construct(&self.scope, "/atom:content")
    }

    fn authors(&self) -> Vec<Author> {
        people(&self.scope, "/atom:author")
    }

    fn categories(&self) -> Vec<Category> {
        categories(&self.scope)
    }

    fn date_created(&self) -> Option<OffsetDateTime> {
        first_date(&self.scope, &["published", "created", "issued"])
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        first_date(&self.scope, &["updated", "modified"])
    }

    fn links(&self) -> Vec<String> {
        link_hrefs(&self.scope, ALTERNATE)
    }

    fn enclosure(&self) -> Option<Enclosure> {
        self.scope.first_element(&self.scope.path("/atom:link[@rel='enclosure']"), |element| {
            Some(Enclosure {
                url: self.scope.absolutise(&attribute(element, "href")?),
                length: parse_count(attribute(element, "length")),
                media_type: attribute(element, "type"),
            })
        })
    }

    fn comment_count(&self) -> Option<u64> {
        self.replies().into_iter().find_map(|(_, _, count)| count)
    }

    fn comment_link(&self) -> Option<String> {
        self.replies()
            .into_iter()
            .find(|(_, media_type, _)| media_type.as_deref() == Some("text/html"))
            .map(|(href, _, _)| href)
    }

    fn comment_feed_link(&self) -> Option<String> {
        self.replies()
            .into_iter()
            .find(|(_, media_type, _)| media_type.as_deref().is_some_and(|t| COMMENT_FEED_TYPES.contains(&t)))
            .map(|(href, _, _)| href)
    }
}

/// Atom probe for a feed, a `source` element, or an RSS channel.
pub struct Feed {
    scope: XPathScope,
}

impl Feed {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: scope.bind("xhtml", namespaces::XHTML) }
    }

    pub fn scope(&self) -> &XPathScope {
        &self.scope
    }

    /// The `atom:icon` URI.
    pub fn icon(&self) -> Option<String> {
        self.scope.trimmed(&self.scope.path("/atom:icon")).map(|icon| self.scope.absolutise(&icon))
    }

    pub fn contributors(&self) -> Vec<Author> {
        people(&self.scope, "/atom:contributor")
    }

    /// Every alternate link of the feed.
    pub fn links(&self) -> Vec<String> {
        link_hrefs(&self.scope, ALTERNATE)
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
        self.scope.trimmed(&self.scope.path("/atom:id"))
    }

    fn title(&self) -> Option<String> {
        text_construct(&self.scope, "/atom:title")
    }

    fn description(&self) -> Option<String> {
        text_construct(&self.scope, "/atom:subtitle").or_else(|| text_construct(&self.scope, "/atom:tagline"))
    }

    fn authors(&self) -> Vec<Author> {
        people(&self.scope, "/atom:author")
    }

    fn categories(&self) -> Vec<Category> {
        categories(&self.scope)
    }

    fn copyright(&self) -> Option<String> {
        text_construct(&self.scope, "/atom:rights").or_else(|| text_construct(&self.scope, "/atom:copyright"))
    }

    fn date_created(&self) -> Option<OffsetDateTime> {
        first_date(&self.scope, &["published", "created"])
    }

    fn date_modified(&self) -> Option<OffsetDateTime> {
        first_date(&self.scope, &["updated", "modified"])
    }

    fn generator(&self) -> Option<String> {
        self.scope.trimmed(&self.scope.path("/atom:generator"))
    }

    fn image(&self) -> Option<Image> {
        let logo = self.scope.trimmed(&self.scope.path("/atom:logo"))?;
        Some(Image { uri: self.scope.absolutise(&logo), ..Default::default() })
    }

    /// The nearest `xml:lang` on the node or one of its ancestors.
    fn language(&self) -> Option<String> {
        self.scope
            .strings(&self.scope.path("/ancestor-or-self::*/@xml:lang"))
            .pop()
            .map(|lang| lang.trim().to_string())
    }

    fn link(&self) -> Option<String> {
        self.links().into_iter().next()
    }

    fn feed_link(&self) -> Option<String> {
        link_hrefs(&self.scope, "@rel='self'").into_iter().next()
    }

    fn hubs(&self) -> Vec<String> {
        let hubs = self.scope.strings("//atom:link[@rel='hub']/@href");
        crate::model::unique(hubs.into_iter().map(|hub| hub.trim().to_string()).collect())
    }
}
