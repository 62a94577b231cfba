//! Feed-link discovery in HTML pages.
//!
//! Pages advertise their feeds with `<link rel="alternate">` elements in the
//! head. [`FeedLinkSet::from_html`] collects those, resolving relative
//! `href`s against the page address.
//!
//! # Example
//!
//! ```rust
//! use feedscope_core::FeedLinkSet;
//!
//! let html = r#"<html><head>
//!     <link rel="alternate" type="application/rss+xml" href="/feed.rss" title="RSS">
//! </head></html>"#;
//! let links = FeedLinkSet::from_html(html, "http://example.com/blog/");
//!
//! assert_eq!(links.rss(), Some("http://example.com/feed.rss"));
//! assert_eq!(links.len(), 1);
//! ```

use scraper::{Html, Selector};
use serde::Serialize;
use url::Url;

use crate::error::{FeedError, Result};

const RSS_TYPE: &str = "application/rss+xml";
const ATOM_TYPE: &str = "application/atom+xml";
const RDF_TYPE: &str = "application/rdf+xml";

/// One advertised feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedLink {
    pub rel: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub href: String,
    pub title: Option<String>,
}

/// The feeds advertised by one page, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedLinkSet {
    links: Vec<FeedLink>,
    rss: Option<String>,
    atom: Option<String>,
    rdf: Option<String>,
}

impl FeedLinkSet {
    /// Collects the alternate links of `html`, resolved against `base_uri`.
    ///
    /// Links without a `type` or an `href` are ignored, as are repeated
    /// targets.
    pub fn from_html(html: &str, base_uri: &str) -> Self {
        let document = Html::parse_document(html);
        let base = Url::parse(base_uri).ok();
        let mut set = Self::default();

        let Ok(selector) = Selector::parse("link[rel]") else {
            return set;
        };

        for element in document.select(&selector) {
            let attrs = element.value();
            let is_alternate = attrs
                .attr("rel")
                .is_some_and(|rel| rel.split_whitespace().any(|token| token.eq_ignore_ascii_case("alternate")));
            let media_type = attrs.attr("type").map(str::trim).filter(|t| !t.is_empty());
            let href = attrs.attr("href").map(str::trim).filter(|h| !h.is_empty());

            let (true, Some(media_type), Some(href)) = (is_alternate, media_type, href) else {
                continue;
            };

            let title = attrs.attr("title").map(|title| title.trim().to_string()).filter(|t| !t.is_empty());
            set.push(FeedLink {
                rel: "alternate".to_string(),
                media_type: media_type.to_ascii_lowercase(),
                href: resolve(base.as_ref(), href),
                title,
            });
        }

        tracing::debug!(base_uri, links = set.len(), "discovered feed links");
        set
    }

    fn push(&mut self, link: FeedLink) {
        if self.links.iter().any(|existing| existing.href == link.href) {
            return;
        }

        let slot = match link.media_type.as_str() {
            RSS_TYPE => Some(&mut self.rss),
            ATOM_TYPE => Some(&mut self.atom),
            RDF_TYPE => Some(&mut self.rdf),
            _ => None,
        };
        if let Some(slot) = slot {
            slot.get_or_insert_with(|| link.href.clone());
        }

        self.links.push(link);
    }

    /// The first RSS feed advertised.
    pub fn rss(&self) -> Option<&str> {
        self.rss.as_deref()
    }

    /// The first Atom feed advertised.
    pub fn atom(&self) -> Option<&str> {
        self.atom.as_deref()
    }

    /// The first RDF feed advertised.
    pub fn rdf(&self) -> Option<&str> {
        self.rdf.as_deref()
    }

    pub fn links(&self) -> &[FeedLink] {
        &self.links
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeedLink> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// The links as a JSON array.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty { serde_json::to_string_pretty(&self.links) } else { serde_json::to_string(&self.links) };
        json.map_err(|e| FeedError::Serialization(e.to_string()))
    }
}

impl<'a> IntoIterator for &'a FeedLinkSet {
    type Item = &'a FeedLink;
    type IntoIter = std::slice::Iter<'a, FeedLink>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    match base.and_then(|base| base.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
    <html><head>
      <title>Blog</title>
      <link rel="stylesheet" href="/style.css" type="text/css">
      <link rel="alternate" type="application/rss+xml" href="/feed.rss" title="Posts">
      <link rel="Alternate" type="application/atom+xml" href="feed.atom">
      <link rel="alternate" type="application/rss+xml" href="http://example.com/feed.rss">
      <link rel="alternate" type="application/rss+xml" href="/comments.rss">
      <link rel="alternate" href="/untyped.xml">
      <link rel="alternate" type="application/rdf+xml" href="https://other.example.org/index.rdf">
      <link rel="alternate" type="text/html" hreflang="fr" href="/fr/">
    </head><body></body></html>"#;

    #[test]
    fn test_collects_and_resolves() {
        let set = FeedLinkSet::from_html(PAGE, "http://example.com/blog/index.html");

        let hrefs: Vec<_> = set.iter().map(|link| link.href.as_str()).collect();
        assert_eq!(
            hrefs,
            vec![
                "http://example.com/feed.rss",
                "http://example.com/blog/feed.atom",
                "http://example.com/comments.rss",
                "https://other.example.org/index.rdf",
                "http://example.com/fr/",
            ]
        );
        assert_eq!(set.links()[0].title.as_deref(), Some("Posts"));
        assert_eq!(set.links()[1].title, None);
    }

    #[test]
    fn test_first_link_per_type() {
        let set = FeedLinkSet::from_html(PAGE, "http://example.com/blog/");

        assert_eq!(set.rss(), Some("http://example.com/feed.rss"));
        assert_eq!(set.atom(), Some("http://example.com/blog/feed.atom"));
        assert_eq!(set.rdf(), Some("https://other.example.org/index.rdf"));
    }

    #[test]
    fn test_to_json() {
        let set = FeedLinkSet::from_html(PAGE, "http://example.com/");
        let value: serde_json::Value = serde_json::from_str(&set.to_json(false).unwrap()).unwrap();

        assert_eq!(value[0]["type"], "application/rss+xml");
        assert_eq!(value[0]["title"], "Posts");
        assert_eq!(value.as_array().map(Vec::len), Some(set.len()));
    }

    #[test]
    fn test_no_links() {
        let set = FeedLinkSet::from_html("<p>nothing here", "http://example.com/");
        assert!(set.is_empty());
        assert_eq!(set.rss(), None);
    }

    #[test]
    fn test_unparseable_base_keeps_href() {
        let set = FeedLinkSet::from_html(PAGE, "not a uri");
        assert_eq!(set.rss(), Some("/feed.rss"));
    }
}
