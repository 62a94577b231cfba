//! Feed dialect classification.
//!
//! [`FeedType::detect`] probes a loaded document in a fixed order: the `rss`
//! root element and its `version` attribute, then an RDF root carrying RSS 1.0
//! or RSS 0.90 children, then the Atom 1.0 and Atom 0.3 namespaces. The first
//! probe that matches decides the type.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::document::FeedDocument;
use crate::error::{FeedError, Result};
use crate::namespaces;

/// The recognized feed dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FeedType {
    #[serde(rename = "rss-090")]
    Rss090,
    #[serde(rename = "rss-091")]
    Rss091,
    #[serde(rename = "rss-091n")]
    Rss091Netscape,
    #[serde(rename = "rss-091u")]
    Rss091Userland,
    #[serde(rename = "rss-092")]
    Rss092,
    #[serde(rename = "rss-093")]
    Rss093,
    #[serde(rename = "rss-094")]
    Rss094,
    #[serde(rename = "rss-10")]
    Rss10,
    #[serde(rename = "rss-20")]
    Rss20,
    #[serde(rename = "rss-any")]
    RssAny,
    #[serde(rename = "atom-03")]
    Atom03,
    #[serde(rename = "atom-10")]
    Atom10,
    #[serde(rename = "atom-10-entry")]
    Atom10Entry,
    #[serde(rename = "any")]
    Any,
}

const ALL: [FeedType; 14] = [
    FeedType::Rss090,
    FeedType::Rss091,
    FeedType::Rss091Netscape,
    FeedType::Rss091Userland,
    FeedType::Rss092,
    FeedType::Rss093,
    FeedType::Rss094,
    FeedType::Rss10,
    FeedType::Rss20,
    FeedType::RssAny,
    FeedType::Atom03,
    FeedType::Atom10,
    FeedType::Atom10Entry,
    FeedType::Any,
];

const RDF_CHILDREN: [&str; 4] = ["channel", "image", "item", "textinput"];

impl FeedType {
    /// The dialect code, e.g. `rss-20` or `atom-10-entry`.
    pub fn code(self) -> &'static str {
        match self {
            FeedType::Rss090 => "rss-090",
            FeedType::Rss091 => "rss-091",
            FeedType::Rss091Netscape => "rss-091n",
            FeedType::Rss091Userland => "rss-091u",
            FeedType::Rss092 => "rss-092",
            FeedType::Rss093 => "rss-093",
            FeedType::Rss094 => "rss-094",
            FeedType::Rss10 => "rss-10",
            FeedType::Rss20 => "rss-20",
            FeedType::RssAny => "rss-any",
            FeedType::Atom03 => "atom-03",
            FeedType::Atom10 => "atom-10",
            FeedType::Atom10Entry => "atom-10-entry",
            FeedType::Any => "any",
        }
    }

    pub fn all() -> &'static [FeedType] {
        &ALL
    }

    pub fn is_rss(self) -> bool {
        self.code().starts_with("rss")
    }

    pub fn is_atom(self) -> bool {
        self.code().starts_with("atom")
    }

    /// RDF based dialects: RSS 1.0 and RSS 0.90.
    pub fn is_rdf(self) -> bool {
        matches!(self, FeedType::Rss10 | FeedType::Rss090)
    }

    /// Absolute XPath of the channel (or feed) element for this dialect.
    pub fn channel_path(self) -> &'static str {
        if self.is_rdf() {
            "/rdf:RDF/rss:channel"
        } else if self.is_atom() {
            "/atom:feed"
        } else {
            "/rss/channel"
        }
    }

    /// Absolute XPath of the item (or entry) elements for this dialect.
    pub fn item_path(self) -> &'static str {
        if self.is_rdf() {
            "/rdf:RDF/rss:item"
        } else if self.is_atom() {
            "/atom:feed/atom:entry"
        } else {
            "/rss/channel/item"
        }
    }

    /// Classifies a loaded document.
    ///
    /// With `spec_only`, a standalone Atom entry document is reported as
    /// `atom-10` rather than `atom-10-entry`.
    pub fn detect(doc: &FeedDocument, spec_only: bool) -> FeedType {
        let feed_type = probe(doc, spec_only);
        tracing::debug!(feed_type = feed_type.code(), "detected feed type");
        feed_type
    }
}

fn probe(doc: &FeedDocument, spec_only: bool) -> FeedType {
    let exists = |expr: &str, bindings: &[(&str, &str)]| doc.exists(expr, bindings).unwrap_or(false);

    if exists("/rss", &[]) {
        let version = doc
            .with_nodes("/rss/@version", &[], |nodes| nodes.first().map(|node| node.string_value()))
            .ok()
            .flatten();

        return match version.as_deref() {
            Some("2.0") => FeedType::Rss20,
            Some("0.94") => FeedType::Rss094,
            Some("0.93") => FeedType::Rss093,
            Some("0.92") => FeedType::Rss092,
            Some("0.91") => FeedType::Rss091,
            _ => FeedType::RssAny,
        };
    }

    if exists("/rdf:RDF", &[("rdf", namespaces::RDF)]) {
        for (rss_ns, feed_type) in [(namespaces::RSS_10, FeedType::Rss10), (namespaces::RSS_090, FeedType::Rss090)] {
            let bindings = [("rdf", namespaces::RDF), ("rss", rss_ns)];
            if RDF_CHILDREN
                .iter()
                .any(|child| exists(&format!("/rdf:RDF/rss:{}", child), &bindings))
            {
                return feed_type;
            }
        }
    }

    let atom10 = [("atom", namespaces::ATOM_10)];
    if exists("//atom:feed", &atom10) {
        return FeedType::Atom10;
    }
    if exists("//atom:entry", &atom10) {
        return if spec_only { FeedType::Atom10 } else { FeedType::Atom10Entry };
    }

    if exists("//atom:feed", &[("atom", namespaces::ATOM_03)]) {
        return FeedType::Atom03;
    }

    FeedType::Any
}

/// Loads `xml` and classifies it.
///
/// # Errors
///
/// Returns [`FeedError::InvalidInput`] for empty input or a DOCTYPE and
/// [`FeedError::Parse`] for malformed XML.
pub fn detect_type(xml: &str, spec_only: bool) -> Result<FeedType> {
    let doc = FeedDocument::parse(xml)?;
    Ok(FeedType::detect(&doc, spec_only))
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FeedType {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        ALL.iter()
            .copied()
            .find(|feed_type| feed_type.code() == s)
            .ok_or_else(|| FeedError::InvalidInput(format!("Unknown feed type: {}", s)))
    }
}
