//! Security-hardened XML loading and namespace-aware XPath evaluation.
//!
//! A [`FeedDocument`] owns the parsed tree of one imported feed. Facades never
//! hold DOM nodes directly; they hold an [`XPathScope`], which pairs the shared
//! document with an XPath prefix addressing the wrapped node and the namespace
//! bindings used to evaluate relative queries.
//!
//! # Example
//!
//! ```rust
//! use feedscope_core::FeedDocument;
//!
//! let doc = FeedDocument::parse("<rss version=\"2.0\"><channel><title>T</title></channel></rss>").unwrap();
//! assert_eq!(doc.encoding(), "UTF-8");
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use sxd_document::dom::{ChildOfElement, Element, ParentOfChild};
use sxd_document::{Package, parser};
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Factory, Value, XPath};
use url::Url;

use crate::error::{FeedError, Result};
use crate::feed_type::FeedType;
use crate::namespaces;

static ENCODING_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^<\?xml[^>]*?\sencoding\s*=\s*["']([A-Za-z][A-Za-z0-9._-]*)["']"#).unwrap());

/// A parsed feed document.
///
/// The tree is loaded once and only read afterwards. Compiled XPath
/// expressions are cached by their source text.
pub struct FeedDocument {
    package: Package,
    encoding: Option<String>,
    factory: Factory,
    compiled: RefCell<HashMap<String, Rc<XPath>>>,
}

impl FeedDocument {
    /// Loads an XML document from text.
    ///
    /// DOCTYPE declarations are rejected before the parser sees the input, so
    /// no entity declaration is ever expanded.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidInput`] for empty input or a DOCTYPE, and
    /// [`FeedError::Parse`] when the XML is not well formed.
    pub fn parse(xml: &str) -> Result<Self> {
        let xml = xml.trim_start_matches('\u{feff}').trim_start();
        if xml.is_empty() {
            return Err(FeedError::InvalidInput("Document is empty".to_string()));
        }

        reject_doctype(xml)?;

        let encoding = ENCODING_DECL.captures(xml).map(|caps| caps[1].to_string());
        let package = parser::parse(xml).map_err(|e| FeedError::Parse(e.to_string()))?;

        Ok(Self { package, encoding, factory: Factory::new(), compiled: RefCell::new(HashMap::new()) })
    }

    /// The encoding declared by the XML declaration, `UTF-8` when absent.
    pub fn encoding(&self) -> &str {
        self.encoding.as_deref().unwrap_or("UTF-8")
    }

    fn compile(&self, expr: &str) -> Result<Rc<XPath>> {
        if let Some(xpath) = self.compiled.borrow().get(expr) {
            return Ok(Rc::clone(xpath));
        }

        let xpath = self
            .factory
            .build(expr)
            .map_err(|e| FeedError::XPath(format!("Invalid XPath '{}': {}", expr, e)))?
            .ok_or_else(|| FeedError::XPath(format!("Invalid XPath: {}", expr)))?;
        let xpath = Rc::new(xpath);

        self.compiled.borrow_mut().insert(expr.to_string(), Rc::clone(&xpath));
        Ok(xpath)
    }

    /// Evaluates an expression from the document root and hands the matched
    /// nodes, in document order, to `f`.
    pub fn with_nodes<T>(&self, expr: &str, bindings: &[(&str, &str)], f: impl FnOnce(Vec<Node<'_>>) -> T) -> Result<T> {
        let xpath = self.compile(expr)?;
        let document = self.package.as_document();

        let mut context = Context::new();
        for (prefix, uri) in bindings {
            context.set_namespace(prefix, uri);
        }

        let nodes = match xpath.evaluate(&context, document.root())? {
            Value::Nodeset(nodeset) => nodeset.document_order(),
            _ => Vec::new(),
        };

        Ok(f(nodes))
    }

    /// Returns true when the expression selects at least one node.
    pub fn exists(&self, expr: &str, bindings: &[(&str, &str)]) -> Result<bool> {
        self.with_nodes(expr, bindings, |nodes| !nodes.is_empty())
    }

    /// Local name and namespace of the document element.
    pub fn root_name(&self) -> Option<(String, Option<String>)> {
        let document = self.package.as_document();
        document.root().children().into_iter().find_map(|child| {
            child.element().map(|element| {
                let name = element.name();
                (name.local_part().to_string(), name.namespace_uri().map(str::to_string))
            })
        })
    }
}

impl fmt::Debug for FeedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedDocument")
            .field("encoding", &self.encoding())
            .field("root", &self.root_name())
            .finish()
    }
}

/// Fails when the prolog carries a DOCTYPE declaration.
fn reject_doctype(xml: &str) -> Result<()> {
    let mut rest = xml;

    loop {
        rest = rest.trim_start();

        let skip_to = if rest.starts_with("<?") {
            rest.find("?>").map(|end| end + 2)
        } else if rest.starts_with("<!--") {
            rest.find("-->").map(|end| end + 3)
        } else if rest.get(..9).is_some_and(|head| head.eq_ignore_ascii_case("<!doctype")) {
            return Err(FeedError::InvalidInput(
                "Invalid XML: Detected use of illegal DOCTYPE".to_string(),
            ));
        } else {
            None
        };

        match skip_to {
            Some(offset) => rest = &rest[offset..],
            None => return Ok(()),
        }
    }
}

/// Namespace bindings every scope starts with, chosen by feed type.
fn base_bindings(feed_type: FeedType) -> Vec<(&'static str, &'static str)> {
    let atom = if feed_type == FeedType::Atom03 { namespaces::ATOM_03 } else { namespaces::ATOM_10 };
    let rss = if feed_type == FeedType::Rss090 { namespaces::RSS_090 } else { namespaces::RSS_10 };

    vec![("atom", atom), ("rss", rss), ("rdf", namespaces::RDF), ("xml", namespaces::XML)]
}

/// A read-only view of one node of a [`FeedDocument`].
///
/// The prefix is an absolute XPath location path that uniquely addresses the
/// wrapped node, e.g. `/rss/channel/item[3]`. Relative queries are built by
/// appending to it with [`XPathScope::path`].
#[derive(Clone)]
pub struct XPathScope {
    document: Rc<FeedDocument>,
    prefix: String,
    feed_type: FeedType,
    bindings: Vec<(&'static str, &'static str)>,
}

impl XPathScope {
    pub fn new(document: Rc<FeedDocument>, prefix: impl Into<String>, feed_type: FeedType) -> Self {
        Self { document, prefix: prefix.into(), feed_type, bindings: base_bindings(feed_type) }
    }

    /// Adds or replaces a namespace binding.
    pub fn bind(mut self, prefix: &'static str, uri: &'static str) -> Self {
        match self.bindings.iter_mut().find(|(p, _)| *p == prefix) {
            Some(binding) => binding.1 = uri,
            None => self.bindings.push((prefix, uri)),
        }
        self
    }

    /// A scope over another node of the same document with the same bindings.
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            document: Rc::clone(&self.document),
            prefix: prefix.into(),
            feed_type: self.feed_type,
            bindings: self.bindings.clone(),
        }
    }

    pub fn document(&self) -> &Rc<FeedDocument> {
        &self.document
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn feed_type(&self) -> FeedType {
        self.feed_type
    }

    pub fn bindings(&self) -> &[(&'static str, &'static str)] {
        &self.bindings
    }

    /// Appends a relative location path to the scope prefix.
    pub fn path(&self, relative: &str) -> String {
        format!("{}{}", self.prefix, relative)
    }

    fn query<T: Default>(&self, expr: &str, f: impl FnOnce(Vec<Node<'_>>) -> T) -> T {
        match self.document.with_nodes(expr, &self.bindings, f) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(expr, error = %e, "XPath query failed");
                T::default()
            }
        }
    }

    /// String value of the first matching node, `None` when it is blank.
    pub fn string(&self, expr: &str) -> Option<String> {
        self.query(expr, |nodes| nodes.first().map(|node| node.string_value()))
            .filter(|value| !value.trim().is_empty())
    }

    /// Trimmed string value of the first matching node.
    pub fn trimmed(&self, expr: &str) -> Option<String> {
        self.string(expr).map(|value| value.trim().to_string())
    }

    /// String values of all matching nodes, blank ones skipped.
    pub fn strings(&self, expr: &str) -> Vec<String> {
        self.query(expr, |nodes| {
            nodes
                .iter()
                .map(|node| node.string_value())
                .filter(|value| !value.trim().is_empty())
                .collect()
        })
    }

    pub fn count(&self, expr: &str) -> usize {
        self.query(expr, |nodes| nodes.len())
    }

    pub fn exists(&self, expr: &str) -> bool {
        self.count(expr) > 0
    }

    /// Maps every matching element through `f`, keeping the `Some` results.
    pub fn elements<T>(&self, expr: &str, mut f: impl FnMut(Element<'_>) -> Option<T>) -> Vec<T> {
        self.query(expr, |nodes| {
            nodes
                .into_iter()
                .filter_map(|node| match node {
                    Node::Element(element) => f(element),
                    _ => None,
                })
                .collect()
        })
    }

    /// Maps the first matching element through `f`.
    pub fn first_element<T>(&self, expr: &str, f: impl FnOnce(Element<'_>) -> Option<T>) -> Option<T> {
        self.query(expr, |nodes| {
            nodes.into_iter().find_map(|node| match node {
                Node::Element(element) => Some(element),
                _ => None,
            })
            .and_then(f)
        })
    }

    /// Resolves the effective `xml:base` of the scoped node.
    ///
    /// Bases declared on ancestors are applied from the outermost inwards, so
    /// a relative base on an entry resolves against the feed's base.
    pub fn base_url(&self) -> Option<String> {
        let bases = self.query(&self.prefix, |nodes| match nodes.first() {
            Some(Node::Element(element)) => xml_bases(*element),
            _ => Vec::new(),
        });

        let mut resolved: Option<Url> = None;
        for base in bases.iter().rev() {
            resolved = match resolved {
                Some(parent) => parent.join(base).ok().or(Some(parent)),
                None => Url::parse(base).ok(),
            };
        }

        resolved.map(String::from).or_else(|| bases.first().cloned())
    }

    /// Resolves a possibly relative URI against the scope's `xml:base`.
    pub fn absolutise(&self, link: &str) -> String {
        let link = link.trim();
        if Url::parse(link).is_ok() {
            return link.to_string();
        }

        self.base_url()
            .and_then(|base| Url::parse(&base).ok())
            .and_then(|base| base.join(link).ok())
            .map(String::from)
            .unwrap_or_else(|| link.to_string())
    }
}

impl fmt::Debug for XPathScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XPathScope")
            .field("prefix", &self.prefix)
            .field("feed_type", &self.feed_type)
            .finish()
    }
}

/// `xml:base` values from the element outwards.
fn xml_bases(element: Element<'_>) -> Vec<String> {
    let mut bases = Vec::new();
    let mut current = Some(element);

    while let Some(element) = current {
        if let Some(base) = element.attribute_value((namespaces::XML, "base"))
            && !base.trim().is_empty()
        {
            bases.push(base.trim().to_string());
        }
        current = match element.parent() {
            Some(ParentOfChild::Element(parent)) => Some(parent),
            _ => None,
        };
    }

    bases
}

/// Non-blank attribute value.
pub fn attribute(element: Element<'_>, name: &str) -> Option<String> {
    element
        .attribute_value(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Text content of the first child element with the given name.
pub fn child_text(element: Element<'_>, namespace: Option<&str>, local: &str) -> Option<String> {
    element
        .children()
        .into_iter()
        .filter_map(|child| child.element())
        .find(|child| child.name().local_part() == local && child.name().namespace_uri() == namespace)
        .map(|child| text_content(child).trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Concatenated text of all descendant text nodes.
pub fn text_content(element: Element<'_>) -> String {
    Node::Element(element).string_value()
}

/// Serializes the children of an element as markup without namespace
/// prefixes.
pub fn inner_markup(element: Element<'_>) -> String {
    let mut out = String::new();
    for child in element.children() {
        write_child(&mut out, child);
    }
    out
}

fn write_child(out: &mut String, child: ChildOfElement<'_>) {
    match child {
        ChildOfElement::Element(element) => {
            let name = element.name().local_part();
            out.push('<');
            out.push_str(name);
            for attr in element.attributes() {
                if attr.name().namespace_uri() == Some(namespaces::XML) {
                    continue;
                }
                out.push(' ');
                out.push_str(attr.name().local_part());
                out.push_str("=\"");
                out.push_str(&escape(attr.value(), true));
                out.push('"');
            }

            let children = element.children();
            if children.is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for child in children {
                    write_child(out, child);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
        }
        ChildOfElement::Text(text) => out.push_str(&escape(text.text(), false)),
        _ => {}
    }
}

fn escape(value: &str, attribute: bool) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
