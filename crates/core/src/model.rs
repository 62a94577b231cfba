//! Value records produced by feed and entry accessors.
//!
//! These are plain data: each accessor call builds them fresh from the
//! document, so two calls on the same facade always compare equal.

use serde::Serialize;
use std::sync::LazyLock;

use regex::Regex;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S*@[^ ]*").unwrap());
static PARENTHESISED_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\((.*)\)$").unwrap());

/// A person associated with a feed or an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Author {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl Author {
    /// An author known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), ..Default::default() }
    }

    /// Parses the RSS `author` convention: `email@example.com (Full Name)`.
    ///
    /// Values without an email address are not authors in RSS terms and
    /// yield `None`.
    pub fn from_rss(value: &str) -> Option<Self> {
        let value = value.trim();
        let email = EMAIL.find(value)?.as_str().trim().to_string();
        let name = PARENTHESISED_NAME.captures(value).map(|caps| caps[1].trim().to_string());

        Some(Self { name, email: Some(email), uri: None })
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.uri.is_none()
    }
}

/// A category or tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    pub label: String,
}

impl Category {
    /// Builds a category; the label falls back to the term.
    pub fn new(term: impl Into<String>, scheme: Option<String>, label: Option<String>) -> Self {
        let term = term.into();
        let label = label.filter(|label| !label.trim().is_empty()).unwrap_or_else(|| term.clone());
        Self { term, scheme: scheme.filter(|scheme| !scheme.trim().is_empty()), label }
    }

    pub fn term(term: impl Into<String>) -> Self {
        Self::new(term, None, None)
    }
}

/// A media enclosure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enclosure {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

/// A channel image or logo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Image {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// Removes later duplicates while keeping insertion order.
pub(crate) fn unique<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rss_author_parsing() {
        let author = Author::from_rss("joe@example.com (Joe Bloggs)").unwrap();
        assert_eq!(author.email.as_deref(), Some("joe@example.com"));
        assert_eq!(author.name.as_deref(), Some("Joe Bloggs"));

        let author = Author::from_rss("joe@example.com").unwrap();
        assert_eq!(author.name, None);

        assert_eq!(Author::from_rss("Joe Bloggs"), None);
    }

    #[test]
    fn test_category_label_defaults_to_term() {
        let category = Category::new("rust", Some(String::new()), None);
        assert_eq!(category.label, "rust");
        assert_eq!(category.scheme, None);

        let category = Category::new("rust", Some("http://x/".to_string()), Some("Rust".to_string()));
        assert_eq!(category.label, "Rust");
        assert_eq!(category.scheme.as_deref(), Some("http://x/"));
    }

    #[test]
    fn test_unique_keeps_order() {
        assert_eq!(unique(vec![1, 2, 1, 3, 2]), vec![1, 2, 3]);
    }
}
