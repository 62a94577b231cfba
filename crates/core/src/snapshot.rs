//! Owned, serializable copies of feeds and entries.
//!
//! Facades are lazy views over a shared document and cannot leave the thread
//! that created them. A snapshot evaluates every accessor once and keeps the
//! values, ready for JSON or plain-text output.

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{FeedError, Result};
use crate::facade::{Entry, Feed};
use crate::model::{Author, Category, Enclosure, Image};

/// Every accessor value of one feed, plus its entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    #[serde(rename = "type")]
    pub feed_type: String,
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub feed_link: Option<String>,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    pub copyright: Option<String>,
    pub generator: Option<String>,
    pub language: Option<String>,
    /// RFC 3339
    pub date_created: Option<String>,
    /// RFC 3339
    pub date_modified: Option<String>,
    pub image: Option<Image>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hubs: Vec<String>,
    pub entries: Vec<EntrySnapshot>,
}

/// Every accessor value of one entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub permalink: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    pub authors: Vec<Author>,
    pub categories: Vec<Category>,
    pub date_created: Option<String>,
    pub date_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosure: Option<Enclosure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_feed_link: Option<String>,
}

impl FeedSnapshot {
    /// Evaluates `feed` and, when `with_entries` is set, each of its entries.
    pub fn capture(feed: &dyn Feed, with_entries: bool) -> Self {
        let entries = if with_entries { feed.entries().map(EntrySnapshot::capture).collect() } else { Vec::new() };

        Self {
            feed_type: feed.feed_type().code().to_string(),
            id: feed.id(),
            title: feed.title(),
            description: feed.description(),
            link: feed.link(),
            feed_link: feed.feed_link(),
            authors: feed.authors().unwrap_or_default(),
            categories: feed.categories(),
            copyright: feed.copyright(),
            generator: feed.generator(),
            language: feed.language(),
            date_created: rfc3339(feed.date_created()),
            date_modified: rfc3339(feed.date_modified()),
            image: feed.image(),
            hubs: feed.hubs(),
            entries,
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        to_json(self, pretty)
    }

    /// A plain-text listing: a title header, feed fields, then one block per
    /// entry.
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        let title = self.title.as_deref().unwrap_or("(untitled feed)");
        output.push_str(title);
        output.push('\n');
        output.push_str(&"=".repeat(title.chars().count()));
        output.push('\n');

        field(&mut output, "Type", Some(self.feed_type.as_str()));
        field(&mut output, "Link", self.link.as_deref());
        field(&mut output, "Feed", self.feed_link.as_deref());
        field(&mut output, "Updated", self.date_modified.as_deref());
        let authors = names(&self.authors);
        field(&mut output, "Authors", (!authors.is_empty()).then_some(authors.as_str()));
        if let Some(description) = &self.description {
            output.push('\n');
            output.push_str(&html_to_text(description));
            output.push('\n');
        }

        for entry in &self.entries {
            output.push('\n');
            output.push_str(&entry.to_text());
        }

        output.trim_end().to_string()
    }
}

impl EntrySnapshot {
    pub fn capture(entry: &dyn Entry) -> Self {
        Self {
            id: entry.id(),
            title: entry.title(),
            description: entry.description(),
            content: entry.content(),
            permalink: entry.permalink(),
            links: entry.links(),
            authors: entry.authors().unwrap_or_default(),
            categories: entry.categories(),
            date_created: rfc3339(entry.date_created()),
            date_modified: rfc3339(entry.date_modified()),
            enclosure: entry.enclosure(),
            comment_count: entry.comment_count(),
            comment_link: entry.comment_link(),
            comment_feed_link: entry.comment_feed_link(),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        to_json(self, pretty)
    }

    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("- ");
        output.push_str(self.title.as_deref().unwrap_or("(untitled entry)"));
        output.push('\n');
        field(&mut output, "  Link", self.permalink.as_deref());
        field(&mut output, "  Date", self.date_modified.as_deref());
        let authors = names(&self.authors);
        field(&mut output, "  By", (!authors.is_empty()).then_some(authors.as_str()));
        if let Some(count) = self.comment_count {
            output.push_str(&format!("  Comments: {}\n", count));
        }
        if let Some(enclosure) = &self.enclosure {
            field(&mut output, "  Enclosure", Some(enclosure.url.as_str()));
        }

        output
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    json.map_err(|e| FeedError::Serialization(e.to_string()))
}

fn rfc3339(date: Option<OffsetDateTime>) -> Option<String> {
    date.and_then(|date| date.format(&Rfc3339).ok())
}

fn field(output: &mut String, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        output.push_str(&format!("{}: {}\n", label, value));
    }
}

fn names(authors: &[Author]) -> String {
    authors
        .iter()
        .filter_map(|author| author.name.as_deref().or(author.email.as_deref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Strips markup from an HTML fragment
fn html_to_text(html: &str) -> String {
    let fragment = scraper::Html::parse_fragment(html);
    fragment.root_element().text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Reader;

    const RSS: &str = r#"<rss version="2.0" xmlns:slash="http://purl.org/rss/1.0/modules/slash/"><channel>
        <title>Snap</title>
        <link>http://example.com/</link>
        <description>&lt;p&gt;About &lt;b&gt;things&lt;/b&gt;&lt;/p&gt;</description>
        <managingEditor>ed@example.com (Ed)</managingEditor>
        <pubDate>Sat, 07 Mar 2009 08:03:50 +0000</pubDate>
        <item>
          <title>First</title>
          <link>http://example.com/1</link>
          <slash:comments>3</slash:comments>
        </item>
        <item><title>Second</title></item>
    </channel></rss>"#;

    fn snapshot() -> FeedSnapshot {
        let feed = Reader::new().import_string(RSS).unwrap().into_feed().unwrap();
        FeedSnapshot::capture(feed.as_ref(), true)
    }

    #[test]
    fn test_capture() {
        let snapshot = snapshot();

        assert_eq!(snapshot.feed_type, "rss-20");
        assert_eq!(snapshot.title.as_deref(), Some("Snap"));
        assert_eq!(snapshot.date_modified.as_deref(), Some("2009-03-07T08:03:50Z"));
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[0].comment_count, Some(3));
        assert_eq!(snapshot.entries[1].permalink, None);
    }

    #[test]
    fn test_to_json() {
        let json = snapshot().to_json(false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "rss-20");
        assert_eq!(value["entries"][0]["title"], "First");
        assert_eq!(value["entries"][0]["comment_count"], 3);
        assert!(value["entries"][1].get("comment_count").is_none());
        assert!(value.get("hubs").is_none());
    }

    #[test]
    fn test_to_text() {
        let text = snapshot().to_text();

        assert!(text.starts_with("Snap\n====\n"));
        assert!(text.contains("Type: rss-20"));
        assert!(text.contains("Authors: Ed"));
        assert!(text.contains("About things"));
        assert!(text.contains("- First\n  Link: http://example.com/1\n"));
        assert!(text.contains("  Comments: 3"));
        assert!(text.contains("- Second"));
    }

    #[test]
    fn test_capture_without_entries() {
        let feed = Reader::new().import_string(RSS).unwrap().into_feed().unwrap();
        assert!(FeedSnapshot::capture(feed.as_ref(), false).entries.is_empty());
    }
}
