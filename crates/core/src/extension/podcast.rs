//! iTunes podcast vocabulary.
//!
//! Besides the shared accessors (authors, image, categories), the probes
//! expose the podcast specific fields directly; reach them through
//! `extension_as::<podcast::Feed>()` on a feed facade.

use std::any::Any;

use serde::Serialize;

use super::{EntryExtension, FeedExtension};
use crate::document::{XPathScope, attribute, child_text};
use crate::model::{Author, Category, Image};
use crate::namespaces;

pub const NAME: &str = "Podcast";

/// An `itunes:category` with its nested subcategories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodcastCategory {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<String>,
}

fn bind(scope: XPathScope) -> XPathScope {
    scope.bind("itunes", namespaces::ITUNES)
}

fn field(scope: &XPathScope, name: &str) -> Option<String> {
    scope.trimmed(&scope.path(&format!("/itunes:{}", name)))
}

fn flag(scope: &XPathScope, name: &str) -> bool {
    field(scope, name).is_some_and(|value| value.eq_ignore_ascii_case("yes"))
}

fn keywords(scope: &XPathScope) -> Vec<String> {
    field(scope, "keywords")
        .map(|keywords| {
            keywords
                .split(',')
                .map(str::trim)
                .filter(|keyword| !keyword.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn image(scope: &XPathScope) -> Option<String> {
    scope.trimmed(&scope.path("/itunes:image/@href"))
}

/// `itunes:explicit` normalised to `yes`, `no` or `clean`.
fn explicit(scope: &XPathScope) -> Option<String> {
    field(scope, "explicit").map(|value| match value.to_ascii_lowercase().as_str() {
        "yes" | "true" | "explicit" => "yes".to_string(),
        "clean" => "clean".to_string(),
        _ => "no".to_string(),
    })
}

/// Podcast probe for a channel.
pub struct Feed {
    scope: XPathScope,
}

impl Feed {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: bind(scope) }
    }

    pub fn author(&self) -> Option<String> {
        field(&self.scope, "author")
    }

    pub fn block(&self) -> bool {
        flag(&self.scope, "block")
    }

    pub fn itunes_categories(&self) -> Vec<PodcastCategory> {
        let ns = namespaces::ITUNES;
        self.scope.elements(&self.scope.path("/itunes:category"), |element| {
            let subcategories = element
                .children()
                .into_iter()
                .filter_map(|child| child.element())
                .filter(|child| child.name().local_part() == "category" && child.name().namespace_uri() == Some(ns))
                .filter_map(|child| attribute(child, "text"))
                .collect();
            Some(PodcastCategory { text: attribute(element, "text")?, subcategories })
        })
    }

    pub fn explicit(&self) -> Option<String> {
        explicit(&self.scope)
    }

    pub fn image_url(&self) -> Option<String> {
        image(&self.scope)
    }

    pub fn keywords(&self) -> Vec<String> {
        keywords(&self.scope)
    }

    pub fn new_feed_url(&self) -> Option<String> {
        field(&self.scope, "new-feed-url")
    }

    pub fn owner(&self) -> Option<Author> {
        let ns = namespaces::ITUNES;
        self.scope.first_element(&self.scope.path("/itunes:owner"), |element| {
            let owner = Author {
                name: child_text(element, Some(ns), "name"),
                email: child_text(element, Some(ns), "email"),
                uri: None,
            };
            (!owner.is_empty()).then_some(owner)
        })
    }

    pub fn subtitle(&self) -> Option<String> {
        field(&self.scope, "subtitle")
    }

    pub fn summary(&self) -> Option<String> {
        field(&self.scope, "summary")
    }

    /// `episodic` or `serial`.
    pub fn podcast_type(&self) -> Option<String> {
        field(&self.scope, "type")
    }

    pub fn complete(&self) -> bool {
        flag(&self.scope, "complete")
    }
}

impl FeedExtension for Feed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn description(&self) -> Option<String> {
        self.summary()
    }

    fn authors(&self) -> Vec<Author> {
        self.author().map(Author::named).into_iter().collect()
    }

    fn categories(&self) -> Vec<Category> {
        self.itunes_categories()
            .into_iter()
            .flat_map(|category| {
                let mut terms = vec![category.text];
                terms.extend(category.subcategories);
                terms
            })
            .map(Category::term)
            .collect()
    }

    fn image(&self) -> Option<Image> {
        Some(Image { uri: self.image_url()?, ..Default::default() })
    }
}

/// Podcast probe for an item (episode).
pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: bind(scope) }
    }

    pub fn author(&self) -> Option<String> {
        field(&self.scope, "author")
    }

    pub fn block(&self) -> bool {
        flag(&self.scope, "block")
    }

    /// Raw `itunes:duration`, e.g. `1:02:03` or `3723`.
    pub fn duration(&self) -> Option<String> {
        field(&self.scope, "duration")
    }

    pub fn explicit(&self) -> Option<String> {
        explicit(&self.scope)
    }

    pub fn image_url(&self) -> Option<String> {
        image(&self.scope)
    }

    pub fn keywords(&self) -> Vec<String> {
        keywords(&self.scope)
    }

    pub fn subtitle(&self) -> Option<String> {
        field(&self.scope, "subtitle")
    }

    pub fn summary(&self) -> Option<String> {
        field(&self.scope, "summary")
    }

    pub fn episode(&self) -> Option<u32> {
        field(&self.scope, "episode").and_then(|episode| episode.parse().ok())
    }

    /// `full`, `trailer` or `bonus`.
    pub fn episode_type(&self) -> Option<String> {
        field(&self.scope, "episodeType")
    }

    pub fn season(&self) -> Option<u32> {
        field(&self.scope, "season").and_then(|season| season.parse().ok())
    }

    pub fn closed_captioned(&self) -> bool {
        flag(&self.scope, "isClosedCaptioned")
    }

    pub fn itunes_title(&self) -> Option<String> {
        field(&self.scope, "title")
    }
}

impl EntryExtension for Entry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn title(&self) -> Option<String> {
        self.itunes_title()
    }

    fn description(&self) -> Option<String> {
        self.summary()
    }

    fn authors(&self) -> Vec<Author> {
        self.author().map(Author::named).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::document::FeedDocument;
    use crate::feed_type::FeedType;

    const PODCAST: &str = r#"<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd"><channel>
        <title>Show</title>
        <itunes:author>Host</itunes:author>
        <itunes:block>yes</itunes:block>
        <itunes:category text="Technology">
          <itunes:category text="Software How-To"/>
        </itunes:category>
        <itunes:category text="News"/>
        <itunes:explicit>false</itunes:explicit>
        <itunes:image href="http://example.com/cover.jpg"/>
        <itunes:keywords>rust, xml ,feeds</itunes:keywords>
        <itunes:new-feed-url>http://example.com/new.xml</itunes:new-feed-url>
        <itunes:owner><itunes:name>Owner</itunes:name><itunes:email>owner@example.com</itunes:email></itunes:owner>
        <itunes:type>serial</itunes:type>
        <itunes:complete>Yes</itunes:complete>
        <item>
          <itunes:duration>1:02:03</itunes:duration>
          <itunes:episode>12</itunes:episode>
          <itunes:season>2</itunes:season>
          <itunes:episodeType>trailer</itunes:episodeType>
          <itunes:isClosedCaptioned>yes</itunes:isClosedCaptioned>
          <itunes:title>Episode title</itunes:title>
          <itunes:explicit>clean</itunes:explicit>
        </item>
    </channel></rss>"#;

    fn scope(prefix: &str) -> XPathScope {
        XPathScope::new(Rc::new(FeedDocument::parse(PODCAST).unwrap()), prefix, FeedType::Rss20)
    }

    #[test]
    fn test_channel_fields() {
        let feed = Feed::new(scope("/rss/channel"));

        assert_eq!(feed.author().as_deref(), Some("Host"));
        assert!(feed.block());
        assert!(feed.complete());
        assert_eq!(feed.explicit().as_deref(), Some("no"));
        assert_eq!(feed.keywords(), vec!["rust", "xml", "feeds"]);
        assert_eq!(feed.new_feed_url().as_deref(), Some("http://example.com/new.xml"));
        assert_eq!(feed.owner().unwrap().email.as_deref(), Some("owner@example.com"));
        assert_eq!(feed.podcast_type().as_deref(), Some("serial"));
        assert_eq!(feed.image().unwrap().uri, "http://example.com/cover.jpg");

        let categories = feed.itunes_categories();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].subcategories, vec!["Software How-To"]);
        assert_eq!(feed.categories().len(), 3);
    }

    #[test]
    fn test_episode_fields() {
        let entry = Entry::new(scope("/rss/channel/item[1]"));

        assert_eq!(entry.duration().as_deref(), Some("1:02:03"));
        assert_eq!(entry.episode(), Some(12));
        assert_eq!(entry.season(), Some(2));
        assert_eq!(entry.episode_type().as_deref(), Some("trailer"));
        assert!(entry.closed_captioned());
        assert!(!entry.block());
        assert_eq!(entry.title().as_deref(), Some("Episode title"));
        assert_eq!(entry.explicit().as_deref(), Some("clean"));
    }
}
