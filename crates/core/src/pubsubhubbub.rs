//! PubSubHubbub hub discovery.
//!
//! Publishers advertise their hubs with `<atom:link rel="hub">`, in Atom
//! feeds and in RSS feeds that carry the Atom namespace. Only discovery is
//! provided here; subscribing to a hub is left to the caller.

use crate::facade::Feed;
use crate::model::unique;

/// The hub URLs advertised by `feed`, de-duplicated in document order.
///
/// # Example
///
/// ```rust
/// use feedscope_core::{Reader, pubsubhubbub::detect_hubs};
///
/// let xml = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom"><channel>
///     <atom:link rel="hub" href="http://hub.example.com/"/>
/// </channel></rss>"#;
/// let feed = Reader::new().import_string(xml).unwrap().into_feed().unwrap();
///
/// assert_eq!(detect_hubs(feed.as_ref()), vec!["http://hub.example.com/"]);
/// ```
pub fn detect_hubs(feed: &dyn Feed) -> Vec<String> {
    let hubs = unique(feed.hubs());
    tracing::debug!(count = hubs.len(), "detected hubs");
    hubs
}
