//! Creative Commons RSS module: `creativeCommons:license`.
//!
//! An item without its own licenses inherits the channel's.

use std::any::Any;

use super::{EntryExtension, FeedExtension};
use crate::document::XPathScope;
use crate::namespaces;

pub const NAME: &str = "CreativeCommons";

fn bind(scope: XPathScope) -> XPathScope {
    scope.bind("cc", namespaces::CREATIVE_COMMONS)
}

fn licenses(scope: &XPathScope, prefix: &str) -> Vec<String> {
    scope
        .strings(&format!("{}/cc:license", prefix))
        .into_iter()
        .map(|license| license.trim().to_string())
        .collect()
}

pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: bind(scope) }
    }

    /// Licenses of the item, or of the channel when the item has none.
    pub fn licenses(&self) -> Vec<String> {
        let own = licenses(&self.scope, self.scope.prefix());
        if !own.is_empty() {
            return own;
        }
        licenses(&self.scope, self.scope.feed_type().channel_path())
    }

    pub fn license(&self, index: usize) -> Option<String> {
        self.licenses().into_iter().nth(index)
    }
}

impl EntryExtension for Entry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub struct Feed {
    scope: XPathScope,
}

impl Feed {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: bind(scope) }
    }

    pub fn licenses(&self) -> Vec<String> {
        licenses(&self.scope, self.scope.prefix())
    }

    pub fn license(&self, index: usize) -> Option<String> {
        self.licenses().into_iter().nth(index)
    }
}

impl FeedExtension for Feed {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn copyright(&self) -> Option<String> {
        self.license(0)
    }
}
