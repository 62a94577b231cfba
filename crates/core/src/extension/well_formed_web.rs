//! Well-Formed Web comment API: `wfw:commentRss` and `wfw:comment`.

use std::any::Any;

use super::EntryExtension;
use crate::document::XPathScope;
use crate::namespaces;

pub const NAME: &str = "WellFormedWeb";

pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: scope.bind("wfw", namespaces::WELL_FORMED_WEB) }
    }
}

impl EntryExtension for Entry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn comment_link(&self) -> Option<String> {
        self.scope.trimmed(&self.scope.path("/wfw:comment")).map(|link| self.scope.absolutise(&link))
    }

    fn comment_feed_link(&self) -> Option<String> {
        self.scope
            .trimmed(&self.scope.path("/wfw:commentRss"))
            .or_else(|| self.scope.trimmed(&self.scope.path("/wfw:commentRSS")))
            .map(|link| self.scope.absolutise(&link))
    }
}
