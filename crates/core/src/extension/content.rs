//! RSS content module: `content:encoded`.

use std::any::Any;

use super::EntryExtension;
use crate::document::XPathScope;
use crate::namespaces;

pub const NAME: &str = "Content";

pub struct Entry {
    scope: XPathScope,
}

impl Entry {
    pub fn new(scope: XPathScope) -> Self {
        Self { scope: scope.bind("content", namespaces::CONTENT) }
    }
}

impl EntryExtension for Entry {
    fn name(&self) -> &'static str {
        NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn content(&self) -> Option<String> {
        self.scope.trimmed(&self.scope.path("/content:encoded"))
    }
}
