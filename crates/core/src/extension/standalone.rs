use std::collections::HashMap;

use super::{Extension, ExtensionFactory, ExtensionManager, standard_extensions};
use crate::document::XPathScope;
use crate::error::{FeedError, Result};

/// Extension manager backed by a plain name to factory map.
///
/// Starts out with every probe shipped by the crate. Keys are matched
/// exactly (`"Slash/Entry"`).
#[derive(Clone)]
pub struct StandaloneExtensionManager {
    extensions: HashMap<String, ExtensionFactory>,
}

impl StandaloneExtensionManager {
    /// Create a manager seeded with the standard extensions
    pub fn new() -> Self {
        Self { extensions: standard_extensions().into_iter().collect() }
    }

    /// Create a manager with nothing registered
    pub fn empty() -> Self {
        Self { extensions: HashMap::new() }
    }

    /// Register (or replace) a factory under `name`
    pub fn add(&mut self, name: impl Into<String>, factory: ExtensionFactory) {
        self.extensions.insert(name.into(), factory);
    }

    /// Remove a registration, returning whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.extensions.remove(name).is_some()
    }

    /// Registered keys, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.extensions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for StandaloneExtensionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionManager for StandaloneExtensionManager {
    fn has(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    fn get(&self, name: &str, scope: XPathScope) -> Result<Extension> {
        let factory = self.extensions.get(name).ok_or_else(|| FeedError::NotFound(name.to_string()))?;
        Ok(factory(scope))
    }
}

impl std::fmt::Debug for StandaloneExtensionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandaloneExtensionManager").field("extensions", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::document::FeedDocument;
    use crate::extension::{ExtensionRole, slash};
    use crate::feed_type::FeedType;

    fn scope() -> XPathScope {
        let doc = FeedDocument::parse(
            r#"<rss version="2.0" xmlns:slash="http://purl.org/rss/1.0/modules/slash/"><channel>
            <item><slash:comments>321</slash:comments></item></channel></rss>"#,
        )
        .unwrap();
        XPathScope::new(Rc::new(doc), "/rss/channel/item[1]", FeedType::Rss20)
    }

    #[test]
    fn test_seeded_with_standard_set() {
        let manager = StandaloneExtensionManager::new();
        assert!(manager.has("DublinCore/Entry"));
        assert!(manager.has("Syndication/Feed"));
        assert!(!manager.has("Syndication/Entry"));
        assert!(!manager.has("dublincore/entry"));
    }

    #[test]
    fn test_get_builds_bound_instance() {
        let manager = StandaloneExtensionManager::new();
        let extension = manager.get("Slash/Entry", scope()).unwrap();

        assert_eq!(extension.role(), ExtensionRole::Entry);
        let entry = extension.into_entry().unwrap();
        assert_eq!(entry.comment_count(), Some(321));
        assert!(entry.as_any().downcast_ref::<slash::Entry>().is_some());
    }

    #[test]
    fn test_missing_is_not_found() {
        let manager = StandaloneExtensionManager::empty();
        assert!(matches!(manager.get("Slash/Entry", scope()), Err(FeedError::NotFound(_))));
    }

    #[test]
    fn test_add_and_remove() {
        let mut manager = StandaloneExtensionManager::empty();
        manager.add("Custom/Entry", |scope| Extension::Entry(Box::new(slash::Entry::new(scope))));
        assert!(manager.has("Custom/Entry"));
        assert!(manager.remove("Custom/Entry"));
        assert!(!manager.remove("Custom/Entry"));
        assert!(!manager.has("Custom/Entry"));
    }
}
