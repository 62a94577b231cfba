use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Extension, ExtensionFactory, ExtensionManager, standard_extensions};
use crate::document::{FeedDocument, XPathScope};
use crate::error::{FeedError, Result};
use crate::feed_type::FeedType;

/// A loosely typed plugin factory.
pub type PluginFactory = Box<dyn Fn(XPathScope) -> Box<dyn Any>>;

/// Extension manager layered on a generic plugin map.
///
/// Plugins are arbitrary factories; each is checked to produce an
/// [`Extension`] when registered and again whenever it is built. Names are
/// compared case-insensitively with `/`, `\`, `_` and `-` ignored, so
/// `dublin_core/entry` and `DublinCore/Entry` address the same plugin.
pub struct ExtensionPluginManager {
    plugins: HashMap<String, PluginFactory>,
}

impl ExtensionPluginManager {
    /// Create a manager seeded with the standard extensions
    pub fn new() -> Self {
        let mut manager = Self::empty();
        for (name, factory) in standard_extensions() {
            manager.add_extension(&name, factory);
        }
        manager
    }

    /// Create a manager with nothing registered
    pub fn empty() -> Self {
        Self { plugins: HashMap::new() }
    }

    /// Normalise a plugin name to its lookup key
    pub fn normalize_name(name: &str) -> String {
        name.chars()
            .filter(|c| !matches!(c, '/' | '\\' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// Register a typed extension factory
    pub fn add_extension(&mut self, name: &str, factory: ExtensionFactory) {
        self.plugins
            .insert(Self::normalize_name(name), Box::new(move |scope| Box::new(factory(scope)) as Box<dyn Any>));
    }

    /// Register a plugin factory after checking what it builds
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidArgument`] when the factory does not
    /// produce an [`Extension`].
    pub fn add_plugin(&mut self, name: &str, factory: impl Fn(XPathScope) -> Box<dyn Any> + 'static) -> Result<()> {
        let probe = factory(validation_scope()?);
        if !probe.is::<Extension>() {
            return Err(invalid_plugin(name));
        }

        self.plugins.insert(Self::normalize_name(name), Box::new(factory));
        Ok(())
    }

    /// Remove a plugin, returning whether it existed
    pub fn remove(&mut self, name: &str) -> bool {
        self.plugins.remove(&Self::normalize_name(name)).is_some()
    }
}

impl Default for ExtensionPluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionManager for ExtensionPluginManager {
    fn has(&self, name: &str) -> bool {
        self.plugins.contains_key(&Self::normalize_name(name))
    }

    fn get(&self, name: &str, scope: XPathScope) -> Result<Extension> {
        let factory = self
            .plugins
            .get(&Self::normalize_name(name))
            .ok_or_else(|| FeedError::NotFound(name.to_string()))?;

        factory(scope)
            .downcast::<Extension>()
            .map(|extension| *extension)
            .map_err(|_| invalid_plugin(name))
    }
}

impl std::fmt::Debug for ExtensionPluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.plugins.keys().collect();
        names.sort_unstable();
        f.debug_struct("ExtensionPluginManager").field("plugins", &names).finish()
    }
}

fn invalid_plugin(name: &str) -> FeedError {
    FeedError::InvalidArgument(format!(
        "Plugin '{}' is invalid; it must build a feed or entry extension",
        name
    ))
}

/// A throwaway scope used to instantiate plugins during validation.
fn validation_scope() -> Result<XPathScope> {
    let document = FeedDocument::parse("<validation/>")?;
    Ok(XPathScope::new(Rc::new(document), "/validation", FeedType::Any))
}
