//! Key/value cache used by remote imports.
//!
//! The reader stores fetched bodies under `<prefix><sha256(uri)>`, and the
//! validators of a response under the same key suffixed with `_etag` and
//! `_lastmodified`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FeedError, Result};

/// String cache consulted by the reader.
pub trait FeedCache {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl FeedCache for MemoryCache {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key below a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    /// Cache rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache in the platform cache directory (`~/.cache/feedscope` on Linux).
    pub fn default_location() -> Result<Self> {
        let dir = dirs::cache_dir()
            .ok_or_else(|| FeedError::Cache("no cache directory on this platform".to_string()))?
            .join("feedscope");
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Keys are used as file names, with path separators replaced.
    fn path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(name)
    }
}

impl FeedCache for FileCache {
    fn get_item(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| FeedError::Cache(format!("cannot create {}: {}", self.dir.display(), e)))?;

        let path = self.path(key);
        fs::write(&path, value).map_err(|e| FeedError::Cache(format!("cannot write {}: {}", path.display(), e)))
    }
}
