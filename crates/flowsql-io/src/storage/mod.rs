//! The object-store capability consumed by sources, sinks, and persistence.
//!
//! Paths are store-relative strings using `/` as separator. An *object* holds
//! bytes; a *container* groups objects (a directory on disk, a key prefix in
//! memory). Backends:
//! - `fs`: local filesystem rooted at a directory (default).
//! - `MemoryStorage` (see `memory_storage`): `memory://` URIs and tests.

mod fs;
pub use fs::FsStorage;

use std::io::{Read, Write};
use std::sync::Arc;

use flowsql_core::config::StorageConfig;

use crate::error::{Error, Result};
use crate::memory_storage::MemoryStorage;

pub trait ObjectStore: Send + Sync {
    /// True if `path` names a single object.
    fn object_exists(&self, path: &str) -> Result<bool>;

    /// True if `path` names a container of objects.
    fn container_exists(&self, path: &str) -> Result<bool>;

    /// Create a container (and any missing parents). Idempotent.
    fn create_container(&self, path: &str) -> Result<()>;

    /// Open an existing object for reading.
    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>>;

    /// Create (or truncate) an object and open it for writing.
    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>>;

    /// All objects under a container, recursively, sorted by path.
    fn list(&self, container: &str) -> Result<Vec<String>>;

    /// Join a container path and a child name.
    fn combine(&self, base: &str, name: &str) -> String {
        combine_paths(base, name)
    }
}

pub(crate) fn combine_paths(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}/{name}")
    }
}

/// Build the correct storage backend using the provided configuration.
pub fn build_storage_from_config(cfg: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    match cfg.scheme() {
        Some("memory") => Ok(Arc::new(MemoryStorage::new())),
        Some("file") | None => {
            // Default to filesystem (treat URI as file:// or bare path).
            Ok(Arc::new(FsStorage::new(&cfg.root)))
        }
        Some(other) => Err(Error::Config(format!("unsupported storage scheme '{other}'"))),
    }
}
