//! In-memory object store.
//!
//! Objects live in a shared map keyed by normalized path. Containers exist either
//! because they were created explicitly or because some object sits beneath them.
//! Written bytes become visible on `flush` and when the writer is dropped.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::storage::ObjectStore;

#[derive(Default)]
struct State {
    objects: HashMap<String, Arc<Vec<u8>>>,
    containers: HashSet<String>,
}

/// Thread-safe in-memory storage.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| Error::Storage("memory store lock poisoned".into()))
    }

    /// Pre-populate an object (used by tests).
    pub fn insert(&self, path: &str, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let mut st = self.lock()?;
        st.objects.insert(normalize(path), Arc::new(bytes.into()));
        Ok(())
    }

    /// Raw bytes of an object, if present.
    pub fn bytes(&self, path: &str) -> Option<Vec<u8>> {
        let st = self.lock().ok()?;
        st.objects.get(&normalize(path)).map(|b| b.as_ref().clone())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.lock().map(|st| st.objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStorage {
    fn object_exists(&self, path: &str) -> Result<bool> {
        Ok(self.lock()?.objects.contains_key(&normalize(path)))
    }

    fn container_exists(&self, path: &str) -> Result<bool> {
        let key = normalize(path);
        let st = self.lock()?;
        if st.containers.contains(&key) {
            return Ok(true);
        }
        let prefix = format!("{key}/");
        Ok(st.objects.keys().any(|k| k.starts_with(&prefix)))
    }

    fn create_container(&self, path: &str) -> Result<()> {
        let mut st = self.lock()?;
        st.containers.insert(normalize(path));
        Ok(())
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let st = self.lock()?;
        let bytes = st
            .objects
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        Ok(Box::new(Cursor::new(bytes.as_ref().clone())))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>> {
        let key = normalize(path);
        // The object exists (empty) from the moment it is opened, as on a filesystem.
        self.lock()?.objects.insert(key.clone(), Arc::new(Vec::new()));
        Ok(Box::new(MemoryObjectWriter {
            key,
            buf: Vec::new(),
            state: Arc::clone(&self.state),
        }))
    }

    fn list(&self, container: &str) -> Result<Vec<String>> {
        let key = normalize(container);
        let prefix = if key.is_empty() {
            String::new()
        } else {
            format!("{key}/")
        };
        let st = self.lock()?;
        let mut result: Vec<String> = st
            .objects
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        result.sort();
        Ok(result)
    }
}

struct MemoryObjectWriter {
    key: String,
    buf: Vec<u8>,
    state: Arc<Mutex<State>>,
}

impl MemoryObjectWriter {
    fn commit(&self) -> std::io::Result<()> {
        let mut st = self
            .state
            .lock()
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "lock poisoned"))?;
        st.objects.insert(self.key.clone(), Arc::new(self.buf.clone()));
        Ok(())
    }
}

impl Write for MemoryObjectWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.commit()
    }
}

impl Drop for MemoryObjectWriter {
    fn drop(&mut self) {
        let _ = self.commit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_becomes_visible_on_flush() {
        let storage = MemoryStorage::new();
        let mut w = storage.open_write("out/file.txt").unwrap();
        assert!(storage.object_exists("out/file.txt").unwrap());
        w.write_all(b"hello world").unwrap();
        assert_eq!(storage.bytes("out/file.txt").unwrap(), b"");
        w.flush().unwrap();
        assert_eq!(storage.bytes("out/file.txt").unwrap(), b"hello world");
    }

    #[test]
    fn drop_commits_pending_bytes() {
        let storage = MemoryStorage::new();
        {
            let mut w = storage.open_write("a.txt").unwrap();
            w.write_all(b"abc").unwrap();
        }
        let mut s = String::new();
        storage.open_read("a.txt").unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "abc");
    }

    #[test]
    fn containers_implied_by_objects() {
        let storage = MemoryStorage::new();
        storage.insert("dir/file1.txt", "1").unwrap();
        storage.insert("dir/sub/file2.txt", "2").unwrap();
        storage.insert("other/file3.txt", "3").unwrap();

        assert!(storage.container_exists("dir").unwrap());
        assert!(storage.container_exists("/dir/").unwrap());
        assert!(!storage.container_exists("di").unwrap());
        assert!(!storage.object_exists("dir").unwrap());

        let files = storage.list("dir").unwrap();
        assert_eq!(files, vec!["dir/file1.txt", "dir/sub/file2.txt"]);
    }

    #[test]
    fn explicit_empty_container() {
        let storage = MemoryStorage::new();
        assert!(!storage.container_exists("empty").unwrap());
        storage.create_container("empty").unwrap();
        assert!(storage.container_exists("empty").unwrap());
        assert!(storage.list("empty").unwrap().is_empty());
    }
}
