use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::storage::ObjectStore;

/// Local filesystem storage rooted at a directory. Store paths are relative to the root.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn relative(&self, p: &Path) -> Option<String> {
        let rel = p.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}

impl Default for FsStorage {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ObjectStore for FsStorage {
    fn object_exists(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path).is_file())
    }

    fn container_exists(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path).is_dir())
    }

    fn create_container(&self, path: &str) -> Result<()> {
        fs::create_dir_all(self.resolve(path))
            .map_err(|e| Error::Storage(format!("mkdir {path}: {e}")))
    }

    fn open_read(&self, path: &str) -> Result<Box<dyn Read + Send>> {
        let p = self.resolve(path);
        if !p.is_file() {
            return Err(Error::NotFound(path.to_string()));
        }
        let f = File::open(&p).map_err(|e| Error::Storage(format!("open {path}: {e}")))?;
        Ok(Box::new(BufReader::new(f)))
    }

    fn open_write(&self, path: &str) -> Result<Box<dyn Write + Send>> {
        let p = self.resolve(path);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Storage(format!("mkparent: {e}")))?;
        }
        let f = File::create(&p).map_err(|e| Error::Storage(format!("create {path}: {e}")))?;
        Ok(Box::new(BufWriter::new(f)))
    }

    fn list(&self, container: &str) -> Result<Vec<String>> {
        let dir = self.resolve(container);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut found: Vec<PathBuf> = Vec::new();

        fn visit_dirs(dir: &Path, found: &mut Vec<PathBuf>) -> std::io::Result<()> {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_dir() {
                    visit_dirs(&path, found)?;
                } else {
                    found.push(path);
                }
            }
            Ok(())
        }

        visit_dirs(&dir, &mut found).map_err(|e| Error::Storage(format!("list: {e}")))?;

        let mut results: Vec<String> = found.iter().filter_map(|p| self.relative(p)).collect();
        results.sort();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("flowsql-fs-{name}-{}", uuid::Uuid::new_v4().simple()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_then_read_relative_paths() {
        let root = temp_root("rw");
        let store = FsStorage::new(&root);

        {
            let mut w = store.open_write("data/in.txt").unwrap();
            w.write_all(b"hello").unwrap();
            w.flush().unwrap();
        }

        assert!(store.object_exists("data/in.txt").unwrap());
        assert!(store.container_exists("data").unwrap());
        assert!(!store.object_exists("data").unwrap());

        let mut s = String::new();
        store.open_read("data/in.txt").unwrap().read_to_string(&mut s).unwrap();
        assert_eq!(s, "hello");

        assert_eq!(store.list("data").unwrap(), vec!["data/in.txt".to_string()]);
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn list_recurses_into_subdirectories() {
        let root = temp_root("list");
        let store = FsStorage::new(&root);
        for path in ["parts/b.csv", "parts/nested/c.csv", "parts/a.csv", "other/d.csv"] {
            store.open_write(path).unwrap().flush().unwrap();
        }

        assert_eq!(
            store.list("parts").unwrap(),
            vec!["parts/a.csv", "parts/b.csv", "parts/nested/c.csv"]
        );
        let _ = fs::remove_dir_all(root);
    }

    #[test]
    fn missing_object_is_not_found() {
        let root = temp_root("missing");
        let store = FsStorage::new(&root);
        assert!(matches!(store.open_read("nope"), Err(Error::NotFound(_))));
        assert!(store.list("nope").unwrap().is_empty());
        let _ = fs::remove_dir_all(root);
    }
}
