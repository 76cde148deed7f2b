//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where `persist` keeps a materialized pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistTier {
    /// Partitions stay in process memory.
    #[default]
    Memory,
    /// Partitions are written as checksummed segments under `persist_dir`.
    Disk,
}

impl std::str::FromStr for PersistTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(PersistTier::Memory),
            "disk" | "durable" => Ok(PersistTier::Disk),
            other => Err(Error::Config(format!("unknown persist tier '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on concurrently running workers. Pipelines never fan out wider.
    pub max_parallel_tasks: usize,

    /// Degree of parallelism assigned to sources that don't imply one.
    pub default_parallelism: usize,

    /// Tier used when a query routes its output into a named result set.
    pub persist_tier: PersistTier,

    /// Directory (inside the object store) for disk-tier segments.
    pub persist_dir: String,

    /// Optional fully-qualified storage URI (e.g., `file:///data`, `memory://`).
    pub storage_uri: Option<String>,

    /// Root directory for the filesystem store when no URI is given.
    pub storage_root: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_parallel_tasks: 4,
            default_parallelism: 4,
            persist_tier: PersistTier::Memory,
            persist_dir: "_flowsql/persist".to_string(),
            storage_uri: None,
            storage_root: ".".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub uri: Option<String>,
    pub root: String,
}

impl StorageConfig {
    pub fn scheme(&self) -> Option<&str> {
        self.uri
            .as_deref()
            .and_then(|uri| uri.split("://").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `FLOWSQL_MAX_PARALLEL_TASKS`: max concurrently running workers
    /// - `FLOWSQL_DEFAULT_PARALLELISM`: degree of parallelism for in-memory sources
    /// - `FLOWSQL_PERSIST_TIER`: `memory` or `disk`
    /// - `FLOWSQL_PERSIST_DIR`: directory for disk-tier segments
    /// - `FLOWSQL_STORAGE_URI`: storage URI (`file://...`, `memory://`)
    /// - `FLOWSQL_STORAGE_ROOT`: filesystem root when no URI is set
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("FLOWSQL_MAX_PARALLEL_TASKS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_parallel_tasks = v.max(1);
            }
        }

        if let Ok(s) = std::env::var("FLOWSQL_DEFAULT_PARALLELISM") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.default_parallelism = v.max(1);
            }
        }

        if let Ok(s) = std::env::var("FLOWSQL_PERSIST_TIER") {
            if let Ok(tier) = s.parse::<PersistTier>() {
                cfg.persist_tier = tier;
            }
        }

        if let Ok(s) = std::env::var("FLOWSQL_PERSIST_DIR") {
            cfg.persist_dir = s;
        }

        if let Ok(s) = std::env::var("FLOWSQL_STORAGE_URI") {
            cfg.storage_uri = Some(s);
        }

        if let Ok(s) = std::env::var("FLOWSQL_STORAGE_ROOT") {
            cfg.storage_root = s;
        }

        cfg
    }

    /// Produce a storage configuration snapshot used by the IO layer.
    pub fn storage_config(&self) -> StorageConfig {
        let scheme = self
            .storage_uri
            .as_deref()
            .and_then(|uri| uri.split("://").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());

        let root = match (scheme, self.storage_uri.as_ref()) {
            (Some("file"), Some(uri)) => {
                file_uri_to_path(uri).unwrap_or_else(|| self.storage_root.clone())
            }
            (Some(_), Some(uri)) => uri.trim_end_matches('/').to_string(),
            _ => self.storage_root.clone(),
        };

        StorageConfig {
            uri: self.storage_uri.clone(),
            root,
        }
    }
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("/{}", stripped))
    }
}
