//! Convenient re-exports for downstream crates.

pub use crate::config::{EngineConfig, PersistTier, StorageConfig};
pub use crate::error::{Error, Result};
pub use crate::hash::Hash256;
pub use crate::id::{process_id, ProcessId, UniqueId};
pub use crate::types::{Row, RowFn, RowMapFn, SqlType};
