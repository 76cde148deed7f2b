#![forbid(unsafe_code)]
//! flowsql-io: object-store adapters and pluggable row codecs.
//!
//! - `storage`: the `ObjectStore` capability plus a filesystem backend.
//! - `memory_storage`: a map-backed store for tests and `memory://` URIs.
//! - `readers` / `writers`: row decoders and encoders (csv, jsonl, text).
//! - `registry`: name → factory lookup for codecs, resolved once per stage.

pub mod error;
pub mod memory_storage;
pub mod readers;
pub mod registry;
pub mod storage;
pub mod writers;

pub use error::{Error, Result};
pub use memory_storage::MemoryStorage;
pub use readers::RowDecoder;
pub use registry::{CodecConfig, CodecRegistry};
pub use storage::{build_storage_from_config, FsStorage, ObjectStore};
pub use writers::{RowEncoder, RowWriter};
