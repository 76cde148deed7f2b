#![forbid(unsafe_code)]
//! flowsql-exec: the async pipeline engine.
//!
//! A `RowPipeline` is a lazy description (source + stages). The `Engine` runs it
//! on tokio workers bounded by `EngineConfig::max_parallel_tasks`, materializes
//! it (`to_array`), persists it to a tier (`persist`), or streams it into
//! per-worker collectors (`collect_distributed`). Named result sets live in a
//! `ResultSetStore` handed around explicitly.

pub mod cancel;
pub mod error;
pub mod persist;
pub mod pipeline;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod source;

pub use cancel::CancellationToken;
pub use error::{ExecError, Result};
pub use persist::{PersistedPipeline, SegmentRef};
pub use pipeline::RowPipeline;
pub use registry::{Registry, ResultSetStore};
pub use runtime::{Collector, Engine};
pub use scheduler::WorkerPool;
pub use source::{Source, SourceUnit};
