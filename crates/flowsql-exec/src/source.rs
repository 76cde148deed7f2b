//! Pipeline sources and the per-worker units they split into.

use std::sync::Arc;

use tracing::debug;

use flowsql_io::{ObjectStore, RowDecoder};
use flowsql_operators::Partition;

use crate::error::Result;
use crate::persist::{PersistedPipeline, SegmentRef};

#[derive(Clone)]
pub enum Source {
    /// One partition per stored object, decoded with a shared decoder.
    Objects {
        store: Arc<dyn ObjectStore>,
        paths: Arc<Vec<String>>,
        decoder: Arc<dyn RowDecoder>,
    },
    Persisted(PersistedPipeline),
    /// Rows already held in memory.
    Memory(Arc<Vec<Partition>>),
}

impl Source {
    /// A source over exactly one object.
    pub fn object(store: Arc<dyn ObjectStore>, path: &str, decoder: Arc<dyn RowDecoder>) -> Self {
        debug!(path, decoder = decoder.name(), "object source");
        Source::Objects {
            store,
            paths: Arc::new(vec![path.to_string()]),
            decoder,
        }
    }

    /// A source over every object in `container`.
    pub fn container(
        store: Arc<dyn ObjectStore>,
        container: &str,
        decoder: Arc<dyn RowDecoder>,
    ) -> Result<Self> {
        let paths = store.list(container)?;
        debug!(container, objects = paths.len(), decoder = decoder.name(), "container source");
        Ok(Source::Objects {
            store,
            paths: Arc::new(paths),
            decoder,
        })
    }

    pub fn memory(partitions: Vec<Partition>) -> Self {
        Source::Memory(Arc::new(partitions))
    }

    /// Parallelism implied by the source layout. A lone object or an empty
    /// source implies none.
    pub fn implied_parallelism(&self) -> Option<usize> {
        match self {
            Source::Objects { paths, .. } if paths.len() > 1 => Some(paths.len()),
            Source::Objects { .. } => None,
            Source::Persisted(p) => Some(p.parallelism()),
            Source::Memory(parts) if !parts.is_empty() => Some(parts.len()),
            Source::Memory(_) => None,
        }
    }

    pub fn units(&self) -> Vec<SourceUnit> {
        match self {
            Source::Objects {
                store,
                paths,
                decoder,
            } => paths
                .iter()
                .map(|path| SourceUnit::Object {
                    store: Arc::clone(store),
                    path: path.clone(),
                    decoder: Arc::clone(decoder),
                })
                .collect(),
            Source::Persisted(PersistedPipeline::Memory { partitions, .. })
            | Source::Memory(partitions) => partitions
                .iter()
                .cloned()
                .map(SourceUnit::Rows)
                .collect(),
            Source::Persisted(PersistedPipeline::Disk {
                store, segments, ..
            }) => segments
                .iter()
                .map(|segment| SourceUnit::Segment {
                    store: Arc::clone(store),
                    segment: segment.clone(),
                })
                .collect(),
        }
    }
}

/// The input of one worker invocation.
pub enum SourceUnit {
    Object {
        store: Arc<dyn ObjectStore>,
        path: String,
        decoder: Arc<dyn RowDecoder>,
    },
    Segment {
        store: Arc<dyn ObjectStore>,
        segment: SegmentRef,
    },
    Rows(Partition),
}

impl SourceUnit {
    pub fn load(self) -> Result<Partition> {
        match self {
            SourceUnit::Object {
                store,
                path,
                decoder,
            } => {
                let mut stream = store.open_read(&path)?;
                Ok(decoder.extract(&mut stream)?)
            }
            SourceUnit::Segment { store, segment } => segment.load(store.as_ref()),
            SourceUnit::Rows(rows) => Ok(rows),
        }
    }
}
