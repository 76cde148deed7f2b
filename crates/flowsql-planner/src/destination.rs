//! Destination routing: named result set or folder of written files.
//!
//! Folder writes go through `Engine::collect_distributed` with one
//! `FileCollector` per worker invocation. A collector opens its object on the
//! first row it receives, named `Part-<processId>-<uniqueId>.<ext>`: the
//! process id is shared by everything this process writes, the unique id is
//! fresh per collector. Workers that receive no rows write nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use flowsql_core::prelude::{process_id, Row, UniqueId};
use flowsql_exec::{Collector, ExecError, PersistedPipeline, RowPipeline};
use flowsql_io::{ObjectStore, RowEncoder, RowWriter};

use crate::ast::DestinationEx;
use crate::compiler::{QueryContext, QueryOutput};
use crate::error::CompileError;

/// Collection id under which named result sets are registered.
pub const RESULT_SETS: &str = "result-sets";

/// Handle to one file produced by a folder destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenFile {
    pub path: String,
    pub rows: usize,
}

pub async fn route_destination(
    store: &Arc<dyn ObjectStore>,
    pipeline: RowPipeline,
    destination: &DestinationEx,
    ctx: &QueryContext,
) -> Result<QueryOutput, CompileError> {
    match destination {
        DestinationEx::ResultSet { name } => {
            let registry = ctx.result_sets.get::<PersistedPipeline>(RESULT_SETS)?;
            let engine = Arc::clone(&ctx.engine);
            let tier = ctx.persist_tier;
            registry
                .upsert(name, || async move { engine.persist(&pipeline, tier).await })
                .await?;
            Ok(QueryOutput::Memory)
        }
        DestinationEx::Folder { path, writer } => {
            let writer = ctx.codecs.resolve_writer(&writer.name, &writer.config)?;
            if !store.container_exists(path)? {
                store.create_container(path)?;
            }

            let token = ctx.cancel.child_token();
            let factory = {
                let store = Arc::clone(store);
                let folder = path.clone();
                move || -> flowsql_exec::Result<FileCollector> {
                    Ok(FileCollector::new(
                        Arc::clone(&store),
                        folder.clone(),
                        Arc::clone(&writer),
                    ))
                }
            };
            let files = ctx
                .engine
                .collect_distributed(&pipeline, factory, &token)
                .await?;

            info!(folder = %path, files = files.len(), "folder destination written");
            Ok(QueryOutput::Files(files))
        }
    }
}

struct OpenFile {
    path: String,
    encoder: Box<dyn RowEncoder>,
    rows: usize,
}

/// Per-worker file sink for folder destinations.
pub struct FileCollector {
    store: Arc<dyn ObjectStore>,
    folder: String,
    writer: Arc<dyn RowWriter>,
    unique: UniqueId,
    open: Option<OpenFile>,
}

impl FileCollector {
    pub fn new(store: Arc<dyn ObjectStore>, folder: String, writer: Arc<dyn RowWriter>) -> Self {
        Self {
            store,
            folder,
            writer,
            unique: UniqueId::fresh(),
            open: None,
        }
    }

    fn file_name(&self) -> String {
        format!(
            "Part-{}-{}.{}",
            process_id(),
            self.unique,
            self.writer.extension()
        )
    }
}

impl Collector for FileCollector {
    type Output = WrittenFile;

    fn push(&mut self, row: &Row) -> flowsql_exec::Result<()> {
        if self.open.is_none() {
            let path = self.store.combine(&self.folder, &self.file_name());
            let sink = self.store.open_write(&path)?;
            let encoder = self.writer.open(sink)?;
            debug!(path = %path, "opened output file");
            self.open = Some(OpenFile {
                path,
                encoder,
                rows: 0,
            });
        }
        let Some(file) = self.open.as_mut() else {
            return Err(ExecError::Invalid("output file is not open".into()));
        };
        file.encoder.write_row(row)?;
        file.rows += 1;
        Ok(())
    }

    fn close(self) -> flowsql_exec::Result<Vec<WrittenFile>> {
        match self.open {
            Some(file) => {
                file.encoder.close()?;
                debug!(path = %file.path, rows = file.rows, "closed output file");
                Ok(vec![WrittenFile {
                    path: file.path,
                    rows: file.rows,
                }])
            }
            None => Ok(Vec::new()),
        }
    }
}
