//! Origin resolution: `FROM` clause → optional source pipeline.
//!
//! `None` means nothing matched; the caller decides that this is fatal.

use std::sync::Arc;

use tracing::debug;

use flowsql_exec::{PersistedPipeline, RowPipeline, Source};
use flowsql_io::ObjectStore;

use crate::ast::{FromEx, OriginEx};
use crate::compiler::QueryContext;
use crate::destination::RESULT_SETS;
use crate::error::CompileError;

pub async fn resolve_origin(
    store: &Arc<dyn ObjectStore>,
    from: &FromEx,
    ctx: &QueryContext,
) -> Result<Option<RowPipeline>, CompileError> {
    match &from.origin {
        OriginEx::ResultSet { name } => {
            let registry = ctx.result_sets.get::<PersistedPipeline>(RESULT_SETS)?;
            let found = registry.try_find(name).await;
            debug!(name = %name, found = found.is_some(), "result-set origin");
            Ok(found.map(|persisted| persisted.pipeline()))
        }
        OriginEx::DataSource { path, extractor } => {
            let decoder = ctx.codecs.resolve_decoder(&extractor.name, &extractor.config)?;
            let fallback = ctx.engine.config().default_parallelism;

            // A single object wins over a container of the same name.
            if store.object_exists(path)? {
                let source = Source::object(Arc::clone(store), path, decoder);
                return Ok(Some(RowPipeline::from_source(source, fallback)));
            }
            if store.container_exists(path)? {
                let source = Source::container(Arc::clone(store), path, decoder)?;
                return Ok(Some(RowPipeline::from_source(source, fallback)));
            }
            debug!(path = %path, "no object or container at path");
            Ok(None)
        }
    }
}
