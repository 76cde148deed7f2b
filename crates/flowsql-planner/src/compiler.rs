//! Plan orchestration: origin → filter → order → projection → destination.

use std::sync::Arc;

use tracing::{debug, info};

use flowsql_core::config::PersistTier;
use flowsql_core::types::Row;
use flowsql_exec::{CancellationToken, Engine, ResultSetStore};
use flowsql_io::{CodecRegistry, ObjectStore};

use crate::ast::{Query, Statement};
use crate::destination::{route_destination, WrittenFile};
use crate::error::CompileError;
use crate::expr::{DefaultExpressionCompiler, ExpressionCompiler};
use crate::filter::apply_filter;
use crate::order::apply_order;
use crate::origin::resolve_origin;
use crate::projection::apply_projection;

/// Everything a compile needs besides the object store and the statement.
///
/// Nothing here is global: the result-set store in particular is shared only
/// by the contexts it is handed to.
#[derive(Clone)]
pub struct QueryContext {
    pub result_sets: Arc<ResultSetStore>,
    pub codecs: Arc<CodecRegistry>,
    pub compiler: Arc<dyn ExpressionCompiler>,
    pub engine: Arc<Engine>,
    /// Tier used by `ResultSet` destinations.
    pub persist_tier: PersistTier,
    /// Ambient cancellation for this query.
    pub cancel: CancellationToken,
}

impl QueryContext {
    /// Fresh result-set store, default codecs and expression compiler, the
    /// engine's configured persist tier, and an uncancelled token.
    pub fn new(engine: Arc<Engine>) -> Self {
        let persist_tier = engine.config().persist_tier;
        Self {
            result_sets: Arc::new(ResultSetStore::new()),
            codecs: Arc::new(CodecRegistry::with_defaults()),
            compiler: Arc::new(DefaultExpressionCompiler),
            engine,
            persist_tier,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_result_sets(mut self, result_sets: Arc<ResultSetStore>) -> Self {
        self.result_sets = result_sets;
        self
    }

    pub fn with_codecs(mut self, codecs: Arc<CodecRegistry>) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn ExpressionCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_persist_tier(mut self, tier: PersistTier) -> Self {
        self.persist_tier = tier;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Result of one top-level compile.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// One handle per file written by a `Folder` destination.
    Files(Vec<WrittenFile>),
    /// Rows were registered under a result-set name.
    Memory,
    /// No destination: the materialized rows.
    Array(Vec<Row>),
}

/// Compile `statement` against `store` and run it.
pub async fn execute(
    store: Arc<dyn ObjectStore>,
    statement: &Statement,
    ctx: &QueryContext,
) -> Result<QueryOutput, CompileError> {
    match statement {
        Statement::Query(query) => execute_query(&store, query, ctx).await,
        other => Err(CompileError::Unsupported(format!(
            "{} statements cannot be compiled",
            other.kind()
        ))),
    }
}

async fn execute_query(
    store: &Arc<dyn ObjectStore>,
    query: &Query,
    ctx: &QueryContext,
) -> Result<QueryOutput, CompileError> {
    if !query.joins.is_empty() {
        return Err(CompileError::Unsupported("JOIN is not implemented".into()));
    }
    if !query.group_by.is_empty() {
        return Err(CompileError::Unsupported("GROUP BY is not implemented".into()));
    }

    let source = resolve_origin(store, &query.from, ctx)
        .await?
        .ok_or_else(|| CompileError::SourceNotFound(query.from.origin.describe().to_string()))?;

    let pipeline = match &query.filters {
        Some(term) => apply_filter(source, term, ctx.compiler.as_ref())?,
        None => source,
    };
    let pipeline = apply_order(pipeline, &query.order_by);
    let pipeline = apply_projection(pipeline, &query.projection, ctx.compiler.as_ref())?;
    debug!(stages = ?pipeline.stage_names(), parallelism = pipeline.parallelism(), "compiled query");

    let output = match &query.destination {
        Some(destination) => route_destination(store, pipeline, destination, ctx).await?,
        None => QueryOutput::Array(ctx.engine.to_array(&pipeline).await?),
    };

    info!(
        output = match &output {
            QueryOutput::Files(files) => format!("files({})", files.len()),
            QueryOutput::Memory => "memory".to_string(),
            QueryOutput::Array(rows) => format!("array({})", rows.len()),
        },
        "query executed"
    );
    Ok(output)
}
