//! Runtime: evaluate `RowPipeline`s on the worker pool.
//!
//! Execution model:
//! - The source is split into units (one per object, segment, or in-memory
//!   partition); each unit is one worker invocation.
//! - Consecutive narrow stages are fused into that worker pass.
//! - A wide stage gathers every partition in partition order, runs once, and
//!   re-splits its output to the pipeline's degree of parallelism.
//! - Trailing narrow stages run inside the terminal step (`to_array`,
//!   `persist`, `collect_distributed`), so a distributed write sees rows as
//!   soon as its worker has produced them.

use std::io::Write;
use std::sync::Arc;

use tracing::{debug, info, trace};

use flowsql_core::config::{EngineConfig, PersistTier};
use flowsql_core::hash::hash_bytes;
use flowsql_core::id::UniqueId;
use flowsql_core::types::Row;
use flowsql_io::{build_storage_from_config, ObjectStore};
use flowsql_operators::{OpKind, Operator, Partition};

use crate::cancel::CancellationToken;
use crate::error::{ExecError, Result};
use crate::persist::{encode_segment, PersistedPipeline, SegmentRef};
use crate::pipeline::{split_rows, RowPipeline};
use crate::scheduler::WorkerPool;
use crate::source::SourceUnit;

/// Per-worker sink used by `Engine::collect_distributed`.
///
/// One collector is created per worker invocation. `close` is always called
/// before the worker reports, including when the worker stops early because of
/// cancellation.
pub trait Collector: Send + 'static {
    type Output: Send + 'static;

    fn push(&mut self, row: &Row) -> Result<()>;

    fn close(self) -> Result<Vec<Self::Output>>;
}

/// Engine owns the worker pool and the store used by the disk persist tier.
pub struct Engine {
    cfg: EngineConfig,
    pool: WorkerPool,
    persist_store: Arc<dyn ObjectStore>,
}

impl Engine {
    /// Build an engine whose disk tier writes to the store named by `cfg`.
    pub fn new(cfg: EngineConfig) -> Result<Self> {
        let store = build_storage_from_config(&cfg.storage_config())?;
        Ok(Self::with_persist_store(cfg, store))
    }

    pub fn with_persist_store(cfg: EngineConfig, persist_store: Arc<dyn ObjectStore>) -> Self {
        let pool = WorkerPool::new(cfg.max_parallel_tasks);
        Self {
            cfg,
            pool,
            persist_store,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// Run every stage up to (not including) a trailing run of narrow stages.
    async fn prepare(
        &self,
        pipeline: &RowPipeline,
    ) -> Result<(Vec<SourceUnit>, Vec<Arc<dyn Operator>>)> {
        let mut units = pipeline.source().units();
        let mut pending: Vec<Arc<dyn Operator>> = Vec::new();

        for stage in pipeline.stages() {
            match stage.kind() {
                OpKind::Narrow => pending.push(Arc::clone(stage)),
                OpKind::Wide => {
                    let parts = self.run_narrow(units, std::mem::take(&mut pending)).await?;
                    let rows: Vec<Row> = parts.into_iter().flatten().collect();
                    let input_rows = rows.len();

                    let op = Arc::clone(stage);
                    let job = move || -> Result<Partition> { Ok(op.eval_block(rows)?) };
                    let out = self
                        .pool
                        .run_all(vec![job])
                        .await?
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>();

                    debug!(
                        stage = stage.name(),
                        input_rows,
                        output_rows = out.len(),
                        "wide stage"
                    );
                    units = split_rows(out, pipeline.parallelism())
                        .into_iter()
                        .map(SourceUnit::Rows)
                        .collect();
                }
            }
        }

        Ok((units, pending))
    }

    async fn run_narrow(
        &self,
        units: Vec<SourceUnit>,
        ops: Vec<Arc<dyn Operator>>,
    ) -> Result<Vec<Partition>> {
        let ops = Arc::new(ops);
        let jobs: Vec<_> = units
            .into_iter()
            .map(|unit| {
                let ops = Arc::clone(&ops);
                move || -> Result<Partition> { apply_narrow(unit.load()?, &ops) }
            })
            .collect();
        self.pool.run_all(jobs).await
    }

    /// Evaluate the pipeline, keeping its partitioning.
    pub async fn partitions(&self, pipeline: &RowPipeline) -> Result<Vec<Partition>> {
        let (units, tail) = self.prepare(pipeline).await?;
        self.run_narrow(units, tail).await
    }

    /// Materialize every row, partitions concatenated in order.
    pub async fn to_array(&self, pipeline: &RowPipeline) -> Result<Vec<Row>> {
        let rows: Vec<Row> = self
            .partitions(pipeline)
            .await?
            .into_iter()
            .flatten()
            .collect();
        debug!(rows = rows.len(), "materialized pipeline");
        Ok(rows)
    }

    /// Evaluate the pipeline once and keep its rows on `tier`.
    pub async fn persist(
        &self,
        pipeline: &RowPipeline,
        tier: PersistTier,
    ) -> Result<PersistedPipeline> {
        let parts = self.partitions(pipeline).await?;
        let parallelism = pipeline.parallelism();

        let persisted = match tier {
            PersistTier::Memory => PersistedPipeline::Memory {
                partitions: Arc::new(parts),
                parallelism,
            },
            PersistTier::Disk => {
                let store = Arc::clone(&self.persist_store);
                let dir = store.combine(&self.cfg.persist_dir, &UniqueId::fresh().to_string());
                store.create_container(&dir)?;

                let jobs: Vec<_> = parts
                    .into_iter()
                    .enumerate()
                    .map(|(i, rows)| {
                        let store = Arc::clone(&store);
                        let path = store.combine(&dir, &format!("segment-{i:05}.json"));
                        move || -> Result<SegmentRef> { write_segment(store.as_ref(), path, rows) }
                    })
                    .collect();
                let segments = self.pool.run_all(jobs).await?;

                PersistedPipeline::Disk {
                    store,
                    segments: Arc::new(segments),
                    parallelism,
                }
            }
        };

        info!(
            tier = ?persisted.tier(),
            rows = persisted.row_count(),
            "persisted pipeline"
        );
        Ok(persisted)
    }

    /// Stream the pipeline into one collector per worker invocation and
    /// concatenate what the collectors report.
    ///
    /// `token` is checked before each worker starts and before every row. A
    /// cancelled worker closes its collector, then the call fails with
    /// `ExecError::Cancelled`; output already closed stays where it is.
    pub async fn collect_distributed<C, F>(
        &self,
        pipeline: &RowPipeline,
        factory: F,
        token: &CancellationToken,
    ) -> Result<Vec<C::Output>>
    where
        C: Collector,
        F: Fn() -> Result<C> + Send + Sync + 'static,
    {
        if token.is_cancelled() {
            return Err(ExecError::Cancelled);
        }
        let (units, tail) = self.prepare(pipeline).await?;
        let factory = Arc::new(factory);
        let tail = Arc::new(tail);

        let jobs: Vec<_> = units
            .into_iter()
            .map(|unit| {
                let factory = Arc::clone(&factory);
                let tail = Arc::clone(&tail);
                let token = token.clone();
                move || -> Result<Vec<C::Output>> {
                    if token.is_cancelled() {
                        return Err(ExecError::Cancelled);
                    }
                    let rows = apply_narrow(unit.load()?, &tail)?;
                    let mut collector = factory()?;
                    for row in &rows {
                        if token.is_cancelled() {
                            collector.close()?;
                            return Err(ExecError::Cancelled);
                        }
                        if let Err(e) = collector.push(row) {
                            let _ = collector.close();
                            return Err(e);
                        }
                    }
                    trace!(rows = rows.len(), "worker done");
                    collector.close()
                }
            })
            .collect();

        let outputs: Vec<C::Output> = self.pool.run_all(jobs).await?.into_iter().flatten().collect();
        debug!(outputs = outputs.len(), "distributed collect finished");
        Ok(outputs)
    }
}

fn apply_narrow(mut rows: Partition, ops: &[Arc<dyn Operator>]) -> Result<Partition> {
    for op in ops {
        rows = op.eval_block(rows)?;
    }
    Ok(rows)
}

fn write_segment(store: &dyn ObjectStore, path: String, rows: Vec<Row>) -> Result<SegmentRef> {
    let count = rows.len();
    let bytes = encode_segment(rows)?;
    let mut w = store.open_write(&path)?;
    w.write_all(&bytes).map_err(flowsql_io::Error::from)?;
    w.flush().map_err(flowsql_io::Error::from)?;
    let checksum = hash_bytes(&bytes);
    trace!(path = %path, rows = count, checksum = %checksum, "wrote segment");
    Ok(SegmentRef {
        checksum,
        path,
        rows: count,
    })
}
