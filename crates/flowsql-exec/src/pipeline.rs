//! Lazy row pipelines.
//!
//! Building a pipeline never touches data: each combinator returns a new
//! pipeline with one more stage. The degree of parallelism is fixed by the
//! source and forwarded unchanged by every stage.

use std::sync::Arc;

use tracing::trace;

use flowsql_core::types::{Row, RowMapFn};
use flowsql_operators::{
    Distinct, Filter, Map, OpKind, Operator, Partition, RowPredicate, Sort, SortKey, Take,
};

use crate::source::Source;

#[derive(Clone)]
pub struct RowPipeline {
    source: Source,
    stages: Vec<Arc<dyn Operator>>,
    parallelism: usize,
}

impl std::fmt::Debug for RowPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowPipeline")
            .field("stages", &self.stage_names())
            .field("parallelism", &self.parallelism)
            .finish()
    }
}

impl RowPipeline {
    pub fn new(source: Source, parallelism: usize) -> Self {
        Self {
            source,
            stages: Vec::new(),
            parallelism: parallelism.max(1),
        }
    }

    /// Pipeline whose parallelism is implied by its source, or `fallback`
    /// (normally `EngineConfig::default_parallelism`) when it implies none.
    pub fn from_source(source: Source, fallback: usize) -> Self {
        let parallelism = source.implied_parallelism().unwrap_or(fallback);
        Self::new(source, parallelism)
    }

    /// Split `rows` into `parallelism` contiguous partitions.
    pub fn from_rows(rows: Vec<Row>, parallelism: usize) -> Self {
        let parallelism = parallelism.max(1);
        Self::new(Source::memory(split_rows(rows, parallelism)), parallelism)
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn stages(&self) -> &[Arc<dyn Operator>] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    /// Append an arbitrary operator.
    pub fn then(mut self, op: Arc<dyn Operator>) -> Self {
        trace!(stage = op.name(), wide = op.kind() == OpKind::Wide, "append stage");
        self.stages.push(op);
        self
    }

    pub fn filter(self, predicate: RowPredicate) -> Self {
        self.then(Arc::new(Filter::new(predicate)))
    }

    pub fn map(self, f: RowMapFn) -> Self {
        self.then(Arc::new(Map::new(f)))
    }

    pub fn distinct(self) -> Self {
        self.then(Arc::new(Distinct))
    }

    pub fn take(self, count: usize) -> Self {
        self.then(Arc::new(Take::new(count)))
    }

    /// Stable sort by `keys` in priority order.
    pub fn sort_by_using(self, keys: &[SortKey]) -> Self {
        self.then(Arc::new(Sort::new(keys)))
    }
}

/// Contiguous split preserving row order. Empty input yields no partitions.
pub(crate) fn split_rows(rows: Vec<Row>, parts: usize) -> Vec<Partition> {
    if rows.is_empty() {
        return Vec::new();
    }
    let chunk = rows.len().div_ceil(parts.max(1));
    let mut out = Vec::with_capacity(parts);
    let mut iter = rows.into_iter().peekable();
    while iter.peek().is_some() {
        out.push(iter.by_ref().take(chunk).collect());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsql_core::row;

    #[test]
    fn combinators_append_stages_and_keep_parallelism() {
        let p = RowPipeline::from_rows(vec![row! { "a" => 1i64 }], 3)
            .distinct()
            .take(5)
            .sort_by_using(&[SortKey::asc("a")]);
        assert_eq!(p.stage_names(), vec!["distinct", "take", "sort"]);
        assert_eq!(p.parallelism(), 3);
    }

    #[test]
    fn source_without_layout_uses_fallback() {
        let p = RowPipeline::from_source(Source::memory(Vec::new()), 6);
        assert_eq!(p.parallelism(), 6);

        let parts = vec![vec![row! { "a" => 1i64 }], vec![row! { "a" => 2i64 }]];
        let p = RowPipeline::from_source(Source::memory(parts), 6);
        assert_eq!(p.parallelism(), 2);
    }

    #[test]
    fn split_is_contiguous() {
        let rows: Vec<Row> = (0..5i64).map(|i| row! { "i" => i }).collect();
        let parts = split_rows(rows, 2);
        assert_eq!(parts.iter().map(Vec::len).collect::<Vec<_>>(), vec![3, 2]);
        assert_eq!(parts[1][0].get("i"), Some(&flowsql_core::SqlType::I64(3)));
    }
}
