//! Operator trait + common interfaces.
//!
//! The exec engine groups consecutive narrow operators into one worker pass over
//! a partition, and evaluates each wide operator once over the gathered set.

use flowsql_core::types::Row;

use thiserror::Error;

/// A slice of a pipeline's rows processed by one worker.
pub type Partition = Vec<Row>;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("planning error: {0}")]
    Plan(String),

    #[error("execution error: {0}")]
    Exec(String),

    /// A per-row function failed (missing column, type mismatch, ...).
    #[error(transparent)]
    Row(#[from] flowsql_core::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Row-at-a-time; partitions are independent.
    Narrow,
    /// Needs every row of the pipeline at once.
    Wide,
}

/// Trait that all operators must implement.
///
/// Invariants:
/// - `eval_block` must be deterministic given the same input rows.
/// - Operators never reorder rows unless reordering is their purpose (sort).
pub trait Operator: Send + Sync + 'static {
    /// Human-readable operator name (stable).
    fn name(&self) -> &'static str;

    fn kind(&self) -> OpKind;

    /// Evaluate one partition (narrow) or the concatenated row set (wide).
    fn eval_block(&self, rows: Partition) -> Result<Partition, OpError>;
}
