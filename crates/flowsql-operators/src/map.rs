//! Map operator: rewrites each row with a compiled row function.

use flowsql_core::types::RowMapFn;

use crate::traits::{OpError, OpKind, Operator, Partition};

pub struct Map {
    pub f: RowMapFn,
}

impl Map {
    pub fn new(f: RowMapFn) -> Self {
        Self { f }
    }
}

impl Operator for Map {
    fn name(&self) -> &'static str {
        "map"
    }

    fn kind(&self) -> OpKind {
        OpKind::Narrow
    }

    fn eval_block(&self, rows: Partition) -> Result<Partition, OpError> {
        rows.iter()
            .map(|r| (self.f)(r).map_err(OpError::from))
            .collect()
    }
}
