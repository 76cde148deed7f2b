//! Distinct operator: drops rows whose full column mapping was already seen.
//! The first occurrence of each row is kept, so relative order is preserved.

use std::collections::HashSet;

use crate::traits::{OpError, OpKind, Operator, Partition};

#[derive(Debug, Default)]
pub struct Distinct;

impl Operator for Distinct {
    fn name(&self) -> &'static str {
        "distinct"
    }

    fn kind(&self) -> OpKind {
        OpKind::Wide
    }

    fn eval_block(&self, rows: Partition) -> Result<Partition, OpError> {
        let mut seen = HashSet::with_capacity(rows.len());
        let mut out = Vec::new();
        for row in rows {
            if !seen.contains(&row) {
                seen.insert(row.clone());
                out.push(row);
            }
        }
        Ok(out)
    }
}
