//! Take operator: prefix limit over the rows in their current order.

use crate::traits::{OpError, OpKind, Operator, Partition};

#[derive(Debug)]
pub struct Take {
    pub count: usize,
}

impl Take {
    pub fn new(count: usize) -> Self {
        Self { count }
    }
}

impl Operator for Take {
    fn name(&self) -> &'static str {
        "take"
    }

    fn kind(&self) -> OpKind {
        OpKind::Wide
    }

    fn eval_block(&self, mut rows: Partition) -> Result<Partition, OpError> {
        rows.truncate(self.count);
        Ok(rows)
    }
}
