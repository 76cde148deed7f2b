//! Filter operator: keeps rows for which a compiled predicate holds.

use std::sync::Arc;

use flowsql_core::types::Row;

use crate::traits::{OpError, OpKind, Operator, Partition};

/// Compiled row predicate. Errors abort the partition being evaluated.
pub type RowPredicate = Arc<dyn Fn(&Row) -> flowsql_core::Result<bool> + Send + Sync>;

pub struct Filter {
    pub predicate: RowPredicate,
}

impl Filter {
    pub fn new(predicate: RowPredicate) -> Self {
        Self { predicate }
    }
}

impl Operator for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn kind(&self) -> OpKind {
        OpKind::Narrow
    }

    fn eval_block(&self, rows: Partition) -> Result<Partition, OpError> {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if (self.predicate)(&row)? {
                kept.push(row);
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsql_core::types::SqlType;
    use flowsql_core::{row, Error};

    #[test]
    fn keeps_matching_rows_in_order() {
        let f = Filter::new(Arc::new(|r: &Row| -> flowsql_core::Result<bool> {
            Ok(matches!(r.lookup("a")?, SqlType::I64(v) if *v > 1))
        }));
        let out = f
            .eval_block(vec![
                row! { "a" => 1i64 },
                row! { "a" => 3i64 },
                row! { "a" => 2i64 },
            ])
            .unwrap();
        assert_eq!(out, vec![row! { "a" => 3i64 }, row! { "a" => 2i64 }]);
    }

    #[test]
    fn predicate_error_propagates() {
        let f = Filter::new(Arc::new(|r: &Row| r.lookup("missing").map(|_| true)));
        let err = f.eval_block(vec![row! { "a" => 1i64 }]).err().unwrap();
        assert!(matches!(err, OpError::Row(Error::ColumnNotFound(_))));
    }
}
