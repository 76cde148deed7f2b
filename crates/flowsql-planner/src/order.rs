//! ORDER BY → stable multi-key sort.
//!
//! Keys apply in listed priority; each key compares with its own direction and
//! later keys only break ties left by earlier ones. Rows equal on every key keep
//! their incoming order. Sorting on a column a row lacks is an error.

use flowsql_exec::RowPipeline;
use flowsql_operators::SortKey;

use crate::ast::OrderEx;

pub fn apply_order(pipeline: RowPipeline, order_by: &[OrderEx]) -> RowPipeline {
    if order_by.is_empty() {
        return pipeline;
    }
    let keys: Vec<SortKey> = order_by
        .iter()
        .map(|o| SortKey {
            column: o.column.clone(),
            direction: o.direction,
        })
        .collect();
    pipeline.sort_by_using(&keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowsql_core::row;

    #[test]
    fn empty_order_adds_no_stage() {
        let p = apply_order(RowPipeline::from_rows(vec![row! { "a" => 1i64 }], 1), &[]);
        assert!(p.stages().is_empty());
    }

    #[test]
    fn keys_become_one_sort_stage() {
        let p = apply_order(
            RowPipeline::from_rows(vec![row! { "a" => 1i64 }], 1),
            &[OrderEx::asc("a"), OrderEx::desc("b")],
        );
        assert_eq!(p.stage_names(), vec!["sort"]);
    }
}
