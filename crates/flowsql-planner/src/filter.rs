//! WHERE clause → filter stage.

use std::sync::Arc;

use flowsql_core::types::{Row, SqlType};
use flowsql_exec::RowPipeline;

use crate::ast::TermEx;
use crate::error::CompileError;
use crate::expr::ExpressionCompiler;

/// Keep rows whose predicate value is exactly `true`. NULL, `false`, and any
/// non-boolean result drop the row.
pub fn apply_filter(
    pipeline: RowPipeline,
    term: &TermEx,
    compiler: &dyn ExpressionCompiler,
) -> Result<RowPipeline, CompileError> {
    let predicate = compiler.compile(term)?;
    Ok(pipeline.filter(Arc::new(move |row: &Row| -> flowsql_core::Result<bool> {
        Ok(predicate(row)? == SqlType::TRUE)
    })))
}
