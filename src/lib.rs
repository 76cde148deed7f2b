#![forbid(unsafe_code)]
//! flowsql: compile parsed SQL queries into row pipelines and run them.
//!
//! This crate re-exports the workspace members:
//! - `flowsql_core`: rows, values, ids, configuration.
//! - `flowsql_io`: object stores and row codecs.
//! - `flowsql_operators`: filter, map, distinct, take, sort.
//! - `flowsql_exec`: the pipeline engine and named result sets.
//! - `flowsql_planner`: the query AST and compiler.

pub use flowsql_core;
pub use flowsql_exec;
pub use flowsql_io;
pub use flowsql_operators;
pub use flowsql_planner;

pub use flowsql_core::{row, Row, SqlType};
pub use flowsql_exec::{CancellationToken, Engine, ResultSetStore};
pub use flowsql_planner::{execute, parse_yaml_query, CompileError, QueryContext, QueryOutput};

/// Render rows as a JSON array of objects, in row order.
pub fn rows_to_json(rows: &[Row]) -> serde_json::Value {
    serde_json::Value::Array(
        rows.iter()
            .map(|row| {
                serde_json::Value::Object(
                    row.iter()
                        .map(|(name, value)| (name.to_string(), value.to_json()))
                        .collect(),
                )
            })
            .collect(),
    )
}
