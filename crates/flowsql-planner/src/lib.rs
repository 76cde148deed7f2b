#![forbid(unsafe_code)]
//! flowsql-planner: compile a parsed query into a `RowPipeline` and run it.
//!
//! Stage order is fixed: origin → filter → order → projection → destination.
//! - `ast`: the query surface (statements, origins, projections, terms).
//! - `expr`: the expression-compiler capability and its default implementation.
//! - `origin`, `filter`, `order`, `projection`, `destination`: one module per stage.
//! - `compiler`: `QueryContext`, `QueryOutput`, and the `execute` entry point.
//! - `dsl::yaml`: queries written as YAML documents.

pub mod ast;
pub mod compiler;
pub mod destination;
pub mod dsl;
pub mod error;
pub mod expr;
pub mod filter;
pub mod order;
pub mod origin;
pub mod projection;

pub use ast::{
    BinaryOp, DestinationEx, Extractor, FromEx, JoinEx, Literal, OrderEx, OriginEx, ProjectionEx,
    Query, Statement, TermEx, UnaryOp, Writer,
};
pub use compiler::{execute, QueryContext, QueryOutput};
pub use destination::{FileCollector, WrittenFile, RESULT_SETS};
pub use dsl::yaml::parse_yaml_query;
pub use error::CompileError;
pub use expr::{DefaultExpressionCompiler, ExpressionCompiler};
