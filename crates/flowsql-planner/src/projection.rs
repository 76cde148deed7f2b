//! SELECT list → projection stage.
//!
//! A list holding a single `Distinct` or `Top` applies that set operator first
//! and then recurses into the wrapped list. Any other list is a flat fold: each
//! output row starts empty and every item writes into it left to right.
//! - `*` copies the whole source row in.
//! - A column reference writes the source value under its alias, or under the
//!   joined reference name.
//! - A computed term writes its value under its alias, or under the textual
//!   rendering of the value itself.
//!
//! Later items overwrite earlier ones with the same name.

use std::sync::Arc;

use tracing::debug;

use flowsql_core::types::{Row, RowFn};
use flowsql_exec::RowPipeline;

use crate::ast::{ProjectionEx, TermEx};
use crate::error::CompileError;
use crate::expr::ExpressionCompiler;

const WILDCARD: &str = "*";

enum Step {
    Wildcard,
    Column { name: String, output: String },
    Computed { f: RowFn, alias: Option<String> },
}

pub fn apply_projection(
    pipeline: RowPipeline,
    projection: &[ProjectionEx],
    compiler: &dyn ExpressionCompiler,
) -> Result<RowPipeline, CompileError> {
    match projection {
        [ProjectionEx::Distinct { inner }] => {
            apply_projection(pipeline.distinct(), inner, compiler)
        }
        [ProjectionEx::Top { count, inner }] => {
            apply_projection(pipeline.take(*count), inner, compiler)
        }
        items => {
            let steps = compile_steps(items, compiler)?;
            debug!(items = steps.len(), "projection fold");
            Ok(pipeline.map(Arc::new(move |row: &Row| project_row(&steps, row))))
        }
    }
}

fn compile_steps(
    items: &[ProjectionEx],
    compiler: &dyn ExpressionCompiler,
) -> Result<Vec<Step>, CompileError> {
    items
        .iter()
        .map(|item| match item {
            ProjectionEx::Projection { term, alias } => match term {
                TermEx::Column { components } => {
                    let name = components.join(".");
                    if name == WILDCARD {
                        return Ok(Step::Wildcard);
                    }
                    let output = alias.clone().unwrap_or_else(|| name.clone());
                    Ok(Step::Column { name, output })
                }
                computed => Ok(Step::Computed {
                    f: compiler.compile(computed)?,
                    alias: alias.clone(),
                }),
            },
            ProjectionEx::Distinct { .. } | ProjectionEx::Top { .. } => {
                Err(CompileError::Unsupported(
                    "DISTINCT/TOP must be the only item of a projection list".into(),
                ))
            }
        })
        .collect()
}

fn project_row(steps: &[Step], row: &Row) -> flowsql_core::Result<Row> {
    let mut acc = Row::new();
    for step in steps {
        acc = match step {
            Step::Wildcard => acc.merged(row),
            Step::Column { name, output } => acc.with(output.clone(), row.lookup(name)?.clone()),
            Step::Computed { f, alias } => {
                let value = f(row)?;
                let key = match alias {
                    Some(alias) => alias.clone(),
                    None => value.to_string(),
                };
                acc.with(key, value)
            }
        };
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
    use crate::expr::DefaultExpressionCompiler;
    use flowsql_core::config::EngineConfig;
    use flowsql_core::row;
    use flowsql_core::types::SqlType;
    use flowsql_exec::Engine;
    use flowsql_io::MemoryStorage;

    fn input() -> Vec<Row> {
        vec![
            row! { "a" => 1i64, "b" => "x" },
            row! { "a" => 2i64, "b" => "y" },
            row! { "a" => 1i64, "b" => "x" },
        ]
    }

    async fn run(projection: Vec<ProjectionEx>) -> Result<Vec<Row>, CompileError> {
        let engine =
            Engine::with_persist_store(EngineConfig::default(), Arc::new(MemoryStorage::new()));
        let p = apply_projection(
            RowPipeline::from_rows(input(), 2),
            &projection,
            &DefaultExpressionCompiler,
        )?;
        Ok(engine.to_array(&p).await?)
    }

    #[tokio::test]
    async fn plain_columns_and_aliases() {
        let out = run(vec![
            ProjectionEx::column("a"),
            ProjectionEx::aliased(TermEx::column("b"), "label"),
        ])
        .await
        .unwrap();
        assert_eq!(out[1], row! { "a" => 2i64, "label" => "y" });
    }

    #[tokio::test]
    async fn wildcard_then_override() {
        let out = run(vec![
            ProjectionEx::star(),
            ProjectionEx::aliased(TermEx::str("z"), "b"),
        ])
        .await
        .unwrap();
        assert_eq!(out[0], row! { "a" => 1i64, "b" => "z" });
    }

    #[tokio::test]
    async fn computed_without_alias_is_named_by_value() {
        let plus = TermEx::binary(BinaryOp::Add, TermEx::column("a"), TermEx::int(10));
        let out = run(vec![ProjectionEx::term(plus)]).await.unwrap();
        assert_eq!(out[0], row! { "11" => 11i64 });
    }

    #[tokio::test]
    async fn distinct_then_project() {
        let out = run(vec![ProjectionEx::distinct(vec![ProjectionEx::column("b")])])
            .await
            .unwrap();
        assert_eq!(out.len(), 2);
    }

    #[tokio::test]
    async fn top_limits_before_projection() {
        let out = run(vec![ProjectionEx::top(2, vec![ProjectionEx::star()])])
            .await
            .unwrap();
        assert_eq!(out, input()[..2].to_vec());

        let all = run(vec![ProjectionEx::top(10, vec![ProjectionEx::star()])])
            .await
            .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn missing_column_aborts() {
        let err = run(vec![ProjectionEx::column("nope")]).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[tokio::test]
    async fn projection_is_deterministic() {
        let items = vec![
            ProjectionEx::aliased(TermEx::call("upper", vec![TermEx::column("b")]), "B"),
            ProjectionEx::column("a"),
        ];
        let first = run(items.clone()).await.unwrap();
        let second = run(items).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].get("B"), Some(&SqlType::from("X")));
    }

    #[test]
    fn nested_modifier_in_flat_list_is_rejected() {
        let err = compile_steps(
            &[
                ProjectionEx::column("a"),
                ProjectionEx::distinct(vec![ProjectionEx::star()]),
            ],
            &DefaultExpressionCompiler,
        )
        .err()
        .unwrap();
        assert!(matches!(err, CompileError::Unsupported(_)));
    }
}
