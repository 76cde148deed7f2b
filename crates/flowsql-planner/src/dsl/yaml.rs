//! YAML → `Statement`.
//!
//! Example:
//! ```yaml
//! statement: query
//! from:
//!   origin: { kind: data_source, path: "data/people", extractor: { name: csv } }
//! filters:
//!   kind: binary
//!   op: gt
//!   left:  { kind: column, components: [age] }
//!   right: { kind: literal, value: 30 }
//! order_by:
//!   - { column: age, direction: descending }
//! projection:
//!   - kind: top
//!     count: 10
//!     inner:
//!       - { kind: projection, term: { kind: column, components: [name] } }
//! destination: { kind: folder, path: "out/older", writer: { name: jsonl } }
//! ```

use crate::ast::Statement;
use crate::error::CompileError;

pub fn parse_yaml_query(yaml_src: &str) -> Result<Statement, CompileError> {
    Ok(serde_yaml::from_str(yaml_src)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, DestinationEx, Literal, OriginEx, ProjectionEx, TermEx};
    use flowsql_operators::SortDirection;

    const DOC: &str = r#"
statement: query
from:
  origin: { kind: data_source, path: "data/people", extractor: { name: csv, config: { delimiter: ";" } } }
  alias: p
filters:
  kind: binary
  op: gt
  left:  { kind: column, components: [age] }
  right: { kind: literal, value: 30 }
order_by:
  - { column: age, direction: descending }
  - { column: name }
projection:
  - kind: top
    count: 10
    inner:
      - { kind: projection, term: { kind: column, components: [name] } }
      - { kind: projection, term: { kind: column, components: [age] }, alias: years }
destination: { kind: folder, path: "out/older", writer: { name: jsonl } }
"#;

    #[test]
    fn parses_full_query() {
        let Statement::Query(q) = parse_yaml_query(DOC).unwrap() else {
            panic!("expected a query");
        };

        match &q.from.origin {
            OriginEx::DataSource { path, extractor } => {
                assert_eq!(path, "data/people");
                assert_eq!(extractor.name, "csv");
                assert_eq!(extractor.config.get("delimiter"), Some(";"));
            }
            other => panic!("unexpected origin {other:?}"),
        }
        assert_eq!(q.from.alias.as_deref(), Some("p"));

        assert_eq!(
            q.filters,
            Some(TermEx::binary(
                BinaryOp::Gt,
                TermEx::column("age"),
                TermEx::lit(Literal::Int(30))
            ))
        );

        assert_eq!(q.order_by.len(), 2);
        assert_eq!(q.order_by[0].direction, SortDirection::Descending);
        assert_eq!(q.order_by[1].direction, SortDirection::Ascending);

        match &q.projection[..] {
            [ProjectionEx::Top { count, inner }] => {
                assert_eq!(*count, 10);
                assert_eq!(inner[1], ProjectionEx::aliased(TermEx::column("age"), "years"));
            }
            other => panic!("unexpected projection {other:?}"),
        }

        assert_eq!(q.destination, Some(DestinationEx::folder("out/older", "jsonl")));
        assert!(q.joins.is_empty() && q.group_by.is_empty());
    }

    #[test]
    fn parses_other_statement_kinds() {
        let st = parse_yaml_query("statement: delete\ntable: people\n").unwrap();
        assert_eq!(st.kind(), "delete");
    }

    #[test]
    fn literal_kinds() {
        let st = parse_yaml_query(
            r#"
statement: query
from: { origin: { kind: result_set, name: prior } }
projection:
  - { kind: projection, term: { kind: literal, value: ~ }, alias: n }
  - { kind: projection, term: { kind: literal, value: 2.5 }, alias: f }
  - { kind: projection, term: { kind: literal, value: "hi" }, alias: s }
"#,
        )
        .unwrap();
        let Statement::Query(q) = st else {
            panic!("expected a query");
        };
        let lits: Vec<Literal> = q
            .projection
            .iter()
            .filter_map(|p| match p {
                ProjectionEx::Projection {
                    term: TermEx::Literal { value },
                    ..
                } => Some(value.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            lits,
            vec![Literal::Null, Literal::Float(2.5), Literal::Str("hi".into())]
        );
    }

    #[test]
    fn missing_projection_selects_everything() {
        let st = parse_yaml_query("statement: query\nfrom: { origin: { kind: result_set, name: prior } }\n")
            .unwrap();
        let Statement::Query(q) = st else {
            panic!("expected a query");
        };
        assert_eq!(q.projection, vec![ProjectionEx::star()]);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(matches!(
            parse_yaml_query("statement: query\nfrom: 3\n"),
            Err(CompileError::Yaml(_))
        ));
    }
}
