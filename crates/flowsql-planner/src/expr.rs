//! Expression compilation: `TermEx` → `RowFn`.
//!
//! The planner only needs the `ExpressionCompiler` capability; callers can plug
//! in their own. `DefaultExpressionCompiler` covers column references,
//! literals, comparison, arithmetic, three-valued boolean logic, `IS NULL`, and
//! a handful of scalar functions.
//!
//! Null handling follows SQL: comparisons and arithmetic with a NULL operand
//! yield NULL; `AND`/`OR` short-circuit on a decisive operand.

use std::cmp::Ordering;
use std::sync::Arc;

use flowsql_core::types::{Row, RowFn, SqlType};
use flowsql_core::Error as CoreError;

use crate::ast::{BinaryOp, TermEx, UnaryOp};
use crate::error::CompileError;

pub trait ExpressionCompiler: Send + Sync {
    fn compile(&self, term: &TermEx) -> Result<RowFn, CompileError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExpressionCompiler;

type Eval = flowsql_core::Result<SqlType>;

impl ExpressionCompiler for DefaultExpressionCompiler {
    fn compile(&self, term: &TermEx) -> Result<RowFn, CompileError> {
        match term {
            TermEx::Column { components } => {
                let name = components.join(".");
                Ok(Arc::new(move |row: &Row| -> Eval { Ok(row.lookup(&name)?.clone()) }))
            }
            TermEx::Literal { value } => {
                let v = SqlType::from(value);
                Ok(Arc::new(move |_: &Row| -> Eval { Ok(v.clone()) }))
            }
            TermEx::Unary { op, term } => {
                let inner = self.compile(term)?;
                let op = *op;
                Ok(Arc::new(move |row: &Row| -> Eval { unary(op, inner(row)?) }))
            }
            TermEx::Binary { op, left, right } => {
                let l = self.compile(left)?;
                let r = self.compile(right)?;
                let f: RowFn = match *op {
                    BinaryOp::And => Arc::new(move |row: &Row| -> Eval {
                        match truth(l(row)?)? {
                            Some(false) => Ok(SqlType::Bool(false)),
                            left => Ok(and(left, truth(r(row)?)?)),
                        }
                    }),
                    BinaryOp::Or => Arc::new(move |row: &Row| -> Eval {
                        match truth(l(row)?)? {
                            Some(true) => Ok(SqlType::Bool(true)),
                            left => Ok(or(left, truth(r(row)?)?)),
                        }
                    }),
                    op => Arc::new(move |row: &Row| -> Eval { binary(op, l(row)?, r(row)?) }),
                };
                Ok(f)
            }
            TermEx::IsNull { term, negated } => {
                let inner = self.compile(term)?;
                let negated = *negated;
                Ok(Arc::new(move |row: &Row| -> Eval {
                    Ok(SqlType::Bool(inner(row)?.is_null() != negated))
                }))
            }
            TermEx::Call { function, args } => {
                let f = Function::resolve(function, args.len())?;
                let args = args
                    .iter()
                    .map(|a| self.compile(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Arc::new(move |row: &Row| -> Eval {
                    let values = args.iter().map(|a| a(row)).collect::<Result<Vec<_>, _>>()?;
                    f.apply(values)
                }))
            }
        }
    }
}

fn type_err(msg: String) -> CoreError {
    CoreError::Type(msg)
}

/// `Some(bool)` for booleans, `None` for NULL, error otherwise.
fn truth(v: SqlType) -> flowsql_core::Result<Option<bool>> {
    match v {
        SqlType::Bool(b) => Ok(Some(b)),
        SqlType::Null => Ok(None),
        other => Err(type_err(format!(
            "expected a boolean, got {}",
            other.kind_name()
        ))),
    }
}

fn from_truth(t: Option<bool>) -> SqlType {
    t.map(SqlType::Bool).unwrap_or(SqlType::Null)
}

fn and(l: Option<bool>, r: Option<bool>) -> SqlType {
    match (l, r) {
        (Some(false), _) | (_, Some(false)) => SqlType::Bool(false),
        (Some(true), Some(true)) => SqlType::Bool(true),
        _ => SqlType::Null,
    }
}

fn or(l: Option<bool>, r: Option<bool>) -> SqlType {
    match (l, r) {
        (Some(true), _) | (_, Some(true)) => SqlType::Bool(true),
        (Some(false), Some(false)) => SqlType::Bool(false),
        _ => SqlType::Null,
    }
}

fn unary(op: UnaryOp, v: SqlType) -> Eval {
    match (op, v) {
        (_, SqlType::Null) => Ok(SqlType::Null),
        (UnaryOp::Not, v) => Ok(from_truth(truth(v)?.map(|b| !b))),
        (UnaryOp::Neg, SqlType::I64(i)) => i
            .checked_neg()
            .map(SqlType::I64)
            .ok_or_else(|| type_err("integer overflow in negation".into())),
        (UnaryOp::Neg, SqlType::F64(f)) => Ok(SqlType::F64(-f)),
        (UnaryOp::Neg, other) => Err(type_err(format!("cannot negate {}", other.kind_name()))),
    }
}

fn binary(op: BinaryOp, l: SqlType, r: SqlType) -> Eval {
    match op {
        BinaryOp::And => return Ok(and(truth(l)?, truth(r)?)),
        BinaryOp::Or => return Ok(or(truth(l)?, truth(r)?)),
        _ if l.is_null() || r.is_null() => return Ok(SqlType::Null),
        _ => {}
    }
    let ord = match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            return arithmetic(op, l, r)
        }
        _ => match l.compare_values(&r) {
            Some(ord) => ord,
            // Incomparable kinds yield unknown, like a NULL operand.
            None => return Ok(SqlType::Null),
        },
    };
    Ok(SqlType::Bool(match op {
        BinaryOp::Eq => ord == Ordering::Equal,
        BinaryOp::NotEq => ord != Ordering::Equal,
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::LtEq => ord != Ordering::Greater,
        BinaryOp::Gt => ord == Ordering::Greater,
        _ => ord != Ordering::Less,
    }))
}

fn arithmetic(op: BinaryOp, l: SqlType, r: SqlType) -> Eval {
    match (&l, &r) {
        (SqlType::I64(a), SqlType::I64(b)) => {
            let (a, b) = (*a, *b);
            let out = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div | BinaryOp::Mod if b == 0 => {
                    return Err(type_err("division by zero".into()))
                }
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Mod => a.checked_rem(b),
                _ => None,
            };
            out.map(SqlType::I64)
                .ok_or_else(|| type_err(format!("integer overflow in {op:?}")))
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => Ok(SqlType::F64(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                _ => a % b,
            })),
            _ => Err(type_err(format!(
                "cannot apply {op:?} to {} and {}",
                l.kind_name(),
                r.kind_name()
            ))),
        },
    }
}

#[derive(Debug, Clone, Copy)]
enum Function {
    Upper,
    Lower,
    Length,
    Abs,
    Concat,
    Coalesce,
}

impl Function {
    fn resolve(name: &str, arity: usize) -> Result<Self, CompileError> {
        let (f, ok) = match name.to_ascii_lowercase().as_str() {
            "upper" => (Function::Upper, arity == 1),
            "lower" => (Function::Lower, arity == 1),
            "length" => (Function::Length, arity == 1),
            "abs" => (Function::Abs, arity == 1),
            "concat" => (Function::Concat, true),
            "coalesce" => (Function::Coalesce, arity >= 1),
            other => return Err(CompileError::Expression(format!("unknown function '{other}'"))),
        };
        if !ok {
            return Err(CompileError::Expression(format!(
                "function '{name}' does not take {arity} argument(s)"
            )));
        }
        Ok(f)
    }

    fn apply(self, mut args: Vec<SqlType>) -> Eval {
        match self {
            Function::Concat => Ok(SqlType::Str(
                args.iter()
                    .filter(|v| !v.is_null())
                    .map(|v| v.to_string())
                    .collect(),
            )),
            Function::Coalesce => Ok(args
                .into_iter()
                .find(|v| !v.is_null())
                .unwrap_or(SqlType::Null)),
            unary => {
                let v = args.pop().unwrap_or(SqlType::Null);
                match (unary, v) {
                    (_, SqlType::Null) => Ok(SqlType::Null),
                    (Function::Upper, SqlType::Str(s)) => Ok(SqlType::Str(s.to_uppercase())),
                    (Function::Lower, SqlType::Str(s)) => Ok(SqlType::Str(s.to_lowercase())),
                    (Function::Length, SqlType::Str(s)) => Ok(SqlType::I64(s.chars().count() as i64)),
                    (Function::Length, SqlType::Bin(b)) => Ok(SqlType::I64(b.len() as i64)),
                    (Function::Abs, SqlType::I64(i)) => i
                        .checked_abs()
                        .map(SqlType::I64)
                        .ok_or_else(|| type_err("integer overflow in abs".into())),
                    (Function::Abs, SqlType::F64(f)) => Ok(SqlType::F64(f.abs())),
                    (f, v) => Err(type_err(format!(
                        "{f:?} is not defined for {}",
                        v.kind_name()
                    ))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;
    use flowsql_core::row;

    fn eval(term: TermEx, row: &Row) -> SqlType {
        DefaultExpressionCompiler.compile(&term).unwrap()(row).unwrap()
    }

    #[test]
    fn comparison_promotes_numbers() {
        let r = row! { "a" => 2i64, "f" => 1.5f64 };
        let gt = TermEx::binary(BinaryOp::Gt, TermEx::column("a"), TermEx::column("f"));
        assert_eq!(eval(gt, &r), SqlType::Bool(true));
        let eq = TermEx::binary(BinaryOp::Eq, TermEx::column("a"), TermEx::lit(Literal::Float(2.0)));
        assert_eq!(eval(eq, &r), SqlType::Bool(true));
    }

    #[test]
    fn comparing_unrelated_kinds_is_unknown() {
        let r = row! { "s" => "x" };
        let gt = TermEx::binary(BinaryOp::Gt, TermEx::column("s"), TermEx::int(1));
        assert_eq!(eval(gt, &r), SqlType::Null);
        let ne = TermEx::binary(BinaryOp::NotEq, TermEx::column("s"), TermEx::int(1));
        assert_eq!(eval(ne, &r), SqlType::Null);
    }

    #[test]
    fn arithmetic_stays_integral_until_mixed() {
        let r = row! { "a" => 7i64 };
        let add = TermEx::binary(BinaryOp::Add, TermEx::column("a"), TermEx::int(3));
        assert_eq!(eval(add, &r), SqlType::I64(10));
        let div = TermEx::binary(BinaryOp::Div, TermEx::column("a"), TermEx::lit(Literal::Float(2.0)));
        assert_eq!(eval(div, &r), SqlType::F64(3.5));
    }

    #[test]
    fn division_by_zero_errors() {
        let f = DefaultExpressionCompiler
            .compile(&TermEx::binary(BinaryOp::Div, TermEx::int(1), TermEx::int(0)))
            .unwrap();
        assert!(f(&Row::new()).is_err());
    }

    #[test]
    fn three_valued_logic() {
        let r = row! { "t" => true, "f" => false }.with("n", SqlType::Null);
        let and = |a: &str, b: &str| TermEx::binary(BinaryOp::And, TermEx::column(a), TermEx::column(b));
        let or = |a: &str, b: &str| TermEx::binary(BinaryOp::Or, TermEx::column(a), TermEx::column(b));

        assert_eq!(eval(and("n", "f"), &r), SqlType::Bool(false));
        assert_eq!(eval(and("n", "t"), &r), SqlType::Null);
        assert_eq!(eval(or("n", "t"), &r), SqlType::Bool(true));
        assert_eq!(eval(or("n", "f"), &r), SqlType::Null);
    }

    #[test]
    fn and_short_circuits_before_missing_column() {
        let r = row! { "f" => false };
        let t = TermEx::binary(BinaryOp::And, TermEx::column("f"), TermEx::column("missing"));
        assert_eq!(eval(t, &r), SqlType::Bool(false));
    }

    #[test]
    fn null_comparisons_yield_null() {
        let r = Row::new().with("n", SqlType::Null);
        let t = TermEx::binary(BinaryOp::Eq, TermEx::column("n"), TermEx::int(1));
        assert_eq!(eval(t, &r), SqlType::Null);
        let is_null = TermEx::IsNull {
            term: Box::new(TermEx::column("n")),
            negated: false,
        };
        assert_eq!(eval(is_null, &r), SqlType::Bool(true));
    }

    #[test]
    fn scalar_functions() {
        let r = row! { "s" => "Hello", "i" => -4i64 }.with("n", SqlType::Null);
        assert_eq!(eval(TermEx::call("upper", vec![TermEx::column("s")]), &r), SqlType::from("HELLO"));
        assert_eq!(eval(TermEx::call("length", vec![TermEx::column("s")]), &r), SqlType::I64(5));
        assert_eq!(eval(TermEx::call("abs", vec![TermEx::column("i")]), &r), SqlType::I64(4));
        assert_eq!(
            eval(
                TermEx::call("concat", vec![TermEx::column("s"), TermEx::column("n"), TermEx::str("!")]),
                &r
            ),
            SqlType::from("Hello!")
        );
        assert_eq!(
            eval(TermEx::call("coalesce", vec![TermEx::column("n"), TermEx::int(9)]), &r),
            SqlType::I64(9)
        );
    }

    #[test]
    fn unknown_function_fails_at_compile_time() {
        let err = DefaultExpressionCompiler
            .compile(&TermEx::call("frobnicate", vec![]))
            .err()
            .unwrap();
        assert!(err.to_string().contains("frobnicate"));
    }

    #[test]
    fn missing_column_is_row_error() {
        let f = DefaultExpressionCompiler.compile(&TermEx::column("a.b")).unwrap();
        let err = f(&row! { "a" => 1i64 }).unwrap_err();
        assert!(matches!(err, CoreError::ColumnNotFound(ref c) if c == "a.b"));
    }
}
