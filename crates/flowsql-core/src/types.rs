//! Row model: typed scalar values (`SqlType`) and immutable rows keyed by column name.
//!
//! Rows are never mutated in place; every transformation produces a new row.
//! `SqlType` carries a total order and an `Eq`/`Hash` pair consistent with it so
//! that whole-row equality can drive set operators (distinct). Query-level
//! comparisons and ORDER BY use `compare_values`/`sql_cmp`, which also compare
//! integers with floats.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A compiled expression: evaluates against one row and yields a scalar.
pub type RowFn = Arc<dyn Fn(&Row) -> Result<SqlType> + Send + Sync>;

/// A compiled row rewrite (projection).
pub type RowMapFn = Arc<dyn Fn(&Row) -> Result<Row> + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SqlType {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    Bin(Vec<u8>),
}

impl SqlType {
    /// Canonical logical true; predicates match only on this exact value.
    pub const TRUE: SqlType = SqlType::Bool(true);

    pub fn is_null(&self) -> bool {
        matches!(self, SqlType::Null)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, SqlType::Bool(true))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlType::Null => "null",
            SqlType::Bool(_) => "bool",
            SqlType::I64(_) => "i64",
            SqlType::F64(_) => "f64",
            SqlType::Str(_) => "string",
            SqlType::Bin(_) => "binary",
        }
    }

    /// Numeric view used for arithmetic promotion.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlType::I64(i) => Some(*i as f64),
            SqlType::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlType::Str(s) => Some(s),
            _ => None,
        }
    }

    /// SQL comparison: integers and floats compare numerically, other kinds
    /// only against their own kind. `None` when the kinds are incomparable.
    pub fn compare_values(&self, other: &SqlType) -> Option<Ordering> {
        use SqlType::*;
        match (self, other) {
            (I64(a), F64(b)) => Some(f64_cmp(*a as f64, *b)),
            (F64(a), I64(b)) => Some(f64_cmp(*a, *b as f64)),
            _ if self.rank() == other.rank() => Some(self.cmp(other)),
            _ => None,
        }
    }

    /// Total order for sorting: `compare_values` where defined, kind rank otherwise.
    /// Nulls sort first.
    pub fn sql_cmp(&self, other: &SqlType) -> Ordering {
        self.compare_values(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }

    /// Rank used to order values of different kinds.
    fn rank(&self) -> u8 {
        match self {
            SqlType::Null => 0,
            SqlType::Bool(_) => 1,
            SqlType::I64(_) => 2,
            SqlType::F64(_) => 3,
            SqlType::Str(_) => 4,
            SqlType::Bin(_) => 5,
        }
    }

    /// Convert from a JSON value. Arrays and objects are kept as their JSON text.
    pub fn from_json(v: &serde_json::Value) -> Self {
        use serde_json::Value;
        match v {
            Value::Null => SqlType::Null,
            Value::Bool(b) => SqlType::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlType::I64(i),
                None => SqlType::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => SqlType::Str(s.clone()),
            other => SqlType::Str(other.to_string()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            SqlType::Null => Value::Null,
            SqlType::Bool(b) => Value::Bool(*b),
            SqlType::I64(i) => Value::from(*i),
            SqlType::F64(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            SqlType::Str(s) => Value::String(s.clone()),
            SqlType::Bin(b) => Value::String(hex(b)),
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut s = String::with_capacity(2 + bytes.len() * 2);
    s.push_str("0x");
    for b in bytes {
        let _ = write!(&mut s, "{:02x}", b);
    }
    s
}

/// Float comparison with NaN sorted after every other value.
fn f64_cmp(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

impl Ord for SqlType {
    fn cmp(&self, other: &Self) -> Ordering {
        use SqlType::*;
        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Bool(x), Bool(y)) => x.cmp(y),
            (I64(x), I64(y)) => x.cmp(y),
            (F64(x), F64(y)) => f64_cmp(*x, *y),
            (Str(x), Str(y)) => x.cmp(y),
            (Bin(x), Bin(y)) => x.cmp(y),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SqlType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SqlType {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SqlType {}

impl Hash for SqlType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            SqlType::Null => {}
            SqlType::Bool(b) => b.hash(state),
            SqlType::I64(i) => i.hash(state),
            SqlType::F64(f) => {
                // -0.0 == 0.0 and NaN == NaN under `cmp`, so hash their canonical bits.
                let canonical = if f.is_nan() {
                    f64::NAN
                } else if *f == 0.0 {
                    0.0
                } else {
                    *f
                };
                canonical.to_bits().hash(state)
            }
            SqlType::Str(s) => s.hash(state),
            SqlType::Bin(b) => b.hash(state),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Null => write!(f, "NULL"),
            SqlType::Bool(b) => write!(f, "{b}"),
            SqlType::I64(i) => write!(f, "{i}"),
            SqlType::F64(x) => write!(f, "{x}"),
            SqlType::Str(s) => write!(f, "{s}"),
            SqlType::Bin(b) => write!(f, "{}", hex(b)),
        }
    }
}

impl From<bool> for SqlType {
    fn from(v: bool) -> Self {
        SqlType::Bool(v)
    }
}

impl From<i64> for SqlType {
    fn from(v: i64) -> Self {
        SqlType::I64(v)
    }
}

impl From<f64> for SqlType {
    fn from(v: f64) -> Self {
        SqlType::F64(v)
    }
}

impl From<&str> for SqlType {
    fn from(v: &str) -> Self {
        SqlType::Str(v.to_string())
    }
}

impl From<String> for SqlType {
    fn from(v: String) -> Self {
        SqlType::Str(v)
    }
}

/// Immutable mapping from column name to value. Column names are unique by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: BTreeMap<String, SqlType>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&SqlType> {
        self.columns.get(name)
    }

    /// Like `get`, but a missing column is an error.
    pub fn lookup(&self, name: &str) -> Result<&SqlType> {
        self.columns
            .get(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Returns a new row with `name` set to `value` (replacing any previous entry).
    pub fn with(mut self, name: impl Into<String>, value: SqlType) -> Row {
        self.columns.insert(name.into(), value);
        self
    }

    /// Returns a new row holding every entry of `self` overlaid with every entry of `other`.
    pub fn merged(mut self, other: &Row) -> Row {
        for (k, v) in &other.columns {
            self.columns.insert(k.clone(), v.clone());
        }
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlType)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>> FromIterator<(K, SqlType)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, SqlType)>>(iter: I) -> Self {
        Row {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, SqlType);
    type IntoIter = std::collections::btree_map::IntoIter<String, SqlType>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Build a row from `name => value` pairs.
#[macro_export]
macro_rules! row {
    ($($name:expr => $value:expr),* $(,)?) => {
        <$crate::types::Row as ::std::iter::FromIterator<(String, $crate::types::SqlType)>>::from_iter(
            vec![$(($name.to_string(), $crate::types::SqlType::from($value))),*]
        )
    };
}
