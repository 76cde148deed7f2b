//! Query AST.
//!
//! Every node category is a closed enum; stages match on them exhaustively.
//! The serde shape (internally tagged with `kind`/`statement`) is what the YAML
//! DSL reads.

use serde::{Deserialize, Serialize};

use flowsql_core::types::SqlType;
use flowsql_io::CodecConfig;
use flowsql_operators::SortDirection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "statement", rename_all = "snake_case")]
pub enum Statement {
    Query(Query),
    Insert { table: String },
    Delete { table: String },
}

impl Statement {
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Query(_) => "query",
            Statement::Insert { .. } => "insert",
            Statement::Delete { .. } => "delete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub from: FromEx,
    #[serde(default)]
    pub joins: Vec<JoinEx>,
    #[serde(default)]
    pub filters: Option<TermEx>,
    #[serde(default)]
    pub group_by: Vec<TermEx>,
    #[serde(default)]
    pub order_by: Vec<OrderEx>,
    #[serde(default = "star_projection")]
    pub projection: Vec<ProjectionEx>,
    #[serde(default)]
    pub destination: Option<DestinationEx>,
}

fn star_projection() -> Vec<ProjectionEx> {
    vec![ProjectionEx::star()]
}

impl Query {
    /// `SELECT * FROM <from>` with nothing else set.
    pub fn select_all(from: FromEx) -> Self {
        Self {
            from,
            joins: Vec::new(),
            filters: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            projection: star_projection(),
            destination: None,
        }
    }

    pub fn with_filter(mut self, term: TermEx) -> Self {
        self.filters = Some(term);
        self
    }

    pub fn with_projection(mut self, projection: Vec<ProjectionEx>) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_order(mut self, order_by: Vec<OrderEx>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_destination(mut self, destination: DestinationEx) -> Self {
        self.destination = Some(destination);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromEx {
    pub origin: OriginEx,
    #[serde(default)]
    pub alias: Option<String>,
}

impl FromEx {
    pub fn new(origin: OriginEx) -> Self {
        Self {
            origin,
            alias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OriginEx {
    ResultSet { name: String },
    DataSource { path: String, extractor: Extractor },
}

impl OriginEx {
    pub fn result_set(name: impl Into<String>) -> Self {
        OriginEx::ResultSet { name: name.into() }
    }

    pub fn data_source(path: impl Into<String>, extractor: impl Into<String>) -> Self {
        OriginEx::DataSource {
            path: path.into(),
            extractor: Extractor::new(extractor),
        }
    }

    /// Name or path, for messages.
    pub fn describe(&self) -> &str {
        match self {
            OriginEx::ResultSet { name } => name,
            OriginEx::DataSource { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extractor {
    pub name: String,
    #[serde(default)]
    pub config: CodecConfig,
}

impl Extractor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: CodecConfig::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Writer {
    pub name: String,
    #[serde(default)]
    pub config: CodecConfig,
}

impl Writer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: CodecConfig::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationEx {
    ResultSet { name: String },
    Folder { path: String, writer: Writer },
}

impl DestinationEx {
    pub fn result_set(name: impl Into<String>) -> Self {
        DestinationEx::ResultSet { name: name.into() }
    }

    pub fn folder(path: impl Into<String>, writer: impl Into<String>) -> Self {
        DestinationEx::Folder {
            path: path.into(),
            writer: Writer::new(writer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionEx {
    Projection {
        term: TermEx,
        #[serde(default)]
        alias: Option<String>,
    },
    Distinct {
        inner: Vec<ProjectionEx>,
    },
    Top {
        count: usize,
        inner: Vec<ProjectionEx>,
    },
}

impl ProjectionEx {
    pub fn star() -> Self {
        Self::term(TermEx::column("*"))
    }

    pub fn column(name: &str) -> Self {
        Self::term(TermEx::column(name))
    }

    pub fn term(term: TermEx) -> Self {
        ProjectionEx::Projection { term, alias: None }
    }

    pub fn aliased(term: TermEx, alias: impl Into<String>) -> Self {
        ProjectionEx::Projection {
            term,
            alias: Some(alias.into()),
        }
    }

    pub fn distinct(inner: Vec<ProjectionEx>) -> Self {
        ProjectionEx::Distinct { inner }
    }

    pub fn top(count: usize, inner: Vec<ProjectionEx>) -> Self {
        ProjectionEx::Top { count, inner }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEx {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderEx {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Parsed but never compiled; queries carrying joins are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinEx {
    pub from: FromEx,
    pub on: TermEx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Neg,
}

/// A literal scalar as written in a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&Literal> for SqlType {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::Null => SqlType::Null,
            Literal::Bool(b) => SqlType::Bool(*b),
            Literal::Int(i) => SqlType::I64(*i),
            Literal::Float(f) => SqlType::F64(*f),
            Literal::Str(s) => SqlType::Str(s.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TermEx {
    /// Column reference; components are joined with `.` to form the row key.
    Column { components: Vec<String> },
    Literal { value: Literal },
    Unary { op: UnaryOp, term: Box<TermEx> },
    Binary {
        op: BinaryOp,
        left: Box<TermEx>,
        right: Box<TermEx>,
    },
    IsNull {
        term: Box<TermEx>,
        #[serde(default)]
        negated: bool,
    },
    Call { function: String, args: Vec<TermEx> },
}

impl TermEx {
    /// `"a.b"` becomes components `["a", "b"]`.
    pub fn column(name: &str) -> Self {
        TermEx::Column {
            components: name.split('.').map(str::to_string).collect(),
        }
    }

    pub fn lit(value: Literal) -> Self {
        TermEx::Literal { value }
    }

    pub fn int(v: i64) -> Self {
        Self::lit(Literal::Int(v))
    }

    pub fn str(v: &str) -> Self {
        Self::lit(Literal::Str(v.to_string()))
    }

    pub fn binary(op: BinaryOp, left: TermEx, right: TermEx) -> Self {
        TermEx::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(function: &str, args: Vec<TermEx>) -> Self {
        TermEx::Call {
            function: function.to_string(),
            args,
        }
    }

    /// The joined column name if this is a plain column reference.
    pub fn column_name(&self) -> Option<String> {
        match self {
            TermEx::Column { components } => Some(components.join(".")),
            _ => None,
        }
    }
}
