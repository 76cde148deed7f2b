//! Multi-key sort operator.
//!
//! Each key contributes a comparator derived from its direction (`<` for
//! ascending, `>` for descending). Rows are compared key by key in priority
//! order; the first non-equal key decides. The sort is stable, so rows equal on
//! every key keep their incoming relative order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use flowsql_core::types::{Row, SqlType};

use crate::traits::{OpError, OpKind, Operator, Partition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Value comparator for one sort key.
pub type Comparator = fn(&SqlType, &SqlType) -> Ordering;

fn ascending(a: &SqlType, b: &SqlType) -> Ordering {
    a.sql_cmp(b)
}

fn descending(a: &SqlType, b: &SqlType) -> Ordering {
    b.sql_cmp(a)
}

impl SortDirection {
    pub fn comparator(self) -> Comparator {
        match self {
            SortDirection::Ascending => ascending,
            SortDirection::Descending => descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
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

#[derive(Debug, Clone)]
pub struct Sort {
    columns: Vec<String>,
    comparators: Vec<Comparator>,
}

impl Sort {
    pub fn new(keys: &[SortKey]) -> Self {
        Self {
            columns: keys.iter().map(|k| k.column.clone()).collect(),
            comparators: keys.iter().map(|k| k.direction.comparator()).collect(),
        }
    }

    fn compare(&self, a: &[SqlType], b: &[SqlType]) -> Ordering {
        for ((x, y), cmp) in a.iter().zip(b.iter()).zip(&self.comparators) {
            match cmp(x, y) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        Ordering::Equal
    }
}

impl Operator for Sort {
    fn name(&self) -> &'static str {
        "sort"
    }

    fn kind(&self) -> OpKind {
        OpKind::Wide
    }

    fn eval_block(&self, rows: Partition) -> Result<Partition, OpError> {
        if self.columns.is_empty() {
            return Ok(rows);
        }

        // Extract sort tuples up front so a missing column surfaces as an error.
        let mut keyed: Vec<(Vec<SqlType>, Row)> = rows
            .into_iter()
            .map(|row| {
                let key = self
                    .columns
                    .iter()
                    .map(|c| row.lookup(c).cloned())
                    .collect::<flowsql_core::Result<Vec<_>>>()?;
                Ok((key, row))
            })
            .collect::<Result<Vec<_>, OpError>>()?;

        keyed.sort_by(|(a, _), (b, _)| self.compare(a, b));

        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }
}
