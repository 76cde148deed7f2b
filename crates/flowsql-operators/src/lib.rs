#![forbid(unsafe_code)]
//! flowsql-operators: row operators composed into pipelines by `flowsql-exec`.
//!
//! Design intent:
//! - Keep this crate pure and synchronous (no async, no IO).
//! - Narrow operators (filter, map) see one partition at a time and may run in
//!   parallel; wide operators (distinct, take, sort) see the whole row set with
//!   partitions concatenated in partition order.

pub mod traits;

pub mod distinct;
pub mod filter;
pub mod map;
pub mod sort;
pub mod take;

pub use distinct::Distinct;
pub use filter::{Filter, RowPredicate};
pub use map::Map;
pub use sort::{Sort, SortDirection, SortKey};
pub use take::Take;
pub use traits::{OpError, OpKind, Operator, Partition};
