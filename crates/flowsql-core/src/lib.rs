#![forbid(unsafe_code)]
//! flowsql-core: row model, typed ids, configuration, and hashing.
//!
//! Everything above this crate (IO, operators, exec, planner) speaks in terms of
//! `Row`/`SqlType`. No async, IO, or operator logic lives here.

pub mod config;
pub mod error;
pub mod hash;
pub mod id;
pub mod prelude;
pub mod types;

pub use error::{Error, Result};
pub use types::{Row, RowFn, RowMapFn, SqlType};

/// Crate version, stamped into persisted segment headers.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
