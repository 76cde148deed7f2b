//! Row decoders: turn the bytes of one stored object into rows.
//!
//! A decoder is resolved once per source stage (see `registry`) and shared by
//! every worker reading that source, so implementations hold only configuration.

mod csv;
mod jsonl;
mod text;

pub use self::csv::CsvDecoder;
pub use self::jsonl::JsonlDecoder;
pub use self::text::TextDecoder;

use std::io::Read;

use flowsql_core::types::{Row, SqlType};

use crate::error::Result;

pub trait RowDecoder: Send + Sync {
    /// Registry name of this decoder (stable).
    fn name(&self) -> &'static str;

    /// Decode every row held by one object.
    fn extract(&self, stream: &mut dyn Read) -> Result<Vec<Row>>;
}

/// Typed view of a textual cell: empty → Null, then bool, i64, f64, falling back to string.
pub fn infer_cell(raw: &str) -> SqlType {
    if raw.is_empty() {
        return SqlType::Null;
    }
    if raw.eq_ignore_ascii_case("true") {
        return SqlType::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return SqlType::Bool(false);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return SqlType::I64(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return SqlType::F64(f);
    }
    SqlType::Str(raw.to_string())
}
