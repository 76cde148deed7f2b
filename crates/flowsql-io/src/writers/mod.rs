//! Row encoders: stream rows into one output object.
//!
//! A `RowWriter` is the name-resolved capability (shared, configuration only);
//! `open` binds it to a sink and yields a `RowEncoder` owned by a single worker.

mod csv;
mod jsonl;

pub use self::csv::CsvWriter;
pub use self::jsonl::JsonlWriter;

use std::io::Write;

use flowsql_core::types::Row;

use crate::error::Result;

pub trait RowWriter: Send + Sync {
    /// Registry name of this writer (stable).
    fn name(&self) -> &'static str;

    /// File extension for objects this writer produces (without the dot).
    fn extension(&self) -> &'static str;

    /// Bind the writer to an output stream.
    fn open(&self, sink: Box<dyn Write + Send>) -> Result<Box<dyn RowEncoder>>;
}

pub trait RowEncoder: Send {
    fn write_row(&mut self, row: &Row) -> Result<()>;

    /// Flush buffered output and release the sink.
    fn close(self: Box<Self>) -> Result<()>;
}
