//! Streaming NDJSON writer.

use std::io::{BufWriter, Write};

use flowsql_core::types::Row;

use super::{RowEncoder, RowWriter};
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlWriter;

impl RowWriter for JsonlWriter {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn extension(&self) -> &'static str {
        "jsonl"
    }

    fn open(&self, sink: Box<dyn Write + Send>) -> Result<Box<dyn RowEncoder>> {
        Ok(Box::new(JsonlEncoder {
            writer: BufWriter::new(sink),
        }))
    }
}

struct JsonlEncoder {
    writer: BufWriter<Box<dyn Write + Send>>,
}

impl RowEncoder for JsonlEncoder {
    /// Write one JSON object per line; keys follow the row's column order.
    fn write_row(&mut self, row: &Row) -> Result<()> {
        let obj: serde_json::Map<String, serde_json::Value> = row
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_json()))
            .collect();
        let line = serde_json::to_string(&obj)?;
        writeln!(self.writer, "{}", line)?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
