//! CSV writer. The header comes from the first row written; later rows must not
//! introduce new columns (missing ones are written as empty cells).

use std::io::Write;

use flowsql_core::types::{Row, SqlType};

use super::{RowEncoder, RowWriter};
use crate::error::{Error, Result};
use crate::registry::CodecConfig;

#[derive(Debug, Clone)]
pub struct CsvWriter {
    delimiter: u8,
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvWriter {
    /// Option: `delimiter` (single byte, `\t` allowed).
    pub fn from_config(cfg: &CodecConfig) -> Result<Self> {
        let mut w = Self::default();
        if let Some(d) = cfg.get_byte("delimiter")? {
            w.delimiter = d;
        }
        Ok(w)
    }
}

impl RowWriter for CsvWriter {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extension(&self) -> &'static str {
        "csv"
    }

    fn open(&self, sink: Box<dyn Write + Send>) -> Result<Box<dyn RowEncoder>> {
        let writer = ::csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(sink);
        Ok(Box::new(CsvEncoder {
            writer,
            header: None,
        }))
    }
}

struct CsvEncoder {
    writer: ::csv::Writer<Box<dyn Write + Send>>,
    header: Option<Vec<String>>,
}

fn cell(v: Option<&SqlType>) -> String {
    match v {
        None | Some(SqlType::Null) => String::new(),
        Some(other) => other.to_string(),
    }
}

impl RowEncoder for CsvEncoder {
    fn write_row(&mut self, row: &Row) -> Result<()> {
        if self.header.is_none() {
            let names: Vec<String> = row.names().map(str::to_string).collect();
            self.writer.write_record(&names)?;
            self.header = Some(names);
        }
        let Some(header) = self.header.as_ref() else {
            return Err(Error::Codec("csv header missing".into()));
        };

        if let Some(extra) = row.names().find(|n| !header.iter().any(|h| h == n)) {
            return Err(Error::Codec(format!(
                "column '{extra}' is not part of the csv header"
            )));
        }

        let record: Vec<String> = header.iter().map(|h| cell(row.get(h))).collect();
        self.writer.write_record(&record)?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
