//! CSV decoder. The first record names the columns unless `has_headers=false`,
//! in which case columns are named `c0`, `c1`, ...

use std::collections::HashSet;
use std::io::Read;

use flowsql_core::types::Row;

use super::{infer_cell, RowDecoder};
use crate::error::{Error, Result};
use crate::registry::CodecConfig;

#[derive(Debug, Clone)]
pub struct CsvDecoder {
    delimiter: u8,
    has_headers: bool,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
        }
    }
}

impl CsvDecoder {
    /// Options: `delimiter` (single byte, `\t` allowed), `has_headers` (bool).
    pub fn from_config(cfg: &CodecConfig) -> Result<Self> {
        let mut dec = Self::default();
        if let Some(d) = cfg.get_byte("delimiter")? {
            dec.delimiter = d;
        }
        if let Some(h) = cfg.get_bool("has_headers")? {
            dec.has_headers = h;
        }
        Ok(dec)
    }
}

impl RowDecoder for CsvDecoder {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extract(&self, stream: &mut dyn Read) -> Result<Vec<Row>> {
        let mut rdr = ::csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(self.has_headers)
            .from_reader(stream);

        let headers: Option<Vec<String>> = if self.has_headers {
            let names: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
            let mut seen = HashSet::new();
            if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
                return Err(Error::Codec(format!("duplicate csv header '{dup}'")));
            }
            Some(names)
        } else {
            None
        };

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let row: Row = match &headers {
                Some(names) => {
                    if record.len() != names.len() {
                        return Err(Error::Codec(format!(
                            "csv record has {} fields, header has {}",
                            record.len(),
                            names.len()
                        )));
                    }
                    names
                        .iter()
                        .zip(record.iter())
                        .map(|(n, v)| (n.clone(), infer_cell(v)))
                        .collect()
                }
                None => record
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (format!("c{i}"), infer_cell(v)))
                    .collect(),
            };
            rows.push(row);
        }
        Ok(rows)
    }
}
