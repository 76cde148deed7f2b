//! Newline-delimited JSON decoder: one object per non-blank line.

use std::io::{BufRead, BufReader, Read};

use flowsql_core::types::{Row, SqlType};

use super::RowDecoder;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlDecoder;

impl RowDecoder for JsonlDecoder {
    fn name(&self) -> &'static str {
        "jsonl"
    }

    fn extract(&self, stream: &mut dyn Read) -> Result<Vec<Row>> {
        let reader = BufReader::new(stream);
        let mut rows = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let value: serde_json::Value = serde_json::from_str(&line)?;
            let obj = value.as_object().ok_or_else(|| {
                Error::Codec(format!("jsonl line {} is not an object", lineno + 1))
            })?;
            rows.push(
                obj.iter()
                    .map(|(k, v)| (k.clone(), SqlType::from_json(v)))
                    .collect(),
            );
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_lines() {
        let data = "{\"a\":1,\"b\":\"x\"}\n\n{\"a\":2.5}\n";
        let rows = JsonlDecoder.extract(&mut data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("a"), Some(&SqlType::F64(2.5)));
        assert!(rows[1].get("b").is_none());
    }

    #[test]
    fn non_object_line_is_error() {
        let err = JsonlDecoder.extract(&mut "[1,2]\n".as_bytes()).err().unwrap();
        assert!(err.to_string().contains("line 1"));
    }
}
