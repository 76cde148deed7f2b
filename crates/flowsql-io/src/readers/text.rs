//! Whole-object text decoder: each object becomes a single row.

use std::io::Read;

use flowsql_core::types::{Row, SqlType};

use super::RowDecoder;
use crate::error::Result;
use crate::registry::CodecConfig;

#[derive(Debug, Clone)]
pub struct TextDecoder {
    column: String,
}

impl TextDecoder {
    /// Option `column` names the output column (default `content`).
    pub fn from_config(cfg: &CodecConfig) -> Self {
        Self {
            column: cfg.get("column").unwrap_or("content").to_string(),
        }
    }
}

impl RowDecoder for TextDecoder {
    fn name(&self) -> &'static str {
        "text"
    }

    fn extract(&self, stream: &mut dyn Read) -> Result<Vec<Row>> {
        let mut content = String::new();
        stream.read_to_string(&mut content)?;
        Ok(vec![Row::new().with(self.column.clone(), SqlType::Str(content))])
    }
}
