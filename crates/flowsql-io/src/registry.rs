//! Name → factory registry for row decoders and writers.
//!
//! Queries name their codecs (`Extractor("csv")`, `Writer("jsonl")`); the planner
//! resolves the name once per stage and hands the resulting capability to every
//! worker. Names are matched case-insensitively.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::readers::{CsvDecoder, JsonlDecoder, RowDecoder, TextDecoder};
use crate::writers::{CsvWriter, JsonlWriter, RowWriter};

/// String options for a codec. Parameterless codecs get an empty config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodecConfig(BTreeMap<String, String>);

impl CodecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Single-byte option (e.g. a delimiter).
    pub fn get_byte(&self, key: &str) -> Result<Option<u8>> {
        match self.get(key) {
            None => Ok(None),
            Some("\\t") => Ok(Some(b'\t')),
            Some(s) if s.len() == 1 => Ok(Some(s.as_bytes()[0])),
            Some(s) => Err(Error::Codec(format!(
                "option '{key}' must be a single byte, got '{s}'"
            ))),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(s) => s
                .parse::<bool>()
                .map(Some)
                .map_err(|_| Error::Codec(format!("option '{key}' must be true/false, got '{s}'"))),
        }
    }
}

pub type DecoderFactory = Arc<dyn Fn(&CodecConfig) -> Result<Arc<dyn RowDecoder>> + Send + Sync>;
pub type WriterFactory = Arc<dyn Fn(&CodecConfig) -> Result<Arc<dyn RowWriter>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CodecRegistry {
    decoders: HashMap<String, DecoderFactory>,
    writers: HashMap<String, WriterFactory>,
}

impl CodecRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in codecs: decoders `csv`, `jsonl`, `text`; writers `csv`, `jsonl`.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        reg.register_decoder("csv", |cfg| {
            Ok(Arc::new(CsvDecoder::from_config(cfg)?) as Arc<dyn RowDecoder>)
        });
        reg.register_decoder("jsonl", |_| Ok(Arc::new(JsonlDecoder) as Arc<dyn RowDecoder>));
        reg.register_decoder("text", |cfg| {
            Ok(Arc::new(TextDecoder::from_config(cfg)) as Arc<dyn RowDecoder>)
        });
        reg.register_writer("csv", |cfg| {
            Ok(Arc::new(CsvWriter::from_config(cfg)?) as Arc<dyn RowWriter>)
        });
        reg.register_writer("jsonl", |_| Ok(Arc::new(JsonlWriter) as Arc<dyn RowWriter>));
        reg
    }

    pub fn register_decoder<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&CodecConfig) -> Result<Arc<dyn RowDecoder>> + Send + Sync + 'static,
    {
        self.decoders
            .insert(name.to_ascii_lowercase(), Arc::new(factory));
    }

    pub fn register_writer<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&CodecConfig) -> Result<Arc<dyn RowWriter>> + Send + Sync + 'static,
    {
        self.writers.insert(name.to_ascii_lowercase(), Arc::new(factory));
    }

    pub fn resolve_decoder(&self, name: &str, cfg: &CodecConfig) -> Result<Arc<dyn RowDecoder>> {
        let factory = self
            .decoders
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::Codec(format!("unknown extractor '{name}'")))?;
        tracing::debug!(codec = name, options = ?cfg, "resolved decoder");
        factory(cfg)
    }

    pub fn resolve_writer(&self, name: &str, cfg: &CodecConfig) -> Result<Arc<dyn RowWriter>> {
        let factory = self
            .writers
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::Codec(format!("unknown writer '{name}'")))?;
        tracing::debug!(codec = name, options = ?cfg, "resolved writer");
        factory(cfg)
    }

    pub fn decoder_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.decoders.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn writer_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.writers.keys().cloned().collect();
        names.sort();
        names
    }
}
