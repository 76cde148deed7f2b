use thiserror::Error;

/// Result type local to flowsql-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage configuration: {0}")]
    Config(String),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("object store error: {0}")]
    Storage(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Core(#[from] flowsql_core::Error),
}
