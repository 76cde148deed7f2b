use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A referenced column is absent from the row mapping.
    #[error("column '{0}' not found in row")]
    ColumnNotFound(String),

    /// An operator received a value of a kind it cannot work with.
    #[error("type mismatch: {0}")]
    Type(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("Internal invariant failed: {0}")]
    Invariant(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialize(e.to_string())
    }
}
