use thiserror::Error;

use flowsql_operators::OpError;

pub type Result<T> = std::result::Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("operation was cancelled")]
    Cancelled,

    #[error("operator exec: {0}")]
    Operator(#[from] OpError),

    #[error(transparent)]
    Io(#[from] flowsql_io::Error),

    #[error(transparent)]
    Core(#[from] flowsql_core::Error),

    #[error("persisted segment '{path}' failed checksum verification")]
    Corrupt { path: String },

    #[error("worker join: {0}")]
    Join(String),

    #[error("invalid plan: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ExecError {
    fn from(e: serde_json::Error) -> Self {
        ExecError::Core(e.into())
    }
}
