use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Neither a named result set nor an object/container matched the origin.
    #[error("no file or directory was found for origin '{0}'")]
    SourceNotFound(String),

    #[error("unsupported query: {0}")]
    Unsupported(String),

    #[error("expression: {0}")]
    Expression(String),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Exec(#[from] flowsql_exec::ExecError),

    #[error(transparent)]
    Io(#[from] flowsql_io::Error),

    #[error(transparent)]
    Core(#[from] flowsql_core::Error),
}
