//! Error types for SurrealDB storage

use issuebench_core::RepositoryError;
use thiserror::Error;

/// SurrealDB storage error type
#[derive(Error, Debug)]
pub enum SurrealError {
    /// The private runtime could not be started
    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    /// Database could not be opened or selected
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution or result extraction failed
    #[error("Query error: {0}")]
    Query(#[from] surrealdb::Error),
}

/// Result type for SurrealDB operations
pub type SurrealResult<T> = Result<T, SurrealError>;

impl From<SurrealError> for RepositoryError {
    fn from(err: SurrealError) -> Self {
        match err {
            SurrealError::Runtime(e) => Self::Initialization(e.to_string()),
            SurrealError::Connection(msg) => Self::Initialization(msg),
            SurrealError::Query(e) => Self::Backend(e.to_string()),
        }
    }
}
