//! Error types for redb storage

use issuebench_core::RepositoryError;
use thiserror::Error;

/// redb storage error type
#[derive(Error, Debug)]
pub enum RedbError {
    /// Database file could not be opened or checked
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    /// Issue could not be encoded for storage
    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Stored bytes could not be decoded into an issue
    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// An issue with this id is already stored
    #[error("Duplicate issue id: {0}")]
    DuplicateId(String),
}

/// Result type for redb operations
pub type RedbResult<T> = Result<T, RedbError>;

impl From<RedbError> for RepositoryError {
    fn from(err: RedbError) -> Self {
        match err {
            RedbError::Encode(_) | RedbError::Decode(_) => Self::Serialization(err.to_string()),
            other => Self::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_maps_to_serialization() {
        let err = RedbError::Decode(bincode::error::DecodeError::UnexpectedEnd { additional: 4 });
        let repo_err: RepositoryError = err.into();
        assert_eq!(repo_err.classification(), "SerializationError");
    }

    #[test]
    fn test_duplicate_id_maps_to_backend() {
        let repo_err: RepositoryError = RedbError::DuplicateId("abc".into()).into();
        assert_eq!(repo_err.classification(), "BackendError");
        assert!(repo_err.to_string().contains("abc"));
    }

    #[test]
    fn test_storage_maps_to_backend() {
        let err = RedbError::Storage(redb::StorageError::Corrupted("bad page".into()));
        let repo_err: RepositoryError = err.into();
        assert_eq!(repo_err.classification(), "BackendError");
    }
}
