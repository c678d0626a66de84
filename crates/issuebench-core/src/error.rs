//! Error types shared by every backend adapter

use thiserror::Error;

/// Error type for repository operations
///
/// Every adapter converts its engine-level errors into this type, so callers
/// (the benchmark runner and the crash controller) can classify failures
/// without knowing which backend produced them.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The on-disk artifact could not be created or opened
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// An encoded details blob could not be decoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A native integrity check reported something other than "ok"
    #[error("Integrity check failed: {0}")]
    IntegrityCheckFailed(String),

    /// Unknown backend identifier
    #[error("Unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// Operation called before `init()` or after `close()`
    #[error("Repository not initialized: {0}")]
    NotInitialized(String),

    /// Engine error during a read or write
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Record (de)serialization error outside the flat codec
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl RepositoryError {
    /// Create a generic backend error
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an initialization error
    pub fn initialization<S: Into<String>>(msg: S) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Stable classification name, printed by the crash controller
    pub fn classification(&self) -> &'static str {
        match self {
            Self::Initialization(_) => "InitializationError",
            Self::Codec(_) => "CodecError",
            Self::IntegrityCheckFailed(_) => "IntegrityCheckFailed",
            Self::UnsupportedBackend(_) => "UnsupportedBackend",
            Self::NotInitialized(_) => "NotInitialized",
            Self::Backend(_) => "BackendError",
            Self::Serialization(_) => "SerializationError",
        }
    }
}

/// Error decoding a flat-codec details blob
///
/// `line` is 1-based within the blob.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("line {line}: unknown record tag '{tag}'")]
    UnknownTag { line: usize, tag: char },

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: primary location must start with 'P|', found '{token}'")]
    MalformedPrimary { line: usize, token: String },

    #[error("line {line}: expected a location token starting with 'L', found '{token}'")]
    ExpectedLocation { line: usize, token: String },

    #[error("line {line}: invalid integer '{value}'")]
    InvalidInteger { line: usize, value: String },

    #[error("line {line}: text field lacks the presence marker")]
    MissingMarker { line: usize },

    #[error("line {line}: invalid base64 in text field")]
    InvalidBase64 { line: usize },

    #[error("line {line}: text field is not valid UTF-8")]
    InvalidUtf8 { line: usize },
}
