//! SQLite configuration

use std::path::{Path, PathBuf};

/// Journal flavor; each one is benchmarked as its own relational variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JournalMode {
    /// `journal_mode = WAL`, `synchronous = NORMAL`
    Wal,
    /// `journal_mode = DELETE`, `synchronous = FULL`
    Rollback,
}

impl JournalMode {
    /// Value for `PRAGMA journal_mode`
    pub fn pragma_value(&self) -> &'static str {
        match self {
            JournalMode::Wal => "WAL",
            JournalMode::Rollback => "DELETE",
        }
    }

    /// Value for `PRAGMA synchronous`
    pub fn synchronous(&self) -> &'static str {
        match self {
            JournalMode::Wal => "NORMAL",
            JournalMode::Rollback => "FULL",
        }
    }

    /// Repository name used in reports
    pub fn backend_name(&self) -> &'static str {
        match self {
            JournalMode::Wal => "SQLite-WAL",
            JournalMode::Rollback => "SQLite-Rollback",
        }
    }
}

/// Connection settings for [`crate::SqlitePool`]
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Database file, or `:memory:`
    pub path: PathBuf,
    pub journal_mode: JournalMode,
    pub busy_timeout_ms: u64,
    /// Negative values are KiB, positive values are pages
    pub cache_size: i64,
    /// Rows per transaction in `insert_all`
    pub commit_chunk: usize,
}

impl SqliteConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// In-memory database, mostly for tests
    pub fn memory() -> Self {
        Self::new(":memory:")
    }

    /// Builder-style: set the journal flavor
    #[must_use]
    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    /// Builder-style: set rows per commit
    #[must_use]
    pub fn with_commit_chunk(mut self, rows: usize) -> Self {
        self.commit_chunk = rows.max(1);
        self
    }

    pub fn is_memory(&self) -> bool {
        self.path.to_str() == Some(":memory:")
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./issues.db"),
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5_000,
            cache_size: -16_000,
            commit_chunk: 5_000,
        }
    }
}
