//! SQLite storage backend for issuebench
//!
//! Relational adapter for the [`IssueRepository`](issuebench_core::IssueRepository)
//! contract. Two journal flavors are benchmarked as separate variants:
//!
//! - **WAL**: `journal_mode=WAL`, `synchronous=NORMAL`
//! - **Rollback**: `journal_mode=DELETE`, `synchronous=FULL`
//!
//! Nested issue fields are packed with the flat codec from `issuebench-core`;
//! `PRAGMA integrity_check` backs the native integrity check.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use issuebench_core::{ArtifactLocation, IssueRepository};
//! use issuebench_sqlite::{JournalMode, SqliteIssueRepository};
//!
//! let mut repo = SqliteIssueRepository::new(JournalMode::Wal, ArtifactLocation::Temp);
//! repo.init()?;
//! repo.insert_all(&issues)?;
//! let hits = repo.search_by_rule("java:S1234")?;
//! repo.close();
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod schema;
pub mod store;

// Re-exports
pub use config::{JournalMode, SqliteConfig};
pub use connection::{DbStats, SqlitePool};
pub use error::{SqliteError, SqliteResult};
pub use store::SqliteIssueRepository;
