//! Core types for issuebench
//!
//! This crate holds everything that is independent of a particular storage
//! engine:
//!
//! - **model**: the nested [`Issue`] record (locations, flows, quick fixes)
//! - **generator**: seeded, reproducible issue batches
//! - **codec**: the flat text codec used by scalar-column backends
//! - **repository**: the [`IssueRepository`] contract every backend implements
//!
//! Backend adapters live in their own crates (`issuebench-sqlite`,
//! `issuebench-surrealdb`, `issuebench-redb`) and depend only on this one.

pub mod codec;
pub mod error;
pub mod generator;
pub mod model;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_support;

// Re-exports
pub use codec::IssueDetails;
pub use error::{CodecError, RepositoryError, RepositoryResult};
pub use generator::{GeneratorError, IssueGenerator, DEFAULT_RULE_KEYS, DEFAULT_SEED};
pub use model::{Issue, IssueFlow, IssueLocation, QuickFix, Severity};
pub use repository::{ArtifactLocation, BackendKind, IntegrityStatus, IssueRepository};
