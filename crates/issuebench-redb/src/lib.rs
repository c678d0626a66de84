//! redb storage backend for issuebench
//!
//! Key-value adapter: each issue is stored whole (bincode) under its id, with
//! a multimap `rule_index` table for `search_by_rule`. Search falls back to a
//! full scan when the index table is missing or has nothing for the key.
//! `Database::check_integrity` backs the native integrity check.

pub mod config;
pub mod error;
pub mod store;
pub mod tables;

// Re-exports
pub use config::RedbConfig;
pub use error::{RedbError, RedbResult};
pub use store::RedbIssueRepository;
pub use tables::Tables;
