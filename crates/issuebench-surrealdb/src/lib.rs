//! SurrealDB storage backend for issuebench
//!
//! Document adapter: each issue is stored natively as a nested document in
//! the `issue` table, indexed on `rule_key` and (uniquely) on `issue_id`. No
//! flat codec is involved and there is no native integrity primitive, so
//! `integrity_check` reports [`IntegrityStatus::Unavailable`].
//!
//! File-backed databases use the SurrealKV engine; `:memory:` uses `Mem`.
//!
//! [`IntegrityStatus::Unavailable`]: issuebench_core::IntegrityStatus::Unavailable

pub mod config;
pub mod document;
pub mod error;
pub mod store;

// Re-exports
pub use config::SurrealConfig;
pub use document::IssueDocument;
pub use error::{SurrealError, SurrealResult};
pub use store::SurrealIssueRepository;
