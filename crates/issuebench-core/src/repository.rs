//! Repository contract shared by every storage backend
//!
//! Backends differ wildly in what they can store natively. The contract hides
//! that behind one synchronous lifecycle:
//!
//! ```text
//! init -> insert_all* -> read_all / search_by_rule / get_by_id -> close
//! ```
//!
//! Adapters whose engine only has scalar columns ([`BackendKind::Relational`])
//! route nested fields through [`crate::codec`]; document and key-value
//! adapters store them natively. Both paths must give back deep-equal issues.

use std::fmt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::RepositoryResult;
use crate::model::Issue;

/// Capability tag of a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// SQL engine with scalar/CLOB columns only
    Relational,
    /// Embedded store with native nested documents
    Document,
    /// Embedded ordered key-value store
    KeyValue,
}

impl BackendKind {
    /// Whether nested fields go through the flat codec
    pub fn uses_flat_codec(&self) -> bool {
        matches!(self, BackendKind::Relational)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BackendKind::Relational => "relational",
            BackendKind::Document => "document",
            BackendKind::KeyValue => "key-value",
        };
        f.write_str(s)
    }
}

/// Result of a backend-native integrity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityStatus {
    /// The backend ran its own check and returned this report
    Checked { report: String },
    /// The backend has no native primitive; a successful open and query is
    /// the only evidence of health
    Unavailable,
}

impl IntegrityStatus {
    /// True for a `Checked` report equal to "ok" (case-insensitive, trimmed)
    pub fn is_ok(&self) -> bool {
        match self {
            IntegrityStatus::Checked { report } => report.trim().eq_ignore_ascii_case("ok"),
            IntegrityStatus::Unavailable => false,
        }
    }
}

/// Where a backend keeps its on-disk artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// Fresh location under the system temp dir, removed on close
    Temp,
    /// Caller-owned path, never removed by the adapter
    Path(PathBuf),
}

impl ArtifactLocation {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ArtifactLocation::Path(path.into())
    }

    /// Resolve to a concrete path, allocating a temp dir when needed
    ///
    /// `file_name` names the artifact inside the temp dir. The returned
    /// [`TempDir`] guard must be kept for as long as the artifact is in use.
    pub fn resolve(
        &self,
        prefix: &str,
        file_name: &str,
    ) -> std::io::Result<(PathBuf, Option<TempDir>)> {
        match self {
            ArtifactLocation::Path(path) => Ok((path.clone(), None)),
            ArtifactLocation::Temp => {
                let dir = tempfile::Builder::new().prefix(prefix).tempdir()?;
                Ok((dir.path().join(file_name), Some(dir)))
            }
        }
    }
}

/// Uniform lifecycle and CRUD interface over a storage backend
pub trait IssueRepository: Send {
    /// Stable identifier for reporting
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Create or open the on-disk artifact and its schema
    fn init(&mut self) -> RepositoryResult<()>;

    /// Persist every issue; may commit in chunks
    fn insert_all(&mut self, issues: &[Issue]) -> RepositoryResult<()>;

    /// Every persisted issue, in backend-defined order
    fn read_all(&self) -> RepositoryResult<Vec<Issue>>;

    /// Exactly the persisted issues whose `rule_key` equals `rule_key`
    fn search_by_rule(&self, rule_key: &str) -> RepositoryResult<Vec<Issue>>;

    fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Issue>>;

    /// Run the backend's native integrity check, if it has one
    fn integrity_check(&mut self) -> RepositoryResult<IntegrityStatus> {
        Ok(IntegrityStatus::Unavailable)
    }

    /// Location of the on-disk artifact once initialized
    fn artifact_path(&self) -> Option<&Path>;

    /// Release every resource; idempotent and valid without `init`
    fn close(&mut self);
}
