//! Backend registry
//!
//! The only place that switches on backend identity; everything downstream
//! works through `Box<dyn IssueRepository>`.

use std::fmt;
use std::str::FromStr;

use issuebench_core::{ArtifactLocation, IssueRepository, RepositoryError};
use issuebench_redb::{RedbConfig, RedbIssueRepository};
use issuebench_sqlite::{JournalMode, SqliteIssueRepository};
use issuebench_surrealdb::{SurrealConfig, SurrealIssueRepository};
use serde::{Deserialize, Serialize};

/// Identifier accepted by `db=` and used to pick an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendId {
    Sqlite,
    SqliteRollback,
    Surrealdb,
    Redb,
}

impl BackendId {
    /// Every registered backend, in benchmark order
    pub const ALL: [BackendId; 4] = [
        BackendId::Sqlite,
        BackendId::SqliteRollback,
        BackendId::Surrealdb,
        BackendId::Redb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendId::Sqlite => "sqlite",
            BackendId::SqliteRollback => "sqlite-rollback",
            BackendId::Surrealdb => "surrealdb",
            BackendId::Redb => "redb",
        }
    }

    /// Label printed next to a native integrity report
    pub fn integrity_label(&self) -> &'static str {
        match self {
            BackendId::Sqlite | BackendId::SqliteRollback => "SQLite PRAGMA integrity_check",
            BackendId::Surrealdb => "SurrealDB integrity",
            BackendId::Redb => "redb check_integrity",
        }
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendId {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RepositoryError::UnsupportedBackend(s.to_string()))
    }
}

/// Construct an uninitialized repository for `id`
///
/// `batch` sets the adapter's records-per-commit.
pub fn open_repository(
    id: BackendId,
    location: ArtifactLocation,
    batch: usize,
) -> Box<dyn IssueRepository> {
    match id {
        BackendId::Sqlite => Box::new(
            SqliteIssueRepository::new(JournalMode::Wal, location).with_commit_chunk(batch),
        ),
        BackendId::SqliteRollback => Box::new(
            SqliteIssueRepository::new(JournalMode::Rollback, location).with_commit_chunk(batch),
        ),
        BackendId::Surrealdb => Box::new(SurrealIssueRepository::with_config(
            SurrealConfig::default().with_insert_chunk(batch),
            location,
        )),
        BackendId::Redb => Box::new(RedbIssueRepository::with_config(
            RedbConfig::default().with_commit_interval(batch),
            location,
        )),
    }
}

/// One repository per registered backend, each in its own temp location
pub fn all_backends(batch: usize) -> Vec<Box<dyn IssueRepository>> {
    BackendId::ALL
        .into_iter()
        .map(|id| open_repository(id, ArtifactLocation::Temp, batch))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuebench_core::BackendKind;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("SQLite".parse::<BackendId>().unwrap(), BackendId::Sqlite);
        assert_eq!(
            "sqlite-ROLLBACK".parse::<BackendId>().unwrap(),
            BackendId::SqliteRollback
        );
        assert_eq!("redb".parse::<BackendId>().unwrap(), BackendId::Redb);
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = "h2".parse::<BackendId>().unwrap_err();
        assert_eq!(err.classification(), "UnsupportedBackend");
        assert!(err.to_string().contains("h2"));
    }

    #[test]
    fn test_ids_roundtrip_through_display() {
        for id in BackendId::ALL {
            assert_eq!(id.to_string().parse::<BackendId>().unwrap(), id);
        }
    }

    #[test]
    fn test_registry_names_and_kinds() {
        let repos = all_backends(100);
        let described: Vec<_> = repos.iter().map(|r| (r.name(), r.kind())).collect();

        assert_eq!(
            described,
            vec![
                ("SQLite-WAL", BackendKind::Relational),
                ("SQLite-Rollback", BackendKind::Relational),
                ("SurrealDB", BackendKind::Document),
                ("redb", BackendKind::KeyValue),
            ]
        );
    }
}
