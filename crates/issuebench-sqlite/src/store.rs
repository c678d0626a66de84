//! `IssueRepository` over a single SQLite table
//!
//! Scalar fields map to columns, tags to a JSON array and the nested part of
//! each issue to a flat-codec `details` blob.

use std::path::{Path, PathBuf};

use issuebench_core::codec;
use issuebench_core::{
    ArtifactLocation, BackendKind, IntegrityStatus, Issue, IssueRepository, RepositoryError,
    RepositoryResult, Severity,
};
use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::{JournalMode, SqliteConfig};
use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};
use crate::schema;

const DB_FILE_NAME: &str = "issues.db";

const INSERT_ISSUE: &str = r#"
    INSERT INTO issues (id, rule_key, severity, message, file_path, line, creation_date, assignee, tags, details)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
"#;

const SELECT_ISSUES: &str = r#"
    SELECT id, rule_key, severity, message, file_path, line, creation_date, assignee, tags, details
    FROM issues
"#;

/// SQLite-backed issue repository
///
/// One instance per journal flavor; [`JournalMode::Wal`] reports as
/// `SQLite-WAL`, [`JournalMode::Rollback`] as `SQLite-Rollback`.
pub struct SqliteIssueRepository {
    config: SqliteConfig,
    location: ArtifactLocation,
    pool: Option<SqlitePool>,
    path: Option<PathBuf>,
    temp_dir: Option<TempDir>,
}

impl SqliteIssueRepository {
    pub fn new(journal_mode: JournalMode, location: ArtifactLocation) -> Self {
        Self {
            config: SqliteConfig::default().with_journal_mode(journal_mode),
            location,
            pool: None,
            path: None,
            temp_dir: None,
        }
    }

    /// Use every setting from `config`, including its path
    pub fn with_config(config: SqliteConfig) -> Self {
        let location = ArtifactLocation::Path(config.path.clone());
        Self {
            config,
            location,
            pool: None,
            path: None,
            temp_dir: None,
        }
    }

    /// Builder-style: set rows per commit
    #[must_use]
    pub fn with_commit_chunk(mut self, rows: usize) -> Self {
        self.config = self.config.clone().with_commit_chunk(rows);
        self
    }

    pub fn journal_mode(&self) -> JournalMode {
        self.config.journal_mode
    }

    /// The open connection pool, if `init` has run and `close` has not
    pub fn pool(&self) -> Option<&SqlitePool> {
        self.pool.as_ref()
    }

    fn open_pool(&self) -> RepositoryResult<&SqlitePool> {
        self.pool
            .as_ref()
            .ok_or_else(|| RepositoryError::NotInitialized(self.name().to_string()))
    }
}

impl IssueRepository for SqliteIssueRepository {
    fn name(&self) -> &str {
        self.config.journal_mode.backend_name()
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn init(&mut self) -> RepositoryResult<()> {
        if self.pool.is_some() {
            debug!(backend = self.name(), "Already initialized");
            return Ok(());
        }

        let (path, temp_dir) = self
            .location
            .resolve("issuebench-sqlite-", DB_FILE_NAME)
            .map_err(|e| {
                RepositoryError::initialization(format!("Failed to allocate temp dir: {}", e))
            })?;

        let mut config = self.config.clone();
        config.path = path.clone();
        let pool = SqlitePool::new(config)
            .map_err(|e| RepositoryError::initialization(e.to_string()))?;

        info!(backend = self.name(), path = %path.display(), "Repository initialized");
        self.pool = Some(pool);
        self.path = Some(path);
        self.temp_dir = temp_dir;
        Ok(())
    }

    fn insert_all(&mut self, issues: &[Issue]) -> RepositoryResult<()> {
        let chunk_size = self.config.commit_chunk.max(1);
        let pool = self.open_pool()?;

        pool.with_connection_mut(|conn| {
            for (n, chunk) in issues.chunks(chunk_size).enumerate() {
                insert_chunk(conn, chunk)?;
                debug!(chunk = n, rows = chunk.len(), "Committed chunk");
            }
            Ok(())
        })?;

        debug!(backend = self.name(), count = issues.len(), "Inserted issues");
        Ok(())
    }

    fn read_all(&self) -> RepositoryResult<Vec<Issue>> {
        let pool = self.open_pool()?;
        let issues = pool.with_connection(|conn| query_issues(conn, SELECT_ISSUES, []))?;
        Ok(issues)
    }

    fn search_by_rule(&self, rule_key: &str) -> RepositoryResult<Vec<Issue>> {
        let pool = self.open_pool()?;
        let issues = pool.with_connection(|conn| {
            // Same query either way; without the index SQLite scans the table
            let indexed = schema::rule_index_present(conn)?;
            debug!(rule_key, indexed, "Searching issues by rule");

            let sql = format!("{SELECT_ISSUES} WHERE rule_key = ?1");
            query_issues(conn, &sql, [rule_key])
        })?;
        Ok(issues)
    }

    fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Issue>> {
        let pool = self.open_pool()?;
        let issue = pool.with_connection(|conn| {
            let sql = format!("{SELECT_ISSUES} WHERE id = ?1");
            let row = conn
                .query_row(&sql, [id], IssueRow::from_row)
                .optional()?;
            row.map(IssueRow::into_issue).transpose()
        })?;
        Ok(issue)
    }

    fn integrity_check(&mut self) -> RepositoryResult<IntegrityStatus> {
        let pool = self.open_pool()?;
        let report = pool.integrity_check()?;

        match pool.stats() {
            Ok(stats) => info!(
                backend = self.name(),
                page_count = stats.page_count,
                page_size = stats.page_size,
                freelist_count = stats.freelist_count,
                total_size_bytes = stats.total_size_bytes,
                "Database stats"
            ),
            Err(e) => warn!(backend = self.name(), error = %e, "Failed to read database stats"),
        }

        Ok(IntegrityStatus::Checked { report })
    }

    fn artifact_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn close(&mut self) {
        if self.pool.take().is_some() {
            info!(backend = self.name(), "Repository closed");
        }
        if let Some(dir) = self.temp_dir.take() {
            if let Err(e) = dir.close() {
                warn!(error = %e, "Failed to remove temp dir");
            }
        }
    }
}

impl Drop for SqliteIssueRepository {
    fn drop(&mut self) {
        self.close();
    }
}

/// Insert one chunk inside its own transaction
fn insert_chunk(conn: &mut Connection, chunk: &[Issue]) -> SqliteResult<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(INSERT_ISSUE)?;
        for issue in chunk {
            let tags = serde_json::to_string(&issue.tags)
                .map_err(|e| SqliteError::Serialization(e.to_string()))?;
            stmt.execute(params![
                issue.id,
                issue.rule_key,
                issue.severity.as_str(),
                issue.message,
                issue.file_path,
                issue.line,
                issue.creation_date,
                issue.assignee,
                tags,
                codec::encode(issue),
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn query_issues<P: Params>(conn: &Connection, sql: &str, params: P) -> SqliteResult<Vec<Issue>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, IssueRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(IssueRow::into_issue).collect()
}

/// Raw column values of one `issues` row
struct IssueRow {
    id: String,
    rule_key: String,
    severity: String,
    message: String,
    file_path: Option<String>,
    line: Option<u32>,
    creation_date: i64,
    assignee: Option<String>,
    tags: String,
    details: String,
}

impl IssueRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            rule_key: row.get(1)?,
            severity: row.get(2)?,
            message: row.get(3)?,
            file_path: row.get(4)?,
            line: row.get(5)?,
            creation_date: row.get(6)?,
            assignee: row.get(7)?,
            tags: row.get(8)?,
            details: row.get(9)?,
        })
    }

    fn into_issue(self) -> SqliteResult<Issue> {
        let severity: Severity = self
            .severity
            .parse()
            .map_err(|e: RepositoryError| SqliteError::Serialization(e.to_string()))?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| SqliteError::Serialization(format!("tags of {}: {}", self.id, e)))?;

        let mut issue = Issue {
            id: self.id,
            rule_key: self.rule_key,
            severity,
            message: self.message,
            file_path: self.file_path,
            line: self.line,
            creation_date: self.creation_date,
            assignee: self.assignee,
            tags,
            primary_location: None,
            flows: Vec::new(),
            quick_fixes: Vec::new(),
        };

        if let Err(e) = codec::decode_into(&self.details, &mut issue) {
            warn!(id = %issue.id, error = %e, "Undecodable details, nested fields left empty");
        }

        Ok(issue)
    }
}
