//! `IssueRepository` over redb tables

use std::path::{Path, PathBuf};

use bincode::config::{self, Configuration};
use issuebench_core::{
    ArtifactLocation, BackendKind, IntegrityStatus, Issue, IssueRepository, RepositoryError,
    RepositoryResult,
};
use redb::{
    Database, ReadTransaction, ReadableMultimapTable, ReadableTable, TableError, WriteTransaction,
};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::RedbConfig;
use crate::error::{RedbError, RedbResult};
use crate::tables::Tables;

const NAME: &str = "redb";
const DB_FILE_NAME: &str = "issues.redb";

fn bincode_config() -> Configuration {
    config::standard()
}

fn encode_issue(issue: &Issue) -> RedbResult<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(issue, bincode_config())?)
}

fn decode_issue(bytes: &[u8]) -> RedbResult<Issue> {
    let (issue, _): (Issue, usize) = bincode::serde::decode_from_slice(bytes, bincode_config())?;
    Ok(issue)
}

/// Key-value issue repository backed by a single redb file
///
/// Issues are stored whole under their id; a multimap table indexes ids by
/// rule key and is kept in step within each write transaction.
pub struct RedbIssueRepository {
    config: RedbConfig,
    location: ArtifactLocation,
    db: Option<Database>,
    path: Option<PathBuf>,
    temp_dir: Option<TempDir>,
}

impl RedbIssueRepository {
    pub fn new(location: ArtifactLocation) -> Self {
        Self::with_config(RedbConfig::default(), location)
    }

    pub fn with_config(config: RedbConfig, location: ArtifactLocation) -> Self {
        Self {
            config,
            location,
            db: None,
            path: None,
            temp_dir: None,
        }
    }

    /// The open database, if `init` has run and `close` has not
    pub fn database(&self) -> Option<&Database> {
        self.db.as_ref()
    }

    fn open_db(&self) -> RepositoryResult<&Database> {
        self.db
            .as_ref()
            .ok_or_else(|| RepositoryError::NotInitialized(NAME.to_string()))
    }

    fn open_database(&self, path: &Path) -> RedbResult<Database> {
        let db = Database::create(path)?;

        // Create both tables up front so readers never hit a missing table
        let txn = db.begin_write()?;
        txn.open_table(Tables::ISSUES)?;
        txn.open_multimap_table(Tables::RULE_INDEX)?;
        txn.commit()?;

        Ok(db)
    }
}

impl IssueRepository for RedbIssueRepository {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::KeyValue
    }

    fn init(&mut self) -> RepositoryResult<()> {
        if self.db.is_some() {
            debug!(backend = NAME, "Already initialized");
            return Ok(());
        }

        let (path, temp_dir) = self
            .location
            .resolve("issuebench-redb-", DB_FILE_NAME)
            .map_err(|e| {
                RepositoryError::initialization(format!("Failed to allocate temp dir: {}", e))
            })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RepositoryError::initialization(format!("Failed to create directory: {}", e))
            })?;
        }

        let db = self.open_database(&path).map_err(|e| {
            RepositoryError::initialization(format!("Failed to open {}: {}", path.display(), e))
        })?;

        info!(backend = NAME, path = %path.display(), "Repository initialized");
        self.db = Some(db);
        self.path = Some(path);
        self.temp_dir = temp_dir;
        Ok(())
    }

    fn insert_all(&mut self, issues: &[Issue]) -> RepositoryResult<()> {
        let interval = self.config.commit_interval.max(1);
        let db = self.open_db()?;

        for (n, chunk) in issues.chunks(interval).enumerate() {
            write_chunk(db, chunk)?;
            debug!(chunk = n, records = chunk.len(), "Committed chunk");
        }

        debug!(backend = NAME, count = issues.len(), "Inserted issues");
        Ok(())
    }

    fn read_all(&self) -> RepositoryResult<Vec<Issue>> {
        let db = self.open_db()?;
        let txn = db.begin_read().map_err(RedbError::from)?;
        Ok(scan(&txn, |_| true)?)
    }

    fn search_by_rule(&self, rule_key: &str) -> RepositoryResult<Vec<Issue>> {
        let db = self.open_db()?;
        let txn = db.begin_read().map_err(RedbError::from)?;

        let ids = indexed_ids(&txn, rule_key)?;
        if ids.is_empty() {
            debug!(rule_key, "Rule index missing or empty, falling back to scan");
            return Ok(scan(&txn, |issue| issue.rule_key == rule_key)?);
        }

        debug!(rule_key, hits = ids.len(), "Searching issues via rule index");
        Ok(fetch_ids(&txn, &ids, |issue| issue.rule_key == rule_key)?)
    }

    fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Issue>> {
        let db = self.open_db()?;
        let txn = db.begin_read().map_err(RedbError::from)?;
        let found = fetch_ids(&txn, &[id.to_string()], |_| true)?;
        Ok(found.into_iter().next())
    }

    fn integrity_check(&mut self) -> RepositoryResult<IntegrityStatus> {
        let db = self
            .db
            .as_mut()
            .ok_or_else(|| RepositoryError::NotInitialized(NAME.to_string()))?;

        let passed = db.check_integrity().map_err(RedbError::from)?;
        if !passed {
            warn!(backend = NAME, "Integrity check repaired the database");
        }

        let report = if passed { "ok" } else { "repaired" };
        Ok(IntegrityStatus::Checked {
            report: report.to_string(),
        })
    }

    fn artifact_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn close(&mut self) {
        if self.db.take().is_some() {
            info!(backend = NAME, "Repository closed");
        }
        if let Some(dir) = self.temp_dir.take() {
            if let Err(e) = dir.close() {
                warn!(error = %e, "Failed to remove temp dir");
            }
        }
    }
}

impl Drop for RedbIssueRepository {
    fn drop(&mut self) {
        self.close();
    }
}

/// Write one chunk of issues and their index entries in a single transaction
///
/// An id that is already stored aborts the whole chunk.
fn write_chunk(db: &Database, chunk: &[Issue]) -> RedbResult<()> {
    let txn = db.begin_write()?;
    if let Err(e) = stage_chunk(&txn, chunk) {
        txn.abort()?;
        return Err(e);
    }
    txn.commit()?;
    Ok(())
}

fn stage_chunk(txn: &WriteTransaction, chunk: &[Issue]) -> RedbResult<()> {
    let mut issues = txn.open_table(Tables::ISSUES)?;
    let mut index = txn.open_multimap_table(Tables::RULE_INDEX)?;
    for issue in chunk {
        let bytes = encode_issue(issue)?;
        if issues.insert(issue.id.as_str(), bytes.as_slice())?.is_some() {
            return Err(RedbError::DuplicateId(issue.id.clone()));
        }
        index.insert(issue.rule_key.as_str(), issue.id.as_str())?;
    }
    Ok(())
}

/// Ids listed under `rule_key`; empty when the index table is gone
fn indexed_ids(txn: &ReadTransaction, rule_key: &str) -> RedbResult<Vec<String>> {
    let index = match txn.open_multimap_table(Tables::RULE_INDEX) {
        Ok(index) => index,
        Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut ids = Vec::new();
    for id in index.get(rule_key)? {
        ids.push(id?.value().to_string());
    }
    Ok(ids)
}

/// Load `ids`, keeping only issues that pass `keep`; stale index entries are skipped
fn fetch_ids(
    txn: &ReadTransaction,
    ids: &[String],
    keep: impl Fn(&Issue) -> bool,
) -> RedbResult<Vec<Issue>> {
    let issues = txn.open_table(Tables::ISSUES)?;
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(value) = issues.get(id.as_str())? else {
            debug!(id = %id, "Index entry without issue");
            continue;
        };
        let issue = decode_issue(value.value())?;
        if keep(&issue) {
            out.push(issue);
        } else {
            debug!(id = %id, rule_key = %issue.rule_key, "Stale index entry");
        }
    }
    Ok(out)
}

fn scan(txn: &ReadTransaction, keep: impl Fn(&Issue) -> bool) -> RedbResult<Vec<Issue>> {
    let issues = txn.open_table(Tables::ISSUES)?;
    let mut out = Vec::new();
    for entry in issues.iter()? {
        let (_, value) = entry?;
        let issue = decode_issue(value.value())?;
        if keep(&issue) {
            out.push(issue);
        }
    }
    Ok(out)
}
