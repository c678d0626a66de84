//! `IssueRepository` over an embedded SurrealDB
//!
//! The SDK is async; the repository owns a current-thread runtime and blocks
//! on it so callers see the same synchronous contract as every other backend.

use std::path::{Path, PathBuf};

use issuebench_core::{
    ArtifactLocation, BackendKind, Issue, IssueRepository, RepositoryError, RepositoryResult,
};
use surrealdb::engine::local::{Db, Mem, SurrealKv};
use surrealdb::Surreal;
use tempfile::TempDir;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info, warn};

use crate::config::SurrealConfig;
use crate::document::{IssueDocument, FIELDS, SCHEMA, TABLE};
use crate::error::{SurrealError, SurrealResult};

const NAME: &str = "SurrealDB";
const MEMORY: &str = ":memory:";
const DB_DIR_NAME: &str = "issues.skv";

/// Open database plus the runtime that drives it
///
/// Field order matters: the client is dropped before its runtime.
struct Connection {
    db: Surreal<Db>,
    runtime: Runtime,
}

impl Connection {
    fn open(path: &Path, config: &SurrealConfig) -> SurrealResult<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let db = runtime.block_on(async {
            let db = if path == Path::new(MEMORY) {
                Surreal::new::<Mem>(()).await
            } else {
                let location = path.to_string_lossy().into_owned();
                Surreal::new::<SurrealKv>(location).await
            }
            .map_err(|e| {
                SurrealError::Connection(format!(
                    "Failed to create database at {}: {}",
                    path.display(),
                    e
                ))
            })?;

            db.use_ns(&config.namespace)
                .use_db(&config.database)
                .await
                .map_err(|e| {
                    SurrealError::Connection(format!(
                        "Failed to use namespace '{}' and database '{}': {}",
                        config.namespace, config.database, e
                    ))
                })?;

            db.query(SCHEMA).await?.check()?;
            Ok::<_, SurrealError>(db)
        })?;

        Ok(Self { db, runtime })
    }

    fn insert(&self, docs: Vec<IssueDocument>) -> SurrealResult<()> {
        self.runtime.block_on(async {
            self.db
                .query(format!("INSERT INTO {TABLE} $docs"))
                .bind(("docs", docs))
                .await?
                .check()?;
            Ok(())
        })
    }

    fn select(
        &self,
        filter: Option<(&'static str, &'static str, String)>,
    ) -> SurrealResult<Vec<IssueDocument>> {
        self.runtime.block_on(async {
            let mut sql = format!("SELECT {FIELDS} FROM {TABLE}");
            let mut binding = None;
            if let Some((field, param, value)) = filter {
                sql.push_str(&format!(" WHERE {field} = ${param}"));
                binding = Some((param, value));
            }

            let mut query = self.db.query(sql);
            if let Some(binding) = binding {
                query = query.bind(binding);
            }

            let mut response = query.await?.check()?;
            let docs: Vec<IssueDocument> = response.take(0)?;
            Ok(docs)
        })
    }
}

/// Document issue repository backed by SurrealDB
pub struct SurrealIssueRepository {
    config: SurrealConfig,
    location: ArtifactLocation,
    conn: Option<Connection>,
    path: Option<PathBuf>,
    temp_dir: Option<TempDir>,
}

impl SurrealIssueRepository {
    pub fn new(location: ArtifactLocation) -> Self {
        Self::with_config(SurrealConfig::default(), location)
    }

    pub fn with_config(config: SurrealConfig, location: ArtifactLocation) -> Self {
        Self {
            config,
            location,
            conn: None,
            path: None,
            temp_dir: None,
        }
    }

    /// In-memory database, mostly for tests
    pub fn memory() -> Self {
        Self::new(ArtifactLocation::path(MEMORY))
    }

    fn open_conn(&self) -> RepositoryResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| RepositoryError::NotInitialized(NAME.to_string()))
    }

    fn select_issues(
        &self,
        filter: Option<(&'static str, &'static str, String)>,
    ) -> RepositoryResult<Vec<Issue>> {
        let docs = self.open_conn()?.select(filter)?;
        docs.into_iter().map(Issue::try_from).collect()
    }
}

impl IssueRepository for SurrealIssueRepository {
    fn name(&self) -> &str {
        NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Document
    }

    fn init(&mut self) -> RepositoryResult<()> {
        if self.conn.is_some() {
            debug!(backend = NAME, "Already initialized");
            return Ok(());
        }

        let (path, temp_dir) = self
            .location
            .resolve("issuebench-surreal-", DB_DIR_NAME)
            .map_err(|e| {
                RepositoryError::initialization(format!("Failed to allocate temp dir: {}", e))
            })?;

        if path != Path::new(MEMORY) {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    RepositoryError::initialization(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(&path, &self.config)
            .map_err(|e| RepositoryError::initialization(e.to_string()))?;

        info!(backend = NAME, path = %path.display(), "Repository initialized");
        self.conn = Some(conn);
        self.path = Some(path);
        self.temp_dir = temp_dir;
        Ok(())
    }

    fn insert_all(&mut self, issues: &[Issue]) -> RepositoryResult<()> {
        let chunk_size = self.config.insert_chunk.max(1);
        let conn = self.open_conn()?;

        for (n, chunk) in issues.chunks(chunk_size).enumerate() {
            let docs: Vec<IssueDocument> = chunk.iter().map(IssueDocument::from).collect();
            conn.insert(docs)?;
            debug!(chunk = n, docs = chunk.len(), "Inserted chunk");
        }

        debug!(backend = NAME, count = issues.len(), "Inserted issues");
        Ok(())
    }

    fn read_all(&self) -> RepositoryResult<Vec<Issue>> {
        self.select_issues(None)
    }

    fn search_by_rule(&self, rule_key: &str) -> RepositoryResult<Vec<Issue>> {
        // The planner uses issue_rule when present and scans otherwise
        debug!(rule_key, "Searching issues by rule");
        self.select_issues(Some(("rule_key", "rule", rule_key.to_string())))
    }

    fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Issue>> {
        let mut found = self.select_issues(Some(("issue_id", "wanted", id.to_string())))?;
        if found.len() > 1 {
            warn!(id, count = found.len(), "Duplicate issue id");
        }
        Ok(found.pop())
    }

    fn artifact_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn close(&mut self) {
        if self.conn.take().is_some() {
            info!(backend = NAME, "Repository closed");
        }
        if let Some(dir) = self.temp_dir.take() {
            if let Err(e) = dir.close() {
                warn!(error = %e, "Failed to remove temp dir");
            }
        }
    }
}

impl Drop for SurrealIssueRepository {
    fn drop(&mut self) {
        self.close();
    }
}
