//! Benchmark orchestrator
//!
//! Drives each repository through `init -> insert_all -> read_all ->
//! search_by_rule -> close`, timing the three middle phases. A failure in
//! one backend is logged and recorded, and the next backend still runs.

use std::io::Write;
use std::time::Instant;

use issuebench_core::{
    Issue, IssueGenerator, IssueRepository, RepositoryError, RepositoryResult, DEFAULT_RULE_KEYS,
    DEFAULT_SEED,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::BenchmarkError;

/// Workload parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    pub item_count: usize,
    /// Records per commit inside each adapter
    pub batch_size: usize,
    /// Carried for reporting; warm-up is not a separate phase
    pub warmup_batches: usize,
    pub search_rule_key: String,
    pub seed: u64,
    pub rule_keys: Vec<String>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            item_count: 1_000_000,
            batch_size: 5_000,
            warmup_batches: 10,
            search_rule_key: "java:S1234".to_string(),
            seed: DEFAULT_SEED,
            rule_keys: DEFAULT_RULE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Duration and result size of one timed phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseResult {
    pub millis: u128,
    pub count: usize,
}

/// Outcome for one backend; phases after a failure stay `None`
#[derive(Debug)]
pub struct BackendReport {
    pub name: String,
    pub write: Option<PhaseResult>,
    pub read_all: Option<PhaseResult>,
    pub search: Option<PhaseResult>,
    pub error: Option<RepositoryError>,
}

impl BackendReport {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            write: None,
            read_all: None,
            search: None,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct BenchmarkReport {
    pub config: BenchmarkConfig,
    pub backends: Vec<BackendReport>,
}

impl BenchmarkReport {
    pub fn failed_backends(&self) -> impl Iterator<Item = &BackendReport> {
        self.backends.iter().filter(|b| !b.succeeded())
    }
}

fn timed<T>(f: impl FnOnce() -> RepositoryResult<T>) -> RepositoryResult<(T, u128)> {
    let start = Instant::now();
    let value = f()?;
    Ok((value, start.elapsed().as_millis()))
}

pub struct BenchmarkRunner {
    config: BenchmarkConfig,
}

impl BenchmarkRunner {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self { config }
    }

    /// Generate the dataset once and run it against every repository in order
    pub fn run(
        &self,
        repos: Vec<Box<dyn IssueRepository>>,
        out: &mut impl Write,
    ) -> Result<BenchmarkReport, BenchmarkError> {
        writeln!(out, "Database Benchmark")?;
        writeln!(
            out,
            "Items={}, batchSize={}, searchRuleKey={}",
            self.config.item_count, self.config.batch_size, self.config.search_rule_key
        )?;
        info!(
            items = self.config.item_count,
            batch = self.config.batch_size,
            warmup_batches = self.config.warmup_batches,
            seed = self.config.seed,
            backends = repos.len(),
            "Starting benchmark"
        );

        let data = IssueGenerator::new(self.config.seed, self.config.rule_keys.iter().cloned())?
            .generate(self.config.item_count);

        let mut backends = Vec::with_capacity(repos.len());
        for mut repo in repos {
            backends.push(self.run_backend(repo.as_mut(), &data, out)?);
            writeln!(out)?;
        }

        Ok(BenchmarkReport {
            config: self.config.clone(),
            backends,
        })
    }

    /// Run every phase against one repository; `close` always runs
    pub fn run_backend(
        &self,
        repo: &mut dyn IssueRepository,
        data: &[Issue],
        out: &mut impl Write,
    ) -> Result<BackendReport, BenchmarkError> {
        writeln!(out, "== {} ==", repo.name())?;
        out.flush()?;

        let mut report = BackendReport::new(repo.name());
        let outcome = self.run_phases(repo, data, out, &mut report);
        repo.close();

        match outcome {
            Ok(()) => {}
            Err(PhaseError::Io(e)) => return Err(e.into()),
            Err(PhaseError::Repository(e)) => {
                error!(backend = %report.name, classification = e.classification(), error = %e, "Backend failed");
                writeln!(out, "Failed: {}: {}", e.classification(), e)?;
                report.error = Some(e);
            }
        }

        Ok(report)
    }

    fn run_phases(
        &self,
        repo: &mut dyn IssueRepository,
        data: &[Issue],
        out: &mut impl Write,
        report: &mut BackendReport,
    ) -> Result<(), PhaseError> {
        repo.init()?;

        let ((), write_ms) = timed(|| repo.insert_all(data))?;
        report.write = Some(PhaseResult {
            millis: write_ms,
            count: data.len(),
        });
        writeln!(out, "Write: {} ms", write_ms)?;

        let (all, read_ms) = timed(|| repo.read_all())?;
        report.read_all = Some(PhaseResult {
            millis: read_ms,
            count: all.len(),
        });
        writeln!(out, "ReadAll: {} ms ({})", read_ms, all.len())?;
        drop(all);

        let rule = &self.config.search_rule_key;
        let (found, search_ms) = timed(|| repo.search_by_rule(rule))?;
        report.search = Some(PhaseResult {
            millis: search_ms,
            count: found.len(),
        });
        writeln!(out, "Search(rule='{}'): {} ms ({})", rule, search_ms, found.len())?;

        if let Some(path) = repo.artifact_path() {
            writeln!(out, "Artifact: {}", path.display())?;
        }

        Ok(())
    }
}

enum PhaseError {
    Repository(RepositoryError),
    Io(std::io::Error),
}

impl From<RepositoryError> for PhaseError {
    fn from(e: RepositoryError) -> Self {
        PhaseError::Repository(e)
    }
}

impl From<std::io::Error> for PhaseError {
    fn from(e: std::io::Error) -> Self {
        PhaseError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use issuebench_core::{ArtifactLocation, BackendKind};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// In-memory repository that can be told to fail on init
    struct VecRepository {
        name: &'static str,
        fail_init: bool,
        issues: Option<Vec<Issue>>,
        closes: Arc<AtomicUsize>,
    }

    impl VecRepository {
        fn boxed(
            name: &'static str,
            fail_init: bool,
            closes: &Arc<AtomicUsize>,
        ) -> Box<dyn IssueRepository> {
            Box::new(Self {
                name,
                fail_init,
                issues: None,
                closes: Arc::clone(closes),
            })
        }

        fn stored(&self) -> RepositoryResult<&Vec<Issue>> {
            self.issues
                .as_ref()
                .ok_or_else(|| RepositoryError::NotInitialized(self.name.to_string()))
        }
    }

    impl IssueRepository for VecRepository {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> BackendKind {
            BackendKind::KeyValue
        }

        fn init(&mut self) -> RepositoryResult<()> {
            if self.fail_init {
                return Err(RepositoryError::initialization("disk on fire"));
            }
            self.issues = Some(Vec::new());
            Ok(())
        }

        fn insert_all(&mut self, issues: &[Issue]) -> RepositoryResult<()> {
            let name = self.name;
            self.issues
                .as_mut()
                .ok_or_else(|| RepositoryError::NotInitialized(name.to_string()))?
                .extend_from_slice(issues);
            Ok(())
        }

        fn read_all(&self) -> RepositoryResult<Vec<Issue>> {
            Ok(self.stored()?.clone())
        }

        fn search_by_rule(&self, rule_key: &str) -> RepositoryResult<Vec<Issue>> {
            Ok(self
                .stored()?
                .iter()
                .filter(|i| i.rule_key == rule_key)
                .cloned()
                .collect())
        }

        fn get_by_id(&self, id: &str) -> RepositoryResult<Option<Issue>> {
            Ok(self.stored()?.iter().find(|i| i.id == id).cloned())
        }

        fn artifact_path(&self) -> Option<&Path> {
            None
        }

        fn close(&mut self) {
            self.issues = None;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn small_config() -> BenchmarkConfig {
        BenchmarkConfig {
            item_count: 200,
            batch_size: 50,
            ..BenchmarkConfig::default()
        }
    }

    #[test]
    fn test_failing_backend_does_not_stop_the_rest() {
        let closes = Arc::new(AtomicUsize::new(0));
        let repos = vec![
            VecRepository::boxed("broken", true, &closes),
            VecRepository::boxed("working", false, &closes),
        ];

        let mut out = Vec::new();
        let report = BenchmarkRunner::new(small_config())
            .run(repos, &mut out)
            .unwrap();

        assert_eq!(report.backends.len(), 2);
        assert!(!report.backends[0].succeeded());
        assert!(report.backends[0].write.is_none());
        assert!(report.backends[1].succeeded());
        assert_eq!(report.backends[1].read_all.unwrap().count, 200);
        assert_eq!(report.failed_backends().count(), 1);

        // close ran for both, including the one that failed init
        assert_eq!(closes.load(Ordering::SeqCst), 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("== broken ==\nFailed: InitializationError"));
        assert!(text.contains("== working ==\nWrite: "));
    }

    #[test]
    fn test_output_format_and_counts() {
        let closes = Arc::new(AtomicUsize::new(0));
        let config = small_config();
        let rule = config.search_rule_key.clone();

        let mut out = Vec::new();
        let report = BenchmarkRunner::new(config)
            .run(vec![VecRepository::boxed("vec", false, &closes)], &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Database Benchmark\nItems=200, batchSize=50, searchRuleKey=java:S1234\n"));
        assert!(text.contains("ReadAll: "));
        assert!(text.contains(" ms (200)"));
        assert!(!text.contains("Artifact: "));

        let search = report.backends[0].search.unwrap();
        assert!(text.contains(&format!("Search(rule='{}'): ", rule)));
        assert!(text.contains(&format!(" ms ({})", search.count)));
    }

    #[test]
    fn test_empty_rule_keys_abort_the_run() {
        let config = BenchmarkConfig {
            rule_keys: Vec::new(),
            ..small_config()
        };
        let result = BenchmarkRunner::new(config).run(Vec::new(), &mut Vec::new());
        assert!(matches!(result, Err(BenchmarkError::Generator(_))));
    }

    #[test]
    fn test_real_backend_report() {
        let mut repo = crate::registry::open_repository(
            crate::registry::BackendId::Sqlite,
            ArtifactLocation::Temp,
            25,
        );
        let data = IssueGenerator::with_defaults().generate(100);
        let runner = BenchmarkRunner::new(small_config());

        let mut out = Vec::new();
        let report = runner.run_backend(repo.as_mut(), &data, &mut out).unwrap();
        assert!(report.succeeded(), "{:?}", report.error);
        assert_eq!(report.name, "SQLite-WAL");
        assert_eq!(report.write.unwrap().count, 100);
        assert_eq!(report.read_all.unwrap().count, 100);
        assert!(repo.artifact_path().is_none() || !repo.artifact_path().unwrap().exists());

        let text = String::from_utf8(out).unwrap();
        let line = text.lines().find(|l| l.starts_with("Artifact: ")).unwrap();
        assert!(line.ends_with("issues.db"), "{line}");
    }
}
