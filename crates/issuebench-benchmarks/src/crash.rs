//! Crash-consistency controller
//!
//! Two modes meant to run in separate processes against the same path:
//!
//! - **prepare** writes a deterministic dataset in batches and never closes
//!   the repository, so an external `kill -9` lands on an in-flight artifact
//! - **verify** reopens the artifact, reads it back, runs the backend's native
//!   integrity check when there is one, and always closes
//!
//! The controller never kills itself. Markers on `out` (`PID=`,
//! `WRITES_STARTED`, ...) are flushed immediately so a supervisor polling the
//! output can time the kill.

use std::fmt;
use std::io::Write;
use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use issuebench_core::{
    ArtifactLocation, IntegrityStatus, IssueGenerator, IssueRepository, RepositoryError,
    DEFAULT_RULE_KEYS, DEFAULT_SEED,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::CrashError;
use crate::registry::{self, BackendId};

/// Which half of the scenario to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashMode {
    Prepare,
    Verify,
}

impl FromStr for CrashMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("prepare") {
            Ok(CrashMode::Prepare)
        } else if s.eq_ignore_ascii_case("verify") {
            Ok(CrashMode::Verify)
        } else {
            Err(s.to_string())
        }
    }
}

/// Defaults for the parameters a crash invocation may omit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashDefaults {
    pub items: usize,
    pub batch: usize,
    pub rule: String,
    pub wait_secs: u64,
    pub sleep_ms: u64,
}

impl Default for CrashDefaults {
    fn default() -> Self {
        Self {
            items: 1_000_000,
            batch: 5_000,
            rule: "java:S1234".to_string(),
            wait_secs: 0,
            sleep_ms: 0,
        }
    }
}

/// Fully resolved parameters of one crash-scenario invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashConfig {
    pub backend: BackendId,
    pub path: PathBuf,
    pub items: usize,
    pub batch: usize,
    pub rule: String,
    /// Post-write hold with the artifact still open
    pub wait_secs: u64,
    /// Blocking delay after each batch
    pub sleep_ms: u64,
}

impl CrashConfig {
    pub fn new(backend: BackendId, path: impl Into<PathBuf>, defaults: &CrashDefaults) -> Self {
        Self {
            backend,
            path: path.into(),
            items: defaults.items,
            batch: defaults.batch,
            rule: defaults.rule.clone(),
            wait_secs: defaults.wait_secs,
            sleep_ms: defaults.sleep_ms,
        }
    }

    fn open_repository(&self) -> Box<dyn IssueRepository> {
        registry::open_repository(
            self.backend,
            ArtifactLocation::path(&self.path),
            self.batch.max(1),
        )
    }
}

/// Prepare-mode states; `Terminated` is only ever reached by an external kill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrepareState {
    Created,
    Initialized,
    WritesStarted,
    Writing,
    Waiting,
}

/// Verify-mode states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyState {
    Created,
    Initialized,
    ReadChecked,
    IntegrityChecked,
    Passed,
    Failed,
}

/// Current state plus transition logging
struct Tracker<S> {
    mode: &'static str,
    state: S,
}

impl<S: fmt::Debug + Copy> Tracker<S> {
    fn new(mode: &'static str, state: S) -> Self {
        Self { mode, state }
    }

    fn advance(&mut self, next: S) {
        debug!(mode = self.mode, from = ?self.state, to = ?next, "Crash scenario transition");
        self.state = next;
    }
}

fn marker(out: &mut impl Write, line: impl fmt::Display) -> std::io::Result<()> {
    writeln!(out, "{}", line)?;
    out.flush()
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Open the configured backend and run prepare mode against it
pub fn prepare(config: &CrashConfig, out: &mut impl Write) -> Result<PrepareState, CrashError> {
    run_prepare(config.open_repository(), config, out)
}

/// Prepare mode against an already constructed repository
///
/// The repository is leaked on every path, errors included, so neither
/// `close` nor `Drop` ever runs.
pub fn run_prepare(
    repo: Box<dyn IssueRepository>,
    config: &CrashConfig,
    out: &mut impl Write,
) -> Result<PrepareState, CrashError> {
    let mut repo = ManuallyDrop::new(repo);
    let mut tracker = Tracker::new("prepare", PrepareState::Created);
    marker(
        out,
        format_args!(
            "CrashScenario PREPARE: db={}, path={}, items={}, batch={}, rule={}, sleepMs={}",
            config.backend,
            config.path.display(),
            config.items,
            config.batch,
            config.rule,
            config.sleep_ms
        ),
    )?;

    let data = IssueGenerator::new(DEFAULT_SEED, DEFAULT_RULE_KEYS)?.generate(config.items);

    marker(out, format_args!("PID={}", std::process::id()))?;
    marker(
        out,
        format_args!("WRITES_STARTING at {}", chrono::Utc::now().to_rfc3339()),
    )?;

    repo.init()?;
    tracker.advance(PrepareState::Initialized);

    marker(out, "WRITES_STARTED")?;
    tracker.advance(PrepareState::WritesStarted);

    let sleep = Duration::from_millis(config.sleep_ms);
    for (n, chunk) in data.chunks(config.batch.max(1)).enumerate() {
        repo.insert_all(chunk)?;
        if tracker.state != PrepareState::Writing {
            tracker.advance(PrepareState::Writing);
        }
        debug!(batch = n, records = chunk.len(), "Batch written");
        if !sleep.is_zero() {
            std::thread::sleep(sleep);
        }
    }

    let path = repo
        .artifact_path()
        .map(absolute)
        .unwrap_or_else(|| absolute(&config.path));
    marker(out, format_args!("Prepared DB at: {}", path.display()))?;
    marker(out, "If you want to simulate a crash, kill this process now.")?;

    tracker.advance(PrepareState::Waiting);
    if config.wait_secs > 0 {
        marker(out, format_args!("Waiting for {} seconds...", config.wait_secs))?;
        std::thread::sleep(Duration::from_secs(config.wait_secs));
    }

    info!(backend = %config.backend, path = %path.display(), "Prepare finished without close");
    Ok(tracker.state)
}

/// Open the configured backend and run verify mode against it
pub fn verify(config: &CrashConfig, out: &mut impl Write) -> Result<VerifyState, CrashError> {
    run_verify(config.open_repository(), config, out)
}

/// Verify mode against an already constructed repository
///
/// Any error is printed with its classification and returned; the repository
/// is closed in every case.
pub fn run_verify(
    mut repo: Box<dyn IssueRepository>,
    config: &CrashConfig,
    out: &mut impl Write,
) -> Result<VerifyState, CrashError> {
    let mut tracker = Tracker::new("verify", VerifyState::Created);
    marker(
        out,
        format_args!(
            "CrashScenario VERIFY: db={}, path={}",
            config.backend,
            config.path.display()
        ),
    )?;

    let outcome = verify_steps(repo.as_mut(), config, out, &mut tracker);

    let result = match outcome {
        Ok(()) => {
            tracker.advance(VerifyState::Passed);
            marker(out, "Verification assertions passed.")?;
            Ok(tracker.state)
        }
        Err(e) => {
            tracker.advance(VerifyState::Failed);
            error!(classification = e.classification(), error = %e, "Verification failed");
            report_failure(out, &e)?;
            Err(e)
        }
    };

    repo.close();
    result
}

fn verify_steps(
    repo: &mut dyn IssueRepository,
    config: &CrashConfig,
    out: &mut impl Write,
    tracker: &mut Tracker<VerifyState>,
) -> Result<(), CrashError> {
    // init would create a fresh artifact; verify only reopens an existing one
    if !config.path.exists() {
        return Err(RepositoryError::initialization(format!(
            "No artifact at {}",
            config.path.display()
        ))
        .into());
    }
    repo.init()?;
    tracker.advance(VerifyState::Initialized);

    let count = repo.read_all()?.len();
    marker(out, format_args!("ReadAll succeeded. items={}", count))?;

    let found = repo.search_by_rule(&config.rule)?.len();
    marker(
        out,
        format_args!("Search(rule='{}') found={}", config.rule, found),
    )?;
    tracker.advance(VerifyState::ReadChecked);

    let label = config.backend.integrity_label();
    let status = repo.integrity_check()?;
    match &status {
        IntegrityStatus::Checked { report } => {
            marker(out, format_args!("{} = {}", label, report))?;
            if !status.is_ok() {
                return Err(RepositoryError::IntegrityCheckFailed(format!(
                    "{} returned: {}",
                    label, report
                ))
                .into());
            }
        }
        IntegrityStatus::Unavailable => {
            marker(
                out,
                format_args!(
                    "{}: basic open/query succeeded (no explicit integrity check available)",
                    label
                ),
            )?;
        }
    }
    tracker.advance(VerifyState::IntegrityChecked);

    Ok(())
}

/// Print classification, message and source chain
fn report_failure(out: &mut impl Write, err: &CrashError) -> std::io::Result<()> {
    writeln!(out, "Verification failed: {}: {}", err.classification(), err)?;
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        writeln!(out, "  caused by: {}", cause)?;
        source = cause.source();
    }
    out.flush()
}
