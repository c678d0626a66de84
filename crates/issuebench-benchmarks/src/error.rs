//! Error types for the benchmark orchestrator and crash controller

use issuebench_core::{GeneratorError, RepositoryError};
use thiserror::Error;

/// Error from a benchmark run
///
/// Repository failures are isolated per backend and end up in the report;
/// only dataset generation and output errors abort a run.
#[derive(Error, Debug)]
pub enum BenchmarkError {
    #[error("Dataset generation failed: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Error from a crash-scenario phase
#[derive(Error, Debug)]
pub enum CrashError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Dataset generation failed: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CrashError {
    /// Classification printed with a verification failure
    pub fn classification(&self) -> &'static str {
        match self {
            CrashError::Repository(e) => e.classification(),
            CrashError::Generator(_) => "GeneratorError",
            CrashError::Io(_) => "IoError",
        }
    }
}
