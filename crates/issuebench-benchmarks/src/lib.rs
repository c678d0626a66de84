//! issuebench harness
//!
//! This crate contains:
//! - the backend registry mapping `db=` ids to repository adapters
//! - the benchmark orchestrator (write, read-all and search timings)
//! - the crash-consistency controller (prepare and verify modes)
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Full harness through the binary
//! issuebench bench items=100000 batch=5000 rule=java:S1234
//!
//! # Criterion write-path comparison
//! cargo bench -p issuebench-benchmarks
//! ```

pub mod crash;
pub mod error;
pub mod registry;
pub mod runner;

// Re-exports
pub use crash::{CrashConfig, CrashDefaults, CrashMode, PrepareState, VerifyState};
pub use error::{BenchmarkError, CrashError};
pub use registry::{all_backends, open_repository, BackendId};
pub use runner::{BackendReport, BenchmarkConfig, BenchmarkReport, BenchmarkRunner, PhaseResult};
