//! Harness configuration
//!
//! Everything has a default, so an absent file and an empty file behave the
//! same. `key=value` tokens on the command line override these values.

use anyhow::{Context, Result};
use issuebench_benchmarks::{BenchmarkConfig, CrashDefaults};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::cli::LogLevel;

/// Top-level harness configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Log level used when no flag is given
    pub log_level: Option<LogLevel>,
    /// Defaults for `issuebench bench`
    pub benchmark: BenchmarkConfig,
    /// Defaults for `issuebench crash`
    pub crash: CrashDefaults,
}

impl HarnessConfig {
    /// Load from `path`, or the built-in defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        debug!(path = %path.display(), "Loaded harness config");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
