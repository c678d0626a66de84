use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level for the `--log-level` flag and the `log_level` config key
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors (default)
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "issuebench")]
#[command(about = "issuebench - embedded storage benchmark and crash-consistency harness")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value or defaults to 'warn'
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML config file with benchmark and crash defaults
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Flag level, then `--verbose`, then the config value, then `warn`
    pub fn effective_log_level(&self, configured: Option<LogLevel>) -> LogLevel {
        self.log_level
            .or(self.verbose.then_some(LogLevel::Debug))
            .or(configured)
            .unwrap_or(LogLevel::Warn)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the write/read/search benchmark against every backend
    ///
    /// Accepts items=<n> batch=<n> rule=<ruleKey> seed=<n>
    Bench {
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// Prepare or verify one crash-consistency artifact
    ///
    /// Accepts mode=prepare|verify db=<id> path=<path> items=<n> batch=<n>
    /// waitsec=<n> sleepms=<n> rule=<ruleKey>
    Crash {
        #[arg(value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_collected_in_order() {
        let cli = Cli::parse_from(["issuebench", "crash", "mode=verify", "db=redb", "path=/tmp/x"]);
        match cli.command {
            Commands::Crash { params } => {
                assert_eq!(params, vec!["mode=verify", "db=redb", "path=/tmp/x"])
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["issuebench", "bench", "-l", "info", "items=10"]);
        assert_eq!(cli.log_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::parse_from(["issuebench", "-v", "bench"]);
        assert_eq!(cli.effective_log_level(Some(LogLevel::Error)), LogLevel::Debug);

        let cli = Cli::parse_from(["issuebench", "-v", "-l", "trace", "bench"]);
        assert_eq!(cli.effective_log_level(None), LogLevel::Trace);

        let cli = Cli::parse_from(["issuebench", "bench"]);
        assert_eq!(cli.effective_log_level(Some(LogLevel::Info)), LogLevel::Info);
        assert_eq!(cli.effective_log_level(None), LogLevel::Warn);
    }
}
