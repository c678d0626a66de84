use anyhow::Result;
use issuebench_benchmarks::crash::{self, CrashConfig, CrashDefaults, CrashMode};
use issuebench_benchmarks::BackendId;
use std::io::Write;
use tracing::{debug, info};

use crate::args::KeyValueArgs;

pub const USAGE: &str = "Usage: issuebench crash mode=prepare|verify \
db=<sqlite|sqlite-rollback|surrealdb|redb> path=<path> \
[items=N batch=N waitsec=N sleepms=N rule=<ruleKey>]";

const KNOWN_KEYS: &[&str] = &[
    "mode", "db", "path", "items", "batch", "waitsec", "sleepms", "rule",
];

/// Execute `issuebench crash`
///
/// Missing required keys and unknown modes are reported on stdout and are
/// not errors. An unknown backend id, a prepare failure and a failed
/// verification all come back as `Err`.
pub fn execute(defaults: &CrashDefaults, params: &[String], out: &mut impl Write) -> Result<()> {
    let args = KeyValueArgs::parse(params);
    for key in args.unknown_keys(KNOWN_KEYS) {
        debug!(key, "Ignoring unknown crash parameter");
    }

    let (Some(mode), Some(db), Some(path)) = (args.get("mode"), args.get("db"), args.get("path"))
    else {
        writeln!(out, "{USAGE}")?;
        return Ok(());
    };

    let mode = match mode.parse::<CrashMode>() {
        Ok(mode) => mode,
        Err(unknown) => {
            writeln!(out, "Unknown mode: {unknown}")?;
            return Ok(());
        }
    };

    let backend: BackendId = db.parse()?;
    let config = resolve(backend, path, defaults, &args);

    match mode {
        CrashMode::Prepare => {
            let state = crash::prepare(&config, out)?;
            info!(?state, "Prepare returned");
        }
        CrashMode::Verify => {
            let state = crash::verify(&config, out)?;
            info!(?state, "Verify returned");
        }
    }
    Ok(())
}

fn resolve(
    backend: BackendId,
    path: &str,
    defaults: &CrashDefaults,
    args: &KeyValueArgs,
) -> CrashConfig {
    let mut config = CrashConfig::new(backend, path, defaults);
    config.items = args.parse_or("items", config.items);
    config.batch = args.parse_or("batch", config.batch).max(1);
    config.wait_secs = args.parse_or("waitsec", config.wait_secs);
    config.sleep_ms = args.parse_or("sleepms", config.sleep_ms);
    if let Some(rule) = args.get("rule") {
        config.rule = rule.to_string();
    }
    config
}
