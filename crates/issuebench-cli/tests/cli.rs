//! End-to-end tests driving the built `issuebench` binary

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use std::time::Duration;

const BIN: &str = env!("CARGO_BIN_EXE_issuebench");

fn issuebench() -> Command {
    Command::new(BIN)
}

#[test]
fn crash_without_required_keys_prints_usage() {
    issuebench()
        .args(["crash", "mode=prepare"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Usage: issuebench crash"));
}

#[test]
fn crash_with_unknown_mode_exits_zero() {
    issuebench()
        .args(["crash", "mode=melt", "db=sqlite", "path=/tmp/issuebench-unused.db"])
        .assert()
        .success()
        .stdout("Unknown mode: melt\n");
}

#[test]
fn crash_with_unknown_backend_fails() {
    issuebench()
        .args(["crash", "mode=verify", "db=h2", "path=/tmp/issuebench-unused.db"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported backend: h2"));
}

#[test]
fn bench_runs_every_backend() {
    issuebench()
        .args(["bench", "items=200", "batch=50", "rule=java:S1234", "bogus=1"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "Database Benchmark\nItems=200, batchSize=50, searchRuleKey=java:S1234\n",
        ))
        .stdout(predicate::str::contains("== SQLite-WAL ==\nWrite: "))
        .stdout(predicate::str::contains("== SQLite-Rollback ==\nWrite: "))
        .stdout(predicate::str::contains("== SurrealDB ==\nWrite: "))
        .stdout(predicate::str::contains("== redb ==\nWrite: "))
        .stdout(predicate::str::contains("ms (200)"))
        .stdout(predicate::str::contains("\nArtifact: "))
        .stdout(predicate::str::contains("Failed:").not());
}

#[test]
fn bench_reads_defaults_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("issuebench.toml");
    std::fs::write(
        &config,
        "[benchmark]\nitem_count = 120\nbatch_size = 40\nsearch_rule_key = \"js:S3776\"\n",
    )
    .unwrap();

    issuebench()
        .arg("-C")
        .arg(&config)
        .args(["bench", "batch=60"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Items=120, batchSize=60, searchRuleKey=js:S3776",
        ));
}

#[test]
fn bad_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[benchmark\n").unwrap();

    issuebench()
        .arg("--config")
        .arg(&config)
        .arg("bench")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn verify_of_missing_path_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never-prepared.redb");

    issuebench()
        .args(["crash", "mode=verify", "db=redb"])
        .arg(format!("path={}", path.display()))
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "Verification failed: InitializationError: No artifact at ",
        ));
    assert!(!path.exists());
}

#[test]
fn verify_of_garbage_file_fails_with_classification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.db");
    std::fs::write(&path, vec![0xA5u8; 8192]).unwrap();

    issuebench()
        .args(["crash", "mode=verify", "db=sqlite"])
        .arg(format!("path={}", path.display()))
        .assert()
        .failure()
        .stdout(predicate::str::contains("Verification failed: "))
        .stdout(predicate::str::contains("Verification assertions passed.").not());
}

/// Start prepare, wait for the first write, kill it, then verify the artifact
fn kill_during_writes_then_verify(db: &str, path: &Path) {
    let mut child = StdCommand::new(BIN)
        .args(["crash", "mode=prepare", "items=5000", "batch=200", "sleepms=50"])
        .arg(format!("db={db}"))
        .arg(format!("path={}", path.display()))
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let stdout = child.stdout.take().unwrap();
    let mut seen = Vec::new();
    for line in BufReader::new(stdout).lines() {
        let line = line.unwrap();
        let started = line == "WRITES_STARTED";
        seen.push(line);
        if started {
            break;
        }
    }
    assert_eq!(seen.last().map(String::as_str), Some("WRITES_STARTED"), "{seen:?}");
    assert!(seen.iter().any(|l| l.starts_with("PID=")));
    assert!(seen.iter().any(|l| l.starts_with("WRITES_STARTING at ")));

    std::thread::sleep(Duration::from_millis(150));
    child.kill().unwrap();
    child.wait().unwrap();

    issuebench()
        .args(["crash", "mode=verify"])
        .arg(format!("db={db}"))
        .arg(format!("path={}", path.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("ReadAll succeeded. items="))
        .stdout(predicate::str::ends_with("Verification assertions passed.\n"));
}

#[test]
fn sqlite_survives_kill_during_writes() {
    let dir = tempfile::tempdir().unwrap();
    kill_during_writes_then_verify("sqlite", &dir.path().join("crash-wal.db"));
}

#[test]
fn sqlite_rollback_survives_kill_during_writes() {
    let dir = tempfile::tempdir().unwrap();
    kill_during_writes_then_verify("sqlite-rollback", &dir.path().join("crash-rollback.db"));
}

#[test]
fn redb_survives_kill_during_writes() {
    let dir = tempfile::tempdir().unwrap();
    kill_during_writes_then_verify("redb", &dir.path().join("crash.redb"));
}

#[test]
fn completed_prepare_verifies_with_full_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("complete.redb");
    let path_arg = format!("path={}", path.display());

    issuebench()
        .args(["crash", "mode=prepare", "db=redb", "items=300", "batch=100", "waitsec=0"])
        .arg(&path_arg)
        .assert()
        .success()
        .stdout(predicate::str::contains("Prepared DB at: "))
        .stdout(predicate::str::contains(
            "If you want to simulate a crash, kill this process now.",
        ));

    issuebench()
        .args(["crash", "mode=verify", "db=redb"])
        .arg(&path_arg)
        .assert()
        .success()
        .stdout(predicate::str::contains("ReadAll succeeded. items=300"))
        .stdout(predicate::str::contains("redb check_integrity = ok"));
}

#[test]
fn surrealdb_verify_uses_weaker_label() {
    let dir = tempfile::tempdir().unwrap();
    let path_arg = format!("path={}", dir.path().join("surreal").display());

    issuebench()
        .args(["crash", "mode=prepare", "db=surrealdb", "items=150", "batch=50"])
        .arg(&path_arg)
        .assert()
        .success();

    issuebench()
        .args(["crash", "mode=verify", "db=surrealdb"])
        .arg(&path_arg)
        .assert()
        .success()
        .stdout(predicate::str::contains("ReadAll succeeded. items="))
        .stdout(predicate::str::contains(
            "SurrealDB integrity: basic open/query succeeded (no explicit integrity check available)",
        ));
}
