//! CLI end-to-end tests that invoke the compiled `dbsync` binary.
//!
//! Each test gets its own workspace with a `.env` file and runs the binary
//! with a cleared environment so `DB_*` variables of the host do not leak in.
//! PowerShell is never reached: `HOST_SHELL` names a program that does not
//! exist.

use std::fs;

use assert_cmd::Command;
use dbsync_test_utils::TestWorkspace;
use predicates::prelude::*;

const MISSING_SHELL: &str = "dbsync-test-no-such-shell";

/// Returns a command for the compiled `dbsync` binary running in `ws`.
fn dbsync(ws: &TestWorkspace) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dbsync"));
    cmd.current_dir(ws.root().to_native()).env_clear();
    for key in ["PATH", "SYSTEMROOT", "TEMP", "TMP", "TMPDIR"] {
        if let Ok(value) = std::env::var(key) {
            cmd.env(key, value);
        }
    }
    cmd
}

fn remote_file(ws: &TestWorkspace, file: &str, contents: &str) -> dbsync_fs::NormalizedPath {
    let path = ws.remote_path(file);
    fs::write(path.to_native(), contents).unwrap();
    path
}

#[test]
fn test_help_exits_zero() {
    let ws = TestWorkspace::new();
    dbsync(&ws)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--links-only"))
        .stdout(predicate::str::contains("--check-network"));
}

#[test]
fn test_version_exits_zero() {
    let ws = TestWorkspace::new();
    dbsync(&ws)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dbsync"));
}

#[test]
fn test_conflicting_modes_are_rejected() {
    let ws = TestWorkspace::new();
    dbsync(&ws)
        .args(["--links-only", "--check-network"])
        .assert()
        .code(2);
}

#[test]
fn test_no_databases_configured_exits_with_config_error() {
    let mut ws = TestWorkspace::new();
    ws.configure("HOST_SHELL", MISSING_SHELL);
    ws.write_env();

    dbsync(&ws)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("DB_"));
}

#[test]
fn test_missing_env_file_exits_with_config_error() {
    let ws = TestWorkspace::new();
    dbsync(&ws)
        .args(["--env-file", "nowhere.env"])
        .assert()
        .code(2);
}

#[test]
fn test_malformed_settings_file_exits_with_config_error() {
    let mut ws = TestWorkspace::new();
    let brass = remote_file(&ws, "brass.mdb", "brass");
    ws.add_database("BRASS", &brass);
    ws.write_env();
    fs::write(ws.root().join("dbsync.toml").to_native(), "tail_size = [").unwrap();

    dbsync(&ws)
        .args(["--settings", "dbsync.toml"])
        .assert()
        .code(2);
}

#[test]
fn test_check_network_reachable_exits_zero() {
    let mut ws = TestWorkspace::new();
    let brass = remote_file(&ws, "brass.mdb", "brass");
    ws.add_database("BRASS", &brass);
    ws.configure("HOST_SHELL", MISSING_SHELL);
    ws.write_env();

    dbsync(&ws)
        .arg("--check-network")
        .assert()
        .success()
        .stdout(predicate::str::contains("check-network"))
        .stdout(predicate::str::contains("BRASS"));

    assert!(!ws.local_dir().exists());
}

#[test]
fn test_check_network_unreachable_exits_one() {
    let mut ws = TestWorkspace::new();
    let brass = remote_file(&ws, "brass.mdb", "brass");
    ws.add_database("BRASS", &brass);
    let offline = ws.offline_path("offline.mdb");
    ws.add_database("OFFLINE", &offline);
    ws.configure("HOST_SHELL", MISSING_SHELL);
    ws.write_env();

    dbsync(&ws)
        .arg("--check-network")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL"))
        .stdout(predicate::str::contains("OFFLINE"));
}

#[test]
fn test_links_only_without_local_copies_exits_zero() {
    let mut ws = TestWorkspace::new();
    let brass = remote_file(&ws, "brass.mdb", "brass");
    ws.add_database("BRASS", &brass);
    ws.configure("HOST_SHELL", MISSING_SHELL);
    ws.write_env();

    dbsync(&ws).arg("--links-only").assert().success();

    assert!(!ws.local_path("brass.mdb").exists());
}

#[test]
fn test_full_run_without_host_copies_then_fails() {
    let mut ws = TestWorkspace::new();
    let brass = remote_file(&ws, "brass.mdb", "brass contents");
    ws.add_database("BRASS", &brass);
    ws.configure("HOST_SHELL", MISSING_SHELL);
    ws.write_env();

    dbsync(&ws)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAILED"));

    let copied = fs::read_to_string(ws.local_path("brass.mdb").to_native()).unwrap();
    assert_eq!(copied, "brass contents");
}

#[test]
fn test_log_file_is_appended() {
    let mut ws = TestWorkspace::new();
    let brass = remote_file(&ws, "brass.mdb", "brass");
    ws.add_database("BRASS", &brass);
    ws.configure("HOST_SHELL", MISSING_SHELL);
    ws.write_env();

    dbsync(&ws)
        .args(["--check-network", "--log-file", "logs/run.log"])
        .assert()
        .success();
    dbsync(&ws)
        .args(["--check-network", "--log-file", "logs/run.log"])
        .assert()
        .success();

    let log = fs::read_to_string(ws.root().join("logs/run.log").to_native()).unwrap();
    assert!(log.contains("BRASS"));
    assert!(!log.contains("\u{1b}["), "log file must not contain ANSI escapes");
    assert_eq!(log.matches("Starting check-network run").count(), 2);
}

#[test]
fn test_default_log_file_in_working_directory() {
    let mut ws = TestWorkspace::new();
    let brass = remote_file(&ws, "brass.mdb", "brass");
    ws.add_database("BRASS", &brass);
    ws.write_env();

    dbsync(&ws).arg("--check-network").assert().success();

    assert!(ws.root().join("db_local_importer.log").exists());
}
