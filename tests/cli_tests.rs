//! Command-line behaviour of the renacer-drm binary
#![allow(deprecated)] // suppress assert_cmd::Command::cargo_bin deprecation in tests

use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_cli_requires_command() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.assert().failure().stderr(predicate::str::contains(
        "Must specify either -p PID or command",
    ));
}

#[test]
fn test_cli_help() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--array-limit"));
}

#[test]
fn test_cli_pid_and_command_conflict() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.args(["-p", "1", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot specify both -p PID and command"));
}

#[test]
fn test_cli_rejects_unknown_filter_class() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.args(["-e", "ioctl=bogus", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown ioctl class or request"));
}

#[test]
fn test_cli_rejects_non_ioctl_expression() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.args(["-e", "trace=open", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid filter expression"));
}

#[test]
fn test_cli_rejects_bad_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "max_string_len = \"long\"").unwrap();
    file.flush().unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.arg("--config")
        .arg(file.path())
        .args(["--", "true"])
        .assert()
        .failure();
}

#[test]
fn test_cli_rejects_unknown_format() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.args(["--format", "yaml", "--", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
fn test_trace_exit_code_preserved() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.args(["--", "sh", "-c", "exit 42"]).assert().code(42);
}

#[test]
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
fn test_summary_without_ioctls() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.args(["-c", "--", "true"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No ioctls traced."));
}

#[test]
#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
fn test_json_without_ioctls() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("renacer-drm");
    cmd.args(["--format", "json", "--", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"format\": \"renacer-drm-json-v1\""))
        .stdout(predicate::str::contains("\"ioctls\": []"));
}
