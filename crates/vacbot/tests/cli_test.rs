//! Integration tests for the `vacbot` CLI binary.
//!
//! Robot-facing commands run against the simulated robot, so no hardware
//! or network is needed. Every test gets its own HOME so the remembered
//! connection and config file never leak between tests or from the user.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `vacbot` binary isolated under `home`.
fn vacbot_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vacbot");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env("VACBOT_SIMULATION__LATENCY_MS", "0")
        .env_remove("VACBOT_OUTPUT")
        .env_remove("VACBOT_SIMULATE")
        .env_remove("VACBOT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

/// A fresh HOME plus a command builder bound to it.
fn sandbox() -> (TempDir, impl Fn() -> assert_cmd::Command) {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().to_path_buf();
    (home, move || vacbot_cmd(&path))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_home, vacbot) = sandbox();
    let output = vacbot().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_home, vacbot) = sandbox();
    vacbot().arg("--help").assert().success().stdout(
        predicate::str::contains("VacBot")
            .and(predicate::str::contains("connect"))
            .and(predicate::str::contains("schedule"))
            .and(predicate::str::contains("--simulate")),
    );
}

#[test]
fn test_version_flag() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vacbot"));
}

#[test]
fn test_completions_bash() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_invalid_shell() {
    let (_home, vacbot) = sandbox();
    let output = vacbot().args(["completions", "tcsh"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Status without a connection ─────────────────────────────────────

#[test]
fn test_status_without_connection_is_offline() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "status", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"connectivityState\": \"Offline\"")
                .and(predicate::str::contains("\"isCleaning\": false")),
        );
}

#[test]
fn test_status_table_reports_missing_connection() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "--color", "never", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not configured"));
}

#[test]
fn test_command_without_connection_fails() {
    let (_home, vacbot) = sandbox();
    let output = vacbot().args(["--simulate", "start"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected NOT_CONFIGURED");
    let text = combined_output(&output);
    assert!(
        text.contains("No robot connection configured"),
        "Expected hint in output:\n{text}"
    );
}

// ── Connect and drive the simulated robot ───────────────────────────

#[test]
fn test_connect_is_remembered_between_runs() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "connect", "wifi", "10.0.0.5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Connected to wifi 10.0.0.5"));

    vacbot()
        .args(["--simulate", "status", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("online"));

    vacbot()
        .args(["--simulate", "--color", "never", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wifi 10.0.0.5 (connected)"));
}

#[test]
fn test_commands_reach_simulated_robot() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "connect", "ble", "sim-vacbot-01"])
        .assert()
        .success();

    vacbot()
        .args(["--simulate", "start"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Cleaning started"));

    vacbot()
        .args(["--simulate", "dock", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_schedule_list_and_invalid_add() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "connect", "wifi", "10.0.0.5"])
        .assert()
        .success();

    vacbot()
        .args(["--simulate", "schedule", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Monday 09:00"));

    let output = vacbot()
        .args(["--simulate", "schedule", "add", "Funday", "10:00"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected USAGE");
    let text = combined_output(&output);
    assert!(text.contains("Funday"), "Expected rejected day in output:\n{text}");
}

#[test]
fn test_map_prints_json_object() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "connect", "wifi", "10.0.0.5"])
        .assert()
        .success();

    vacbot()
        .args(["--simulate", "map", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"));
}

// ── Forget ──────────────────────────────────────────────────────────

#[test]
fn test_forget_requires_confirmation_when_not_interactive() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "connect", "wifi", "10.0.0.5"])
        .assert()
        .success();

    let output = vacbot().args(["--simulate", "forget"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("--yes"), "Expected --yes hint:\n{text}");
}

#[test]
fn test_forget_with_yes_drops_connection() {
    let (_home, vacbot) = sandbox();
    vacbot()
        .args(["--simulate", "connect", "wifi", "10.0.0.5"])
        .assert()
        .success();

    vacbot()
        .args(["--simulate", "forget", "--yes"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Forgot wifi 10.0.0.5"));

    let output = vacbot().args(["--simulate", "start"]).output().unwrap();
    assert_eq!(output.status.code(), Some(3));
}

// ── Scan ────────────────────────────────────────────────────────────

#[test]
fn test_scan_lists_only_robots() {
    let (_home, vacbot) = sandbox();
    let output = vacbot()
        .args(["--simulate", "scan", "--secs", "1", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let ids: Vec<&str> = stdout.lines().collect();
    assert_eq!(ids, vec!["sim-vacbot-01", "sim-roboclean-02"]);
}

#[test]
fn test_scan_rejects_out_of_range_duration() {
    let (_home, vacbot) = sandbox();
    let output = vacbot()
        .args(["--simulate", "scan", "--secs", "0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_is_under_xdg_config_home() {
    let (home, vacbot) = sandbox();
    let expected = home.path().join("config").join("vacbot").join("config.toml");
    vacbot()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_config_init_then_show() {
    let (home, vacbot) = sandbox();
    vacbot().args(["config", "init", "--yes"]).assert().success();
    assert!(home.path().join("config/vacbot/config.toml").exists());

    vacbot()
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"timeout_secs\": 7")
                .and(predicate::str::contains("\"scan_secs\": 10")),
        );
}

#[test]
fn test_invalid_config_is_reported() {
    let (home, vacbot) = sandbox();
    let dir = home.path().join("config").join("vacbot");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "[wifi]\ntimeout_secs = 0\n").unwrap();

    let output = vacbot().args(["--simulate", "status"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("wifi.timeout_secs"), "Expected field name:\n{text}");
}
