//! CLI integration tests for the pame command-line interface.
//!
//! These tests do not require a running server. Each test points
//! `PAME_CONFIG_DIR` at a temporary directory so nothing touches the real
//! user config or credentials.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the pame binary with an isolated config directory.
fn pame(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pame").unwrap();
    cmd.env("PAME_CONFIG_DIR", config_dir.path())
        .env_remove("PAME_API_BASE_URL")
        .env_remove("PAME_PASSWORD")
        .current_dir(config_dir.path());
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin client"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pame"));
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("password"))
        .stdout(predicate::str::contains("users"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_auth_help_lists_actions() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("refresh"));
}

#[test]
fn test_password_help_lists_steps() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["password", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forgot"))
        .stdout(predicate::str::contains("verify"))
        .stdout(predicate::str::contains("reset"));
}

#[test]
fn test_users_help_lists_actions() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["users", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("update"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_global_flags_accepted() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["--verbose", "--json", "--server", "http://localhost:9999", "--help"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_subcommand_fails() {
    let dir = TempDir::new().unwrap();
    pame(&dir).assert().failure();
}

#[test]
fn test_users_get_requires_numeric_id() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["users", "get", "abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_users_update_enable_conflicts_with_disable() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["users", "update", "1", "--enable", "--disable"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_password_verify_requires_email() {
    let dir = TempDir::new().unwrap();
    pame(&dir).args(["password", "verify"]).assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Offline Behaviour
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_auth_status_signed_out_json() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"signed_in\": false"))
        .stdout(predicate::str::contains("127.0.0.1:4000"));
}

#[test]
fn test_auth_status_reads_stored_credentials() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("credentials.json"),
        r#"{"auth_token":"t","auth_refresh_token":"r","auth_email":"admin@example.com"}"#,
    )
    .unwrap();

    pame(&dir)
        .args(["--json", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"signed_in\": true"))
        .stdout(predicate::str::contains("admin@example.com"))
        .stdout(predicate::str::contains("\"has_refresh_token\": true"));
}

#[test]
fn test_server_flag_overrides_base_url() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["--json", "--server", "http://api.internal:8080", "auth", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api.internal:8080"));
}

#[test]
fn test_users_requires_sign_in() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["users", "get", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not signed in"));
}

#[test]
fn test_config_path_uses_config_dir() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    pame(&dir)
        .args(["config", "init", "--base-url", "http://10.0.0.5:4000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));

    assert!(dir.path().join("config.toml").is_file());

    pame(&dir)
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://10.0.0.5:4000"))
        .stdout(predicate::str::contains("\"timeout_secs\": 15"));
}
