//! CLI integration tests for the Docket command-line interface.
//!
//! These tests cover argument parsing and the commands that only touch the
//! local store. Nothing here needs Ollama, Chroma or a messaging channel.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A docket command isolated in its own config dir, working dir and database.
fn docket(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docket").unwrap();
    cmd.current_dir(dir.path())
        .env("DOCKET_CONFIG_DIR", dir.path().join("config"))
        .env("DOCKET_DB_PATH", dir.path().join("docket.db"))
        .env_remove("DOCKET_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("meetings"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docket"));
}

#[test]
fn test_ask_requires_question() {
    let dir = TempDir::new().unwrap();
    docket(&dir).arg("ask").assert().failure();
}

#[test]
fn test_invalid_category_rejected() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .args(["process", "--category", "gardening"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("gardening"));
}

#[test]
fn test_invalid_channel_rejected() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .args(["serve", "--channel", "carrier-pigeon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("carrier-pigeon"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Local Store Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_process_rejects_empty_input() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .arg("process")
        .write_stdin("   \n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No meeting content"));
}

#[test]
fn test_meetings_list_empty_json() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .args(["--json", "meetings", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
    assert!(dir.path().join("docket.db").exists());
}

#[test]
fn test_meetings_show_missing() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .args(["meetings", "show", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Meeting 42 not found"));
}

#[test]
fn test_meetings_calendar_missing() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .args(["meetings", "calendar", "42", "--out", "ics"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Meeting 42 not found"));
    assert!(!dir.path().join("ics").exists());
}

#[test]
fn test_meetings_search_requires_query() {
    let dir = TempDir::new().unwrap();
    docket(&dir).args(["meetings", "search"]).assert().failure();
}

#[test]
fn test_meetings_help_lists_search_and_calendar() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .args(["meetings", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("search"))
        .stdout(predicate::str::contains("calendar"));
}

#[test]
fn test_set_status_on_missing_item_fails() {
    let dir = TempDir::new().unwrap();
    docket(&dir)
        .args(["meetings", "set-status", "7", "completed"])
        .assert()
        .failure();
}

#[test]
fn test_explicit_config_file_is_used() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(
        &config,
        format!(
            "[storage]\npath = \"{}\"\n",
            dir.path().join("custom.db").display()
        ),
    )
    .unwrap();

    Command::cargo_bin("docket")
        .unwrap()
        .current_dir(dir.path())
        .env("DOCKET_CONFIG_DIR", dir.path().join("config"))
        .env_remove("DOCKET_DB_PATH")
        .args(["--config", config.to_str().unwrap(), "meetings", "list"])
        .assert()
        .success();
    assert!(dir.path().join("custom.db").exists());
}
