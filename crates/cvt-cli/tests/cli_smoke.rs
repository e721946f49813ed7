//! Smoke tests for the `cvt` binary.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

/// A backend address nothing listens on.
const OFFLINE: &str = "http://127.0.0.1:1";

fn cvt(session_dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cvt").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("CVT_API_URL", OFFLINE)
        .env("CVT_SESSION_FILE", session_dir.path().join("session.json"));
    cmd
}

#[test]
fn help_lists_every_page() {
    let dir = tempfile::tempdir().unwrap();
    cvt(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("member")
                .and(predicate::str::contains("software"))
                .and(predicate::str::contains("container"))
                .and(predicate::str::contains("guide")),
        );
}

#[test]
fn unknown_environment_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    cvt(&dir)
        .env_remove("CVT_API_URL")
        .args(["--env", "staging", "dashboard"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown environment"));
}

#[test]
fn whoami_without_session_fails() {
    let dir = tempfile::tempdir().unwrap();
    cvt(&dir)
        .args(["auth", "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: not signed in"));
}

#[test]
fn staff_pages_fall_back_to_dashboard() {
    let dir = tempfile::tempdir().unwrap();
    cvt(&dir)
        .args(["--lang", "en", "container", "ls"])
        .assert()
        .success()
        .stderr(predicate::str::contains("sign in as a technician or admin"))
        .stdout(predicate::str::contains("Not signed in").and(predicate::str::contains("🔒")));
}

#[test]
fn dashboard_json_lists_navigation() {
    let dir = tempfile::tempdir().unwrap();
    let output = cvt(&dir)
        .args(["--lang", "en", "--format", "json", "dashboard"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(view["user"].is_null());
    let nav = view["navigation"].as_array().unwrap();
    assert_eq!(nav.len(), 5);
    assert!(nav.iter().any(|entry| entry["label"] == "Containers"));
    assert!(nav.iter().all(|entry| entry["locked"] == true));
}

#[test]
fn invalid_login_never_contacts_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    cvt(&dir)
        .args(["--lang", "en", "auth", "login", "--email", "not-an-email", "--password", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid input: email"));
    assert!(!dir.path().join("session.json").exists());
}

#[test]
fn logout_clears_a_stale_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(
        &path,
        r#"{"baseUrl":"http://127.0.0.1:1/","cookie":"session=old","savedAt":"2026-01-01T00:00:00Z"}"#,
    )
    .unwrap();
    cvt(&dir).args(["auth", "logout"]).assert().failure();
    assert!(!path.exists());
}
