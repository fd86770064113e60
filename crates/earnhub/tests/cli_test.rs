//! Integration tests for the `earnhub` CLI binary.
//!
//! Argument parsing, help output, completions, and error exit codes run
//! without a backend; the remaining tests point the binary at a wiremock
//! server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `earnhub` binary with env isolation.
///
/// Clears all `EARNHUB_*` env vars and points the config file at a
/// scratch path so tests never touch the user's real configuration.
fn earnhub_cmd(config_dir: &tempfile::TempDir) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("earnhub");
    cmd.env("HOME", config_dir.path())
        .env("XDG_CONFIG_HOME", config_dir.path())
        .env("EARNHUB_CONFIG", config_dir.path().join("config.toml"))
        .env_remove("EARNHUB_PROFILE")
        .env_remove("EARNHUB_API_URL")
        .env_remove("EARNHUB_OUTPUT")
        .env_remove("EARNHUB_INSECURE")
        .env_remove("EARNHUB_TIMEOUT")
        .env_remove("EARNHUB_TOKEN");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn token_for(user_id: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"userId":"{user_id}"}}"#));
    format!("eyJhbGciOiJIUzI1NiJ9.{payload}.signature")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    earnhub_cmd(&dir).arg("--help").assert().success().stdout(
        predicate::str::contains("EarnHub")
            .and(predicate::str::contains("offers"))
            .and(predicate::str::contains("wallet"))
            .and(predicate::str::contains("trackings")),
    );
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    earnhub_cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("earnhub"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    let dir = tempfile::tempdir().unwrap();
    earnhub_cmd(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    let dir = tempfile::tempdir().unwrap();
    earnhub_cmd(&dir)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_fish() {
    let dir = tempfile::tempdir().unwrap();
    earnhub_cmd(&dir)
        .args(["completions", "fish"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir).arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("invalid") || text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_wallet_without_login_exits_auth() {
    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .args([
            "--profile",
            "cli-test-anonymous",
            "--api-url",
            "http://127.0.0.1:9",
            "wallet",
            "show",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("Not logged in"));
}

#[test]
fn test_unknown_profile_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .args(["--profile", "nope", "offers", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("nope"));
}

#[test]
fn test_admin_delete_requires_yes_when_non_interactive() {
    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .env("EARNHUB_TOKEN", token_for("admin-1"))
        .args(["--api-url", "http://127.0.0.1:9", "admin", "offers", "delete", "o1"])
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honors_env() {
    let dir = tempfile::tempdir().unwrap();
    let expected = dir.path().join("config.toml");
    earnhub_cmd(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn test_config_set_then_use_profile() {
    let dir = tempfile::tempdir().unwrap();
    earnhub_cmd(&dir)
        .args(["--profile", "staging", "config", "set", "api_url", "http://localhost:4000/"])
        .assert()
        .success();

    earnhub_cmd(&dir)
        .args(["config", "use", "staging"])
        .assert()
        .success();

    earnhub_cmd(&dir)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("staging *"));

    let written = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(written.contains("http://localhost:4000/"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .args(["config", "set", "colour", "blue"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("unknown config key"));
}

#[test]
fn test_config_use_missing_profile() {
    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .args(["config", "use", "ghost"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("ghost"));
}

// ── Against a mock backend ──────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_offers_list_json_merges_status() {
    let server = MockServer::start().await;
    let token = token_for("user-1");

    Mock::given(method("GET"))
        .and(path("/v1/offer/get-all-offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "offers": [
                { "_id": "o1", "name": "Demat Account", "amount": 150, "isActive": true, "order": 1 },
                { "_id": "o2", "name": "Survey", "amount": 20, "isActive": true, "order": 2 }
            ]}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/tracking/my-trackings"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "trackings": [
                { "_id": "t1", "userId": "user-1", "offerId": "o1", "status": "clicked" },
                { "_id": "t2", "userId": "user-1", "offerId": "o1", "status": "completed" }
            ]}
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .env("EARNHUB_TOKEN", &token)
        .args(["--api-url", &server.uri(), "-o", "json", "offers", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = listing.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], "o1");
    assert_eq!(rows[0]["status"], "completed");
    assert!(rows[1]["status"].is_null());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_token_exits_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/wallet/user-1/wallet-by-user-id"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "status": "error",
            "data": { "message": "jwt expired" }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .env("EARNHUB_TOKEN", token_for("user-1"))
        .args(["--api-url", &server.uri(), "wallet", "show"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_open_unknown_offer_exits_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/offer/get-all-offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "offers": [] }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/tracking/my-trackings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": { "trackings": [] }
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = earnhub_cmd(&dir)
        .env("EARNHUB_TOKEN", token_for("user-1"))
        .args(["--api-url", &server.uri(), "offers", "open", "missing"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}
