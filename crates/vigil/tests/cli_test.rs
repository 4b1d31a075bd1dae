//! Integration tests for the `vigil` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a backend; the request commands run against wiremock.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `vigil` binary with env isolation.
///
/// Clears all `VIGIL_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn vigil_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("vigil");
    cmd.env("HOME", "/tmp/vigil-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/vigil-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("VIGIL_PROFILE")
        .env_remove("VIGIL_SERVER")
        .env_remove("VIGIL_SEARCH")
        .env_remove("VIGIL_OUTPUT")
        .env_remove("VIGIL_INSECURE")
        .env_remove("VIGIL_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = vigil_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    vigil_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("behavior-monitoring")
            .and(predicate::str::contains("alerts"))
            .and(predicate::str::contains("behaviors"))
            .and(predicate::str::contains("ask"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    vigil_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vigil"));
}

#[test]
fn test_unknown_output_format_is_usage_error() {
    vigil_cmd()
        .args(["-o", "xml", "alerts"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    vigil_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vigil"));
}

#[test]
fn test_completions_zsh() {
    vigil_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Configuration errors ────────────────────────────────────────────

#[test]
fn test_missing_server_is_reported() {
    let output = vigil_cmd().arg("alerts").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("No backend configured"),
        "Expected config error in output:\n{text}"
    );
}

#[test]
fn test_unknown_profile_is_reported() {
    let output = vigil_cmd()
        .args(["--profile", "lab", "behaviors"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Profile 'lab' not found"));
}

#[test]
fn test_non_http_server_is_rejected() {
    let output = vigil_cmd()
        .args(["--server", "ftp://camera.local", "alerts"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("server"));
}

#[test]
fn test_profile_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("vigil");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.toml"),
        "[profiles.lab]\nserver = \"not a url\"\n",
    )
    .unwrap();

    let output = vigil_cmd()
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["--profile", "lab", "alerts"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("invalid URL"));
}

// ── Request commands against a mock backend ─────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_alerts_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "alerts": [
                { "timestamp": "2025-03-28 20:10:00", "content": "检测到人员进行了抽烟", "level": "warning" },
                { "timestamp": "2025-03-28 20:12:00", "content": "画面正常", "level": "info" },
            ]
        })))
        .mount(&server)
        .await;

    let mut cmd = vigil_cmd();
    cmd.args(["--server", &server.uri(), "-o", "json-compact", "alerts"]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let alerts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(alerts.as_array().unwrap().len(), 2);
    assert_eq!(alerts[0]["content"], "检测到人员进行了抽烟");
    assert_eq!(alerts[0]["origin"], "historical");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_alerts_plain_respects_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alerts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "alerts": [
                { "timestamp": "t1", "content": "first" },
                { "timestamp": "t2", "content": "second" },
            ]
        })))
        .mount(&server)
        .await;

    let mut cmd = vigil_cmd();
    cmd.args(["--server", &server.uri(), "-o", "plain", "alerts", "-n", "1"]);
    let output = run(cmd).await;

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "t1\tfirst\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_behaviors_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/behavior-data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "data": {
                "statistics": { "total_behaviors": 5, "unique_behaviors": 2, "most_frequent": "喝水" },
                "behaviors": [
                    { "id": 3, "type": "喝水", "count": 4, "timestamp": "2025-03-28 20:10:00" },
                    { "id": 6, "type": "睡觉", "count": 1, "timestamp": "2025-03-28 20:11:00" },
                ]
            }
        })))
        .mount(&server)
        .await;

    let mut cmd = vigil_cmd();
    cmd.args(["--server", &server.uri(), "behaviors"]);
    let output = run(cmd).await;

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(stdout.contains("Total behaviors:   5"));
    assert!(stdout.contains("80.0%"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_joins_words_and_prints_answer() {
    let search = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .and(body_json(json!({ "query": "今天 谁 睡觉了", "k": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "answer": "20:11 有人睡觉"
        })))
        .mount(&search)
        .await;

    let mut cmd = vigil_cmd();
    cmd.args([
        "--server",
        "http://127.0.0.1:9",
        "--search",
        &search.uri(),
        "ask",
        "--top-k",
        "5",
        "今天",
        "谁",
        "睡觉了",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "20:11 有人睡觉\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ask_backend_failure_exit_code() {
    let search = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "向量库为空"
        })))
        .mount(&search)
        .await;

    let mut cmd = vigil_cmd();
    cmd.args([
        "--server",
        "http://127.0.0.1:9",
        "--search",
        &search.uri(),
        "ask",
        "hello",
    ]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("向量库为空"));
}

#[test]
fn test_blank_question_is_usage_error() {
    let output = vigil_cmd()
        .args(["--server", "http://127.0.0.1:9", "ask", "   "])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("question"));
}
