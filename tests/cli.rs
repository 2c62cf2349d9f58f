use assert_cmd::Command;
use predicates::prelude::*;

/// A command isolated from the caller's environment and config files.
fn streakbot(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("streakbot").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env_remove("BOT_TOKEN")
        .env_remove("GROUP_ID")
        .env_remove("USER_GATEWAY_URL")
        .env_remove("USER_GATEWAY_TOKEN")
        .env_remove("GROQ_API_KEY")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT");
    cmd
}

#[test]
fn run_without_token_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    streakbot(dir.path())
        .arg("run")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing environment variable BOT_TOKEN"));
}

#[test]
fn run_rejects_non_numeric_group() {
    let dir = tempfile::tempdir().unwrap();
    streakbot(dir.path())
        .arg("run")
        .env("BOT_TOKEN", "123:abc")
        .env("GROUP_ID", "my-group")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("GROUP_ID must be an integer"));
}

#[test]
fn schema_prints_json_schema() {
    let dir = tempfile::tempdir().unwrap();
    let output = streakbot(dir.path()).arg("schema").output().unwrap();
    assert!(output.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(schema["title"], "Config");
    assert!(schema["properties"]["tagging"].is_object());
}

#[test]
fn status_on_empty_state_reports_no_poll() {
    let dir = tempfile::tempdir().unwrap();
    streakbot(dir.path())
        .args(["status", "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No active poll"))
        .stdout(predicate::str::contains("Streaks: 0 tracked"));
}

#[test]
fn status_json_reads_stored_state() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("streak_data.json"), r#"{"42":9,"7":2}"#).unwrap();
    std::fs::write(dir.path().join("last_poll_id.txt"), "314").unwrap();

    let output = streakbot(dir.path())
        .args(["status", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["poll"], 314);
    assert_eq!(report["tracked"], 2);
    assert_eq!(report["top"][0]["user"], "42");
    assert_eq!(report["top"][0]["title"], "🛡️ Veteran");
}

#[test]
fn leaderboard_preview_uses_config_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state");
    std::fs::create_dir(&state).unwrap();
    std::fs::write(state.join("streak_data.json"), r#"{"1001":4}"#).unwrap();
    std::fs::write(
        dir.path().join("streakbot.toml"),
        "[state]\ndir = \"state\"\n",
    )
    .unwrap();

    streakbot(dir.path())
        .arg("leaderboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("<b>🥇 1001</b> [⚔️ Soldier]"))
        .stdout(predicate::str::contains("4 Days"));
}

#[test]
fn invalid_config_exits_with_config_code() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("streakbot.toml"),
        "[tagging]\nbatch_size = 0\n",
    )
    .unwrap();

    streakbot(dir.path())
        .arg("leaderboard")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("tagging.batch_size"));
}

#[test]
fn doctor_reports_missing_credentials() {
    let dir = tempfile::tempdir().unwrap();
    streakbot(dir.path())
        .args(["doctor", "--format", "text"])
        .assert()
        .code(5)
        .stdout(predicate::str::contains("check  credentials  fail"))
        .stdout(predicate::str::contains("check  state dir  ok"));
}

#[test]
fn missing_state_dir_is_a_store_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("streakbot.toml"),
        "[state]\ndir = \"nowhere\"\n",
    )
    .unwrap();

    streakbot(dir.path())
        .args(["status", "--format", "text"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("state directory nowhere does not exist"));
}
