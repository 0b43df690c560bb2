//! CLI tests for the `ew` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write fixture");
    path
}

fn ew(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ew").expect("binary should build");
    // Keep a developer's ./eventwait.yml out of the picture
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn test_wait_matches_scripted_event() {
    let dir = TempDir::new().unwrap();
    let script = write(
        &dir,
        "events.yml",
        r#"
- after_ms: 10
  event: messages.upsert
  payload: { id: "A" }
- after_ms: 10
  event: messages.upsert
  payload: { id: "X", fromMe: true }
"#,
    );

    ew(&dir)
        .args(["wait", "messages.upsert", "--where", "/id=X", "--where", "fromMe=true", "--timeout-ms", "2000"])
        .arg("--script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("messages.upsert").and(predicate::str::contains("matched")));
}

#[test]
fn test_wait_fails_on_close() {
    let dir = TempDir::new().unwrap();
    let script = write(
        &dir,
        "events.yml",
        r#"
- after_ms: 10
  event: connection.update
  payload: { connection: close }
"#,
    );

    ew(&dir)
        .args(["wait", "messages.upsert", "--timeout-ms", "2000"])
        .arg("--script")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Connection Closed"));
}

#[test]
fn test_wait_times_out_with_config_default() {
    let dir = TempDir::new().unwrap();
    let script = write(&dir, "events.yml", "[]\n");
    let config = write(&dir, "config.yml", "default_timeout_ms: 50\n");

    ew(&dir)
        .args(["wait", "messages.upsert"])
        .arg("--script")
        .arg(&script)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Timed Out"));
}

#[test]
fn test_wait_rejects_bad_condition() {
    let dir = TempDir::new().unwrap();
    let script = write(&dir, "events.yml", "[]\n");

    ew(&dir)
        .args(["wait", "messages.upsert", "--where", "no-equals", "--timeout-ms", "10"])
        .arg("--script")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("POINTER=VALUE"));
}

#[test]
fn test_wait_missing_script() {
    let dir = TempDir::new().unwrap();

    ew(&dir)
        .args(["wait", "messages.upsert", "--script", "missing.yml", "--timeout-ms", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read script"));
}
