//! Integration tests for the `shoplist replay` command

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Isolated config (log file inside the temp dir) plus a place for scripts
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(extra: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let log_path = temp_dir.path().join("shoplist.log");
        let content = format!(
            "[log]\nlevel = \"debug\"\nfile = \"{}\"\n{}",
            log_path.display(),
            extra
        );
        fs::write(&config_path, content).unwrap();
        Self {
            temp_dir,
            config_path,
        }
    }

    fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    fn write_script(&self, lines: &[&str]) -> PathBuf {
        let path = self.path().join("script.jsonl");
        fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn replay(&self, script: &Path) -> AssertCommand {
        let mut cmd = shoplist_cmd();
        cmd.arg("--config")
            .arg(&self.config_path)
            .arg("replay")
            .arg(script);
        cmd
    }

    fn replay_json(&self, lines: &[&str]) -> Value {
        let script = self.write_script(lines);
        let output = self.replay(&script).output().unwrap();
        assert!(
            output.status.success(),
            "replay failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn shoplist_cmd() -> AssertCommand {
    let mut cmd = AssertCommand::cargo_bin("shoplist").unwrap();
    cmd.env_remove("SHOPLIST_LOG");
    cmd
}

const ADD_MILK: [&str; 4] = [
    r#"{"event":"open_add_dialog"}"#,
    r#"{"event":"draft_changed","field":"name","value":"Milk"}"#,
    r#"{"event":"draft_changed","field":"quantity","value":"2"}"#,
    r#"{"event":"confirm_add"}"#,
];

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_add_item() {
    let env = TestEnv::new();
    let snapshot = env.replay_json(&ADD_MILK);

    assert_eq!(snapshot["dialog_open"], Value::Bool(false));
    assert_eq!(snapshot["draft_name"], "");
    assert_eq!(snapshot["draft_quantity"], "");
    let items = snapshot["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], 1);
    assert_eq!(items[0]["name"], "Milk");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["mode"], "viewing");
}

#[test]
fn test_replay_rejected_add_keeps_dialog_open() {
    let env = TestEnv::new();
    let snapshot = env.replay_json(&[
        r#"{"event":"open_add_dialog"}"#,
        r#"{"event":"draft_changed","field":"name","value":"   "}"#,
        r#"{"event":"draft_changed","field":"quantity","value":"4"}"#,
        r#"{"event":"confirm_add"}"#,
    ]);

    assert_eq!(snapshot["dialog_open"], Value::Bool(true));
    assert_eq!(snapshot["draft_quantity"], "4");
    assert!(snapshot["items"].as_array().unwrap().is_empty());
}

#[test]
fn test_replay_edit_round_trip() {
    let env = TestEnv::new();
    let mut lines = ADD_MILK.to_vec();
    lines.push(r#"{"event":"begin_edit","id":1}"#);
    lines.push(r#"{"event":"confirm_edit","id":1,"name":"Bread","quantity_text":"5"}"#);
    let snapshot = env.replay_json(&lines);

    let items = snapshot["items"].as_array().unwrap();
    assert_eq!(items[0]["name"], "Bread");
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(items[0]["mode"], "viewing");
}

#[test]
fn test_replay_edit_accepts_invalid_values() {
    let env = TestEnv::new();
    let mut lines = ADD_MILK.to_vec();
    lines.push(r#"{"event":"begin_edit","id":1}"#);
    lines.push(r#"{"event":"confirm_edit","id":1,"name":"","quantity_text":"-3"}"#);
    let snapshot = env.replay_json(&lines);

    let item = &snapshot["items"][0];
    assert_eq!(item["name"], "");
    assert_eq!(item["quantity"], -3);
}

#[test]
fn test_replay_delete_missing_is_noop() {
    let env = TestEnv::new();
    let mut lines = ADD_MILK.to_vec();
    lines.push(r#"{"event":"delete","id":999}"#);
    let snapshot = env.replay_json(&lines);
    assert_eq!(snapshot["items"].as_array().unwrap().len(), 1);
}

#[test]
fn test_replay_each_prints_one_line_per_intent() {
    let env = TestEnv::new();
    let script = env.write_script(&ADD_MILK);

    let output = env.replay(&script).arg("--each").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let snapshots: Vec<Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(snapshots.len(), 4);
    assert_eq!(snapshots[0]["dialog_open"], Value::Bool(true));
    assert_eq!(snapshots[2]["draft_quantity"], "2");
    assert_eq!(snapshots[3]["items"][0]["name"], "Milk");
}

#[test]
fn test_replay_reports_bad_line() {
    let env = TestEnv::new();
    let script = env.write_script(&[r#"{"event":"open_add_dialog"}"#, r#"{"event":"teleport"}"#]);

    env.replay(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_replay_missing_script() {
    let env = TestEnv::new();
    env.replay(&env.path().join("absent.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read script"));
}

#[test]
fn test_replay_writes_log_file() {
    let env = TestEnv::new();
    env.replay_json(&ADD_MILK);

    let log = fs::read_to_string(env.path().join("shoplist.log")).unwrap();
    assert!(log.contains("item added"), "log was: {log}");
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_missing_config_file_is_an_error() {
    let env = TestEnv::new();
    let script = env.write_script(&ADD_MILK);
    shoplist_cmd()
        .arg("--config")
        .arg(env.path().join("nope.toml"))
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn test_key_collision_is_reported() {
    let env = TestEnv::with_config("[keys.list]\nadd = \"q\"\n");
    let script = env.write_script(&ADD_MILK);
    env.replay(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("key binding collision"));
}

#[test]
fn test_unknown_config_key_warns() {
    let env = TestEnv::with_config("[ui]\ntheme = \"dark\"\n");
    let script = env.write_script(&ADD_MILK);
    env.replay(&script)
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown ui entry `theme`"));
}
