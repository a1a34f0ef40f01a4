//! Crash tests for filedb
//!
//! Each test drives the real binary as a subprocess with
//! `FILEDB_CRASH_POINT` set, lets it abort mid-operation, then inspects the
//! data directory with a fresh driver.
//!
//! - Real filesystem (no mocks)
//! - Abort, not unwind: nothing gets a chance to clean up

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use filedb::crash_point::{points, CRASH_POINT_ENV};
use filedb::driver::{Driver, DriverOptions};
use filedb::observability::NoopLogger;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Harness
// =============================================================================

struct CrashEnv {
    _temp: TempDir,
    config: PathBuf,
    data_dir: PathBuf,
}

impl CrashEnv {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let data_dir = temp.path().join("data");
        let config = temp.path().join("filedb.json");
        fs::write(
            &config,
            json!({ "data_dir": data_dir, "log_level": "error" }).to_string(),
        )
        .unwrap();
        Self {
            _temp: temp,
            config,
            data_dir,
        }
    }

    fn run(&self, args: &[&str], stdin: Option<&str>, crash_point: Option<&str>) -> Output {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_filedb"));
        cmd.arg(args[0])
            .arg("--config")
            .arg(&self.config)
            .args(&args[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        match crash_point {
            Some(point) => {
                cmd.env(CRASH_POINT_ENV, point);
            }
            None => {
                cmd.env_remove(CRASH_POINT_ENV);
            }
        }

        let mut child = cmd.spawn().expect("failed to spawn filedb");
        {
            let mut pipe = child.stdin.take().unwrap();
            if let Some(input) = stdin {
                pipe.write_all(input.as_bytes()).unwrap();
            }
        }
        child.wait_with_output().unwrap()
    }

    fn driver(&self) -> Driver {
        Driver::open(
            &self.data_dir,
            DriverOptions::new().with_logger(Arc::new(NoopLogger)),
        )
        .unwrap()
    }

    fn users_dir(&self) -> PathBuf {
        self.data_dir.join("users")
    }
}

fn stdout_json(output: &Output) -> Value {
    let text = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(text.trim()).unwrap_or_else(|e| panic!("bad stdout {:?}: {}", text, e))
}

fn read_file(path: &Path) -> Vec<u8> {
    fs::read(path).unwrap()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_cli_write_and_read_without_crash() {
    let env = CrashEnv::new();

    let out = env.run(&["write", "users", "alice"], Some(r#"{"Name":"alice","Age":30}"#), None);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout_json(&out)["status"], "ok");

    let out = env.run(&["read", "users", "alice"], None, None);
    assert!(out.status.success());
    assert_eq!(stdout_json(&out)["data"], json!({"Name": "alice", "Age": 30}));

    let out = env.run(&["read-all", "users"], None, None);
    assert_eq!(stdout_json(&out)["data"].as_array().unwrap().len(), 1);
}

#[test]
fn test_cli_error_envelope() {
    let env = CrashEnv::new();

    let out = env.run(&["read", "users", "ghost"], None, None);
    assert!(!out.status.success());
    let body = stdout_json(&out);
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "FILEDB_NOT_FOUND");
}

/// Crash between temp write and rename: previous document survives, temp
/// file is orphaned, sweep removes it.
#[test]
fn test_crash_before_rename_preserves_previous_document() {
    let env = CrashEnv::new();
    let out = env.run(&["write", "users", "alice"], Some(r#"{"version":1}"#), None);
    assert!(out.status.success());
    let final_path = env.users_dir().join("alice.json");
    let before = read_file(&final_path);

    let out = env.run(
        &["write", "users", "alice"],
        Some(r#"{"version":2}"#),
        Some(points::WRITE_BEFORE_RENAME),
    );
    assert!(!out.status.success(), "process should have aborted");

    assert_eq!(read_file(&final_path), before);
    assert!(env.users_dir().join("alice.json.tmp").exists());

    let driver = env.driver();
    let value: Value = driver.read_as("users", "alice").unwrap();
    assert_eq!(value, json!({"version": 1}));

    let out = env.run(&["sweep"], None, None);
    assert!(out.status.success());
    assert_eq!(stdout_json(&out)["data"]["removed"], 1);
    assert!(!env.users_dir().join("alice.json.tmp").exists());
    assert_eq!(driver.read_all("users").unwrap().len(), 1);
}

/// Crash before the temp file is created: nothing changes on disk.
#[test]
fn test_crash_before_temp_changes_nothing() {
    let env = CrashEnv::new();
    let out = env.run(&["write", "users", "alice"], Some(r#"{"version":1}"#), None);
    assert!(out.status.success());

    let out = env.run(
        &["write", "users", "alice"],
        Some(r#"{"version":2}"#),
        Some(points::WRITE_BEFORE_TEMP),
    );
    assert!(!out.status.success());

    assert!(!env.users_dir().join("alice.json.tmp").exists());
    let value: Value = env.driver().read_as("users", "alice").unwrap();
    assert_eq!(value, json!({"version": 1}));
}

/// Crash right after rename: the new document is already committed.
#[test]
fn test_crash_after_rename_keeps_new_document() {
    let env = CrashEnv::new();
    let out = env.run(&["write", "users", "alice"], Some(r#"{"version":1}"#), None);
    assert!(out.status.success());

    let out = env.run(
        &["write", "users", "alice"],
        Some(r#"{"version":2}"#),
        Some(points::WRITE_AFTER_RENAME),
    );
    assert!(!out.status.success());

    let value: Value = env.driver().read_as("users", "alice").unwrap();
    assert_eq!(value, json!({"version": 2}));
    assert!(!env.users_dir().join("alice.json.tmp").exists());
}

/// Crash before delete removes anything: the resource is still there.
#[test]
fn test_crash_before_delete_keeps_resource() {
    let env = CrashEnv::new();
    let out = env.run(&["write", "users", "alice"], Some(r#"{"version":1}"#), None);
    assert!(out.status.success());

    let out = env.run(
        &["delete", "users", "alice"],
        None,
        Some(points::DELETE_BEFORE_REMOVE),
    );
    assert!(!out.status.success());

    assert!(env.driver().read("users", "alice").is_ok());
}
