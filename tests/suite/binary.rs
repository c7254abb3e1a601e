//! Process-level contract of the `serena-guard` binary.

#![cfg(unix)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_serena-guard");

struct Sandbox {
    root: TempDir,
    project: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        // Marker directories make this an enforced project.
        let project = root.path().join("project");
        fs::create_dir_all(project.join("agents")).expect("agents");
        fs::create_dir_all(project.join("commands")).expect("commands");
        Self { root, project }
    }

    fn event(&self, session: &str, tool: &str) -> String {
        serde_json::json!({
            "session_id": session,
            "cwd": self.project,
            "tool_name": tool,
            "tool_input": {},
        })
        .to_string()
    }

    fn run(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = Command::new(BIN)
            .args(args)
            .current_dir(self.root.path())
            .env("HOME", self.root.path().join("home"))
            .env("SERENA_GUARD_STATE_DIR", self.root.path().join("state"))
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn serena-guard");
        child
            .stdin
            .take()
            .expect("stdin")
            .write_all(stdin.as_bytes())
            .expect("write stdin");
        child.wait_with_output().expect("wait")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn guard_warns_on_stderr_and_exits_zero() {
    let sb = Sandbox::new();
    let output = sb.run(&["guard"], &sb.event("bin-a", "Read"));

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("Serena MCP Tools Reminder"));
    assert!(sb.root.path().join("state").join("bin-a.json").is_file());
}

#[test]
fn tracker_prints_trace_lines() {
    let sb = Sandbox::new();
    sb.run(&["guard"], &sb.event("bin-b", "Read"));
    let output = sb.run(
        &["track"],
        &sb.event("bin-b", "mcp__serena-daemon__find_symbol"),
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let err = stderr(&output);
    assert!(err.contains("MCP tool tracked: mcp__serena-daemon__find_symbol"));
    assert!(err.contains("Resetting violation count (was: 1)"));
}

#[test]
fn malformed_input_still_exits_zero() {
    let sb = Sandbox::new();
    for args in [&["guard"][..], &["track"][..]] {
        let output = sb.run(args, "{{ definitely not json");
        assert!(output.status.success());
        assert!(output.stdout.is_empty());
        assert!(output.stderr.is_empty());
    }
}

#[test]
fn unknown_mode_prints_usage_and_exits_zero() {
    let sb = Sandbox::new();
    let output = sb.run(&["deny"], "");
    assert!(output.status.success());
    assert!(stderr(&output).contains("usage: serena-guard"));
}

#[test]
fn status_prints_the_stored_record() {
    let sb = Sandbox::new();
    sb.run(&["guard"], &sb.event("bin-c", "Grep"));

    let output = sb.run(&["status", "bin-c"], "");
    assert!(output.status.success());
    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("status prints json");
    assert_eq!(value["session_id"], "bin-c");
    assert_eq!(value["violation_count"], 1);
    assert_eq!(value["generic_tools_used"], serde_json::json!(["Grep"]));
}
