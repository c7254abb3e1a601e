//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serena_guard_config::GuardConfig;
use serena_guard_core::{FileStateStore, Hooks, SessionStateStore};
use serena_guard_types::{HookPayload, SessionState, ToolInput};
use tempfile::TempDir;

pub const SESSION: &str = "5f0c2a9e-test-session";
pub const FIND_SYMBOL: &str = "mcp__serena-daemon__find_symbol";

/// A temporary enforced project plus a temporary state directory.
pub struct Fixture {
    _root: TempDir,
    pub project: PathBuf,
    pub state_dir: PathBuf,
    pub hooks: Hooks<FileStateStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let project = root.path().join("project");
        fs::create_dir_all(&project).expect("project dir");
        fs::write(
            project.join("PLUGIN.md"),
            "# serena-refactor\n\nRefactoring workflow backed by Serena.\n",
        )
        .expect("manifest");

        let state_dir = root.path().join("state");
        let mut config = GuardConfig::default();
        config.storage.state_dir = state_dir.clone();
        let hooks = Hooks::from_config(&config).expect("hooks");

        Self {
            _root: root,
            project,
            state_dir,
            hooks,
        }
    }

    pub fn state(&self) -> SessionState {
        self.hooks.store().load(SESSION)
    }

    pub fn stored(&self) -> Option<SessionState> {
        self.hooks.store().try_load(SESSION).expect("readable record")
    }

    pub fn record_path(&self) -> PathBuf {
        self.hooks.store().record_path(SESSION)
    }

    pub fn generic(&self, tool: &str) -> HookPayload {
        payload(&self.project, tool, ToolInput::default())
    }

    pub fn bash(&self, command: &str) -> HookPayload {
        payload(
            &self.project,
            "Bash",
            ToolInput {
                command: Some(command.to_owned()),
                pattern: None,
            },
        )
    }

    pub fn specialized(&self, tool: &str) -> HookPayload {
        payload(&self.project, tool, ToolInput::default())
    }
}

pub fn payload(cwd: &Path, tool: &str, input: ToolInput) -> HookPayload {
    HookPayload {
        session_id: Some(SESSION.to_owned()),
        cwd: Some(cwd.display().to_string()),
        tool_name: Some(tool.to_owned()),
        tool_input: input,
    }
}

/// Fixed base instant plus `secs`.
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_760_000_000 + secs, 0).expect("valid timestamp")
}
