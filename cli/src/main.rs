//! serena-guard CLI - hook entry points for the host agent runtime.
//!
//! # Modes
//!
//! ```text
//! serena-guard guard           # pre-tool-use: warn about generic tools
//! serena-guard track           # post-tool-use: record Serena MCP tools
//! serena-guard status <id>     # print the stored record for a session
//! ```
//!
//! `guard` and `track` read one JSON payload from stdin, write advisory text
//! to stderr, never write to stdout, and always exit 0. The host must never
//! see a blocking status from this process.

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use serena_guard_config::{GuardConfig, config_path};
use serena_guard_core::{FileStateStore, HookReport, Hooks, SessionStateStore, read_payload};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const USAGE: &str = "usage: serena-guard <guard|track|status SESSION_ID>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hook {
    Guard,
    Track,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Hook(Hook),
    Status(String),
}

impl Mode {
    fn from_args(args: &[String]) -> Option<Self> {
        match args {
            [mode] if mode == "guard" => Some(Mode::Hook(Hook::Guard)),
            [mode] if mode == "track" => Some(Mode::Hook(Hook::Track)),
            [mode, session_id] if mode == "status" => Some(Mode::Status(session_id.clone())),
            _ => None,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // stderr carries only hook output, so without a log file nothing is logged.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.serena-guard/logs/hook.log
    if let Some(config_path) = config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("hook.log"));
    }

    // Fallback: <tmp>/serena-guard/logs/hook.log (the hook runs inside user projects)
    candidates.push(env::temp_dir().join("serena-guard").join("logs").join("hook.log"));

    candidates
}

fn read_stdin() -> String {
    let mut raw = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut raw) {
        tracing::warn!("Failed to read hook input: {e}");
        raw.clear();
    }
    raw
}

fn emit(report: &HookReport) {
    for message in &report.messages {
        eprintln!("{message}");
    }
}

fn run_hook(hook: Hook) {
    let payload = read_payload(&read_stdin());
    let config = GuardConfig::load();
    let hooks = match Hooks::from_config(&config) {
        Ok(hooks) => hooks,
        Err(e) => {
            tracing::warn!("Hook disabled: {e}");
            return;
        }
    };

    let report = match hook {
        Hook::Guard => hooks.guard(&payload, Utc::now()),
        Hook::Track => hooks.track(&payload),
    };
    tracing::debug!(disposition = ?report.disposition, "Hook finished");
    emit(&report);
}

/// Run `f`, sending a panic message to the log instead of stderr.
/// Returns `false` if `f` panicked.
fn run_contained(f: impl FnOnce()) -> bool {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| {
        tracing::error!("Hook handler panicked: {info}");
    }));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    panic::set_hook(previous);
    outcome.is_ok()
}

fn run_status(session_id: &str) -> Result<()> {
    let config = GuardConfig::load();
    let store = FileStateStore::new(&config.storage.state_dir);
    let state = store.load(session_id);
    let json = serde_json::to_string_pretty(&state).context("failed to encode session state")?;
    println!("{json}");
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(mode) = Mode::from_args(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::SUCCESS;
    };

    match mode {
        Mode::Status(session_id) => match run_status(&session_id) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err:?}");
                ExitCode::FAILURE
            }
        },
        Mode::Hook(hook) => {
            // A panic must not surface to the host as a non-zero status.
            if !run_contained(|| run_hook(hook)) {
                tracing::error!(?hook, "Hook aborted");
            }
            ExitCode::SUCCESS
        }
    }
}
