//! Persisted record handling as seen through the handlers.

use std::fs;

use serena_guard_core::{Disposition, GuardAction};
use serena_guard_types::WarningLevel;

use crate::common::{Fixture, SESSION, at};

#[test]
fn unparseable_record_behaves_like_no_record() {
    let fx = Fixture::new();
    fs::create_dir_all(&fx.state_dir).expect("state dir");
    fs::write(fx.record_path(), "{ this is not json").expect("corrupt");

    let state = fx.state();
    assert_eq!(state.session_id(), SESSION);
    assert_eq!(state.violation_count(), 0);

    let report = fx.hooks.guard(&fx.generic("Read"), at(0));
    assert_eq!(
        report.disposition,
        Disposition::Guarded(GuardAction::Warn(WarningLevel::Reminder))
    );
    assert_eq!(fx.stored().expect("rewritten").violation_count(), 1);
}

#[test]
fn legacy_record_continues_escalating() {
    let fx = Fixture::new();
    fs::create_dir_all(&fx.state_dir).expect("state dir");
    let legacy = format!(
        r#"{{
  "session_id": "{SESSION}",
  "command": null,
  "mcp_tools_used": [],
  "generic_tools_used": ["Read", "Grep"],
  "violation_count": 3,
  "mcp_available": true,
  "last_warning_at": null,
  "created_at": "2025-06-01T09:30:00.000123"
}}"#
    );
    fs::write(fx.record_path(), legacy).expect("legacy");

    let report = fx.hooks.guard(&fx.generic("Bash"), at(0));
    assert_eq!(
        report.disposition,
        Disposition::Guarded(GuardAction::Warn(WarningLevel::Violation))
    );
    let state = fx.state();
    assert_eq!(state.violation_count(), 4);
    assert_eq!(state.generic_tools_used().len(), 3);
}

#[test]
fn saved_record_is_pretty_json_with_stable_fields() {
    let fx = Fixture::new();
    fx.hooks.guard(&fx.generic("Read"), at(0));

    let raw = fs::read_to_string(fx.record_path()).expect("record");
    assert!(raw.contains('\n'), "pretty-printed");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(value["session_id"], SESSION);
    assert_eq!(value["violation_count"], 1);
    assert_eq!(value["generic_tools_used"], serde_json::json!(["Read"]));
    assert_eq!(value["mcp_tools_used"], serde_json::json!([]));
    assert_eq!(value["mcp_available"], true);
    assert!(value["last_warning_at"].is_string());
    assert!(value["created_at"].is_string());
}

#[test]
fn state_directory_holds_only_the_record_after_saves() {
    let fx = Fixture::new();
    for i in 0..5 {
        fx.hooks.guard(&fx.generic("Read"), at(i));
    }

    let names: Vec<String> = fs::read_dir(&fx.state_dir)
        .expect("state dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec![format!("{SESSION}.json")]);
}

#[test]
fn interrupted_replace_backup_is_recovered() {
    let fx = Fixture::new();
    fx.hooks.guard(&fx.generic("Read"), at(0));
    fx.hooks.guard(&fx.generic("Grep"), at(1));

    let path = fx.record_path();
    fs::rename(&path, path.with_extension("bak")).expect("simulate crash");

    assert_eq!(fx.state().violation_count(), 2);
    assert!(path.exists());
}

#[test]
fn sessions_are_isolated() {
    let fx = Fixture::new();
    fx.hooks.guard(&fx.generic("Read"), at(0));

    let mut other = fx.generic("Read");
    other.session_id = Some("another-session".to_owned());
    fx.hooks.guard(&other, at(1));
    fx.hooks.guard(&other, at(2));

    assert_eq!(fx.state().violation_count(), 1);
    assert_eq!(
        fx.hooks
            .store()
            .try_load("another-session")
            .expect("readable")
            .expect("present")
            .violation_count(),
        2
    );
}

#[test]
fn missing_session_id_is_tracked_under_fallback() {
    let fx = Fixture::new();
    let mut anonymous = fx.generic("Read");
    anonymous.session_id = None;

    fx.hooks.guard(&anonymous, at(0));

    assert!(fx.state_dir.join("unknown.json").is_file());
}
