//! Per-session state persistence.
//!
//! One JSON record per session lives at `<root>/<stem>.json`, where the stem
//! is derived from the session id. Loads never fail: a missing, unreadable or
//! undecodable record yields a fresh one. Saves go through a temp file and a
//! rename, so a concurrent load sees either the old record or the new one.
//! Concurrent writers race and the last rename wins.

use std::borrow::Cow;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serena_guard_types::{SessionState, UNKNOWN_SESSION};
use serena_guard_utils::{PersistMode, atomic_write, ensure_secure_dir, recover_bak_file};

use crate::error::{PersistenceError, StateCorruptionError};

/// Durable key-value store of [`SessionState`] keyed by session id.
pub trait SessionStateStore {
    /// Load the record for `session_id`, or a fresh one.
    fn load(&self, session_id: &str) -> SessionState;

    fn save(&self, state: &SessionState) -> Result<(), PersistenceError>;
}

#[derive(Debug, Clone)]
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn record_path(&self, session_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", file_stem(session_id)))
    }

    /// Load the stored record, distinguishing "absent" from "unusable".
    pub fn try_load(&self, session_id: &str) -> Result<Option<SessionState>, StateCorruptionError> {
        let path = self.record_path(session_id);
        recover_bak_file(&path);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateCorruptionError::Read { path, source }),
        };

        let state: SessionState = serde_json::from_str(&raw)
            .map_err(|source| StateCorruptionError::Decode {
                path: path.clone(),
                source,
            })?;

        if state.session_id() != session_id {
            return Err(StateCorruptionError::ForeignRecord {
                path,
                found: state.session_id().to_owned(),
            });
        }

        Ok(Some(state))
    }
}

impl SessionStateStore for FileStateStore {
    fn load(&self, session_id: &str) -> SessionState {
        match self.try_load(session_id) {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::debug!(session_id, "No stored session state; starting fresh");
                SessionState::new(session_id, Utc::now())
            }
            Err(e) => {
                tracing::warn!(session_id, "Resetting session state: {e}");
                SessionState::new(session_id, Utc::now())
            }
        }
    }

    fn save(&self, state: &SessionState) -> Result<(), PersistenceError> {
        ensure_secure_dir(&self.root).map_err(|source| PersistenceError::CreateDir {
            path: self.root.clone(),
            source,
        })?;

        let json = serde_json::to_string_pretty(state)?;
        let path = self.record_path(state.session_id());
        atomic_write(&path, json.as_bytes(), PersistMode::SensitiveOwnerOnly)
            .map_err(|source| PersistenceError::Write { path, source })?;

        tracing::debug!(
            session_id = state.session_id(),
            violation_count = state.violation_count(),
            "Saved session state"
        );
        Ok(())
    }
}

/// Map a session id to a file stem that stays inside the store root.
///
/// Ids made of `[A-Za-z0-9._-]` are used verbatim; any other character
/// becomes `_`. An id that is empty or only dots maps to `unknown`.
fn file_stem(session_id: &str) -> Cow<'_, str> {
    let is_safe = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');

    let stem: Cow<'_, str> = if session_id.chars().all(is_safe) {
        Cow::Borrowed(session_id)
    } else {
        Cow::Owned(
            session_id
                .chars()
                .map(|c| if is_safe(c) { c } else { '_' })
                .collect(),
        )
    };

    if stem.chars().all(|c| c == '.') {
        Cow::Borrowed(UNKNOWN_SESSION)
    } else {
        stem
    }
}
