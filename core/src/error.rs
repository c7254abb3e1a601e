use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A stored session record could not be used.
///
/// Never surfaced to the host: the store logs it and starts a fresh record.
#[derive(Debug, Error)]
pub enum StateCorruptionError {
    #[error("failed to read session state at {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to decode session state at {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("session state at {} belongs to session {found:?}", path.display())]
    ForeignRecord { path: PathBuf, found: String },
}

/// Saving a session record failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to create state directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to encode session state: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write session state to {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// The allow-list could not be compiled into a matcher.
#[derive(Debug, Error)]
#[error("failed to build allow-list matcher: {0}")]
pub struct PatternError(#[from] aho_corasick::BuildError);
