//! Enforcement core for serena-guard.
//!
//! # Architecture
//!
//! ```text
//! stdin payload -> read_payload() -> Hooks::guard / Hooks::track
//!                                      |
//!             ContextDetector -> EventClassifier -> SessionStateStore::load
//!                                      |
//!                    ViolationEngine -> WarningPresenter (guard only)
//!                                      |
//!                     SessionStateStore::save -> HookReport (stderr lines)
//! ```
//!
//! Every invocation is a short-lived process. State crosses invocations only
//! through the per-session files of [`FileStateStore`].

mod classifier;
mod engine;
mod error;
mod hook;
mod presenter;
mod store;

pub use classifier::{ContextDetector, EventClassifier};
pub use engine::{GuardAction, TrackOutcome, ViolationEngine};
pub use error::{PatternError, PersistenceError, StateCorruptionError};
pub use hook::{Disposition, HookReport, Hooks, read_payload};
pub use presenter::WarningPresenter;
pub use store::{FileStateStore, SessionStateStore};
