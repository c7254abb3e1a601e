//! Core domain types for serena-guard.
//!
//! This crate contains pure domain types with no IO and minimal dependencies.
//! Everything here can be used from any layer of the hook pipeline.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod payload;
mod policy;
mod session;

pub use payload::{HookPayload, InputParseError, ToolInput, UNKNOWN_SESSION};
pub use policy::{Category, WarningLevel};
pub use session::{SessionState, ToolSet, parse_timestamp};
