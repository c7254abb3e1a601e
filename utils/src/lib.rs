//! Shared infrastructure utilities for serena-guard.
//!
//! - **`atomic_write`**: Crash-safe file replacement (temp + rename)
//! - **`secure_dir`**: Owner-only state directory creation

pub mod atomic_write;
pub mod secure_dir;

pub use atomic_write::{PersistMode, atomic_write, recover_bak_file};
pub use secure_dir::ensure_secure_dir;
