//! Policy configuration for serena-guard.
//!
//! Every knob has a built-in default matching the shipped policy. An optional
//! TOML file at `~/.serena-guard/config.toml` can override any of them:
//!
//! ```toml
//! [policy]
//! first_warning = 1
//! escalated_warning = 2
//! block_warning = 4
//! cooldown_secs = 60
//! allow_patterns = ["listmcpresources", "listmcpservers", "test", "echo", "git", "which"]
//! specialized_marker = "serena"
//! suggested_tool_prefix = "mcp__serena-daemon__"
//!
//! [context]
//! manifest_file = "PLUGIN.md"
//! manifest_keyword = "serena-refactor"
//! marker_dirs = ["agents", "commands"]
//!
//! [storage]
//! state_dir = "/tmp/serena-mcp-state"
//! ```
//!
//! `SERENA_GUARD_STATE_DIR` overrides `[storage] state_dir`.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const STATE_DIR_ENV: &str = "SERENA_GUARD_STATE_DIR";

const DEFAULT_ALLOW_PATTERNS: &[&str] = &[
    "listmcpresources", // MCP connection check
    "listmcpservers",   // server availability check
    "test",             // test runners
    "echo",             // informational output
    "git",              // version control
    "which",            // environment probes
];
const DEFAULT_SPECIALIZED_MARKER: &str = "serena";
const DEFAULT_SUGGESTED_TOOL_PREFIX: &str = "mcp__serena-daemon__";
const DEFAULT_MANIFEST_FILE: &str = "PLUGIN.md";
const DEFAULT_MANIFEST_KEYWORD: &str = "serena-refactor";
const DEFAULT_MARKER_DIRS: &[&str] = &["agents", "commands"];
const DEFAULT_STATE_DIR_NAME: &str = "serena-mcp-state";
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// On-disk shape of the config file. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub policy: Option<PolicySection>,
    pub context: Option<ContextSection>,
    pub storage: Option<StorageSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    pub first_warning: Option<u32>,
    pub escalated_warning: Option<u32>,
    pub block_warning: Option<u32>,
    pub cooldown_secs: Option<u64>,
    pub allow_patterns: Option<Vec<String>>,
    pub specialized_marker: Option<String>,
    pub suggested_tool_prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextSection {
    pub manifest_file: Option<String>,
    pub manifest_keyword: Option<String>,
    pub marker_dirs: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    pub state_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Load the user config file, if there is one.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Violation counts at which each warning band starts.
///
/// Bands are `[first, escalated)`, `[escalated, block)` and `[block, ..)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    pub first: u32,
    pub escalated: u32,
    pub block: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            first: 1,
            escalated: 2,
            block: 4,
        }
    }
}

impl Thresholds {
    /// True when `1 <= first <= escalated <= block`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.first >= 1 && self.first <= self.escalated && self.escalated <= self.block
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    pub thresholds: Thresholds,
    /// Minimum wall-clock gap between two rendered warnings.
    pub cooldown: Duration,
    /// Case-insensitive substrings that exempt an event from enforcement.
    pub allow_patterns: Vec<String>,
    /// Case-insensitive substring identifying specialized tool names.
    pub specialized_marker: String,
    /// Tool name prefix suggested in warning text.
    pub suggested_tool_prefix: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            cooldown: DEFAULT_COOLDOWN,
            allow_patterns: to_owned_vec(DEFAULT_ALLOW_PATTERNS),
            specialized_marker: DEFAULT_SPECIALIZED_MARKER.to_owned(),
            suggested_tool_prefix: DEFAULT_SUGGESTED_TOOL_PREFIX.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Manifest file looked up in the working directory.
    pub manifest_file: String,
    /// Case-insensitive substring the manifest must contain.
    pub manifest_keyword: String,
    /// Subdirectories that must all exist for the structural match.
    pub marker_dirs: Vec<String>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            manifest_file: DEFAULT_MANIFEST_FILE.to_owned(),
            manifest_keyword: DEFAULT_MANIFEST_KEYWORD.to_owned(),
            marker_dirs: to_owned_vec(DEFAULT_MARKER_DIRS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub state_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_dir: env::temp_dir().join(DEFAULT_STATE_DIR_NAME),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuardConfig {
    pub policy: PolicyConfig,
    pub context: ContextConfig,
    pub storage: StorageConfig,
}

impl GuardConfig {
    /// Resolve defaults, the user config file and the environment.
    ///
    /// Never fails: a broken config file is logged and ignored.
    #[must_use]
    pub fn load() -> Self {
        let file = match ConfigFile::load() {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!(path = %err.path().display(), "Ignoring config file: {err}");
                None
            }
        };
        Self::resolve(file, env::var_os(STATE_DIR_ENV))
    }

    /// Layer `file` and a state-dir override over the defaults.
    #[must_use]
    pub fn resolve(file: Option<ConfigFile>, state_dir_override: Option<OsString>) -> Self {
        let mut config = Self::default();
        let file = file.unwrap_or_default();

        if let Some(policy) = file.policy {
            config.apply_policy(policy);
        }
        if let Some(context) = file.context {
            config.apply_context(context);
        }
        if let Some(dir) = file.storage.and_then(|s| s.state_dir) {
            config.storage.state_dir = expand_home(&dir);
        }
        if let Some(dir) = state_dir_override.filter(|d| !d.is_empty()) {
            config.storage.state_dir = expand_home(Path::new(&dir));
        }

        config
    }

    fn apply_policy(&mut self, section: PolicySection) {
        let defaults = self.policy.thresholds;
        let thresholds = Thresholds {
            first: section.first_warning.unwrap_or(defaults.first),
            escalated: section.escalated_warning.unwrap_or(defaults.escalated),
            block: section.block_warning.unwrap_or(defaults.block),
        };
        if thresholds.is_valid() {
            self.policy.thresholds = thresholds;
        } else {
            tracing::warn!(
                first = thresholds.first,
                escalated = thresholds.escalated,
                block = thresholds.block,
                "Invalid warning thresholds; using defaults"
            );
        }

        if let Some(secs) = section.cooldown_secs {
            self.policy.cooldown = Duration::from_secs(secs);
        }
        if let Some(patterns) = section.allow_patterns {
            self.policy.allow_patterns = patterns
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect();
        }
        if let Some(marker) = non_blank(section.specialized_marker) {
            self.policy.specialized_marker = marker;
        }
        if let Some(prefix) = non_blank(section.suggested_tool_prefix) {
            self.policy.suggested_tool_prefix = prefix;
        }
    }

    fn apply_context(&mut self, section: ContextSection) {
        if let Some(file) = non_blank(section.manifest_file) {
            self.context.manifest_file = file;
        }
        if let Some(keyword) = non_blank(section.manifest_keyword) {
            self.context.manifest_keyword = keyword;
        }
        if let Some(dirs) = section.marker_dirs {
            self.context.marker_dirs = dirs.into_iter().filter(|d| !d.is_empty()).collect();
        }
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".serena-guard").join("config.toml"))
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn to_owned_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}
