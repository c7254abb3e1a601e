//! Event classification.
//!
//! [`ContextDetector`] decides whether enforcement applies to a working
//! directory. [`EventClassifier`] sorts a tool-use event into
//! [`Category::Allowed`], [`Category::Specialized`] or [`Category::Generic`].
//! All matching is case-insensitive substring matching.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use aho_corasick::AhoCorasick;
use serena_guard_config::{ContextConfig, PolicyConfig};
use serena_guard_types::{Category, ToolInput};

use crate::error::PatternError;

#[derive(Debug, Clone)]
pub struct ContextDetector {
    manifest_file: String,
    manifest_keyword: String,
    marker_dirs: Vec<String>,
}

impl ContextDetector {
    #[must_use]
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            manifest_file: config.manifest_file.clone(),
            manifest_keyword: config.manifest_keyword.to_lowercase(),
            marker_dirs: config.marker_dirs.clone(),
        }
    }

    /// True when the manifest names the workflow or every marker directory exists.
    #[must_use]
    pub fn applies(&self, cwd: &Path) -> bool {
        self.manifest_matches(cwd) || self.has_marker_dirs(cwd)
    }

    fn manifest_matches(&self, cwd: &Path) -> bool {
        let path = cwd.join(&self.manifest_file);
        match fs::read_to_string(&path) {
            Ok(content) => content.to_lowercase().contains(&self.manifest_keyword),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                tracing::debug!(path = %path.display(), "Unreadable manifest: {e}");
                false
            }
        }
    }

    // An empty marker list disables the structural check.
    fn has_marker_dirs(&self, cwd: &Path) -> bool {
        !self.marker_dirs.is_empty() && self.marker_dirs.iter().all(|dir| cwd.join(dir).is_dir())
    }
}

#[derive(Debug, Clone)]
pub struct EventClassifier {
    allow_list: AhoCorasick,
    specialized_marker: String,
}

impl EventClassifier {
    pub fn new(policy: &PolicyConfig) -> Result<Self, PatternError> {
        let patterns: Vec<String> = policy
            .allow_patterns
            .iter()
            .map(|p| p.to_lowercase())
            .collect();
        Ok(Self {
            allow_list: AhoCorasick::new(&patterns)?,
            specialized_marker: policy.specialized_marker.to_lowercase(),
        })
    }

    #[must_use]
    pub fn classify(&self, tool_name: &str, input: &ToolInput) -> Category {
        if self.is_allowed(input) {
            Category::Allowed
        } else if self.is_specialized(tool_name) {
            Category::Specialized
        } else {
            Category::Generic
        }
    }

    /// True when `command` or `pattern` contains an allow-list entry.
    #[must_use]
    pub fn is_allowed(&self, input: &ToolInput) -> bool {
        [input.command.as_deref(), input.pattern.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| self.allow_list.is_match(&field.to_lowercase()))
    }

    #[must_use]
    pub fn is_specialized(&self, tool_name: &str) -> bool {
        !tool_name.is_empty() && tool_name.to_lowercase().contains(&self.specialized_marker)
    }
}
