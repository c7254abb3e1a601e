//! Per-session enforcement record.
//!
//! A [`SessionState`] is created lazily on the first hook event for a session
//! and read-modify-written on every later event. Its fields are private: the
//! only mutations are the ones the violation engine needs, and none of them
//! can shrink a tool set or move `created_at`.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Insertion-ordered set of tool names.
///
/// Serialized as a plain JSON array. Duplicates in a persisted array are
/// collapsed on load, keeping the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolSet(Vec<String>);

impl ToolSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name` if absent. Returns true when it was newly added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_owned());
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|existing| existing == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl FromIterator<String> for ToolSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        for name in iter {
            if !set.contains(&name) {
                set.0.push(name);
            }
        }
        set
    }
}

impl<'de> Deserialize<'de> for ToolSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let names = Vec::<String>::deserialize(deserializer)?;
        Ok(names.into_iter().collect())
    }
}

const fn default_true() -> bool {
    true
}

/// Persisted enforcement state for one agent session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    session_id: String,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    mcp_tools_used: ToolSet,
    #[serde(default)]
    generic_tools_used: ToolSet,
    #[serde(default)]
    violation_count: u32,
    /// Reserved: always true under the current policy.
    #[serde(default = "default_true")]
    mcp_available: bool,
    #[serde(default, deserialize_with = "optional_timestamp")]
    last_warning_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now", deserialize_with = "required_timestamp")]
    created_at: DateTime<Utc>,
}

impl SessionState {
    /// Fresh record for `session_id`, created at `now`.
    #[must_use]
    pub fn new(session_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            session_id: session_id.into(),
            command: None,
            mcp_tools_used: ToolSet::new(),
            generic_tools_used: ToolSet::new(),
            violation_count: 0,
            mcp_available: true,
            last_warning_at: None,
            created_at: now,
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    #[must_use]
    pub fn mcp_tools_used(&self) -> &ToolSet {
        &self.mcp_tools_used
    }

    #[must_use]
    pub fn generic_tools_used(&self) -> &ToolSet {
        &self.generic_tools_used
    }

    #[must_use]
    pub fn violation_count(&self) -> u32 {
        self.violation_count
    }

    #[must_use]
    pub fn mcp_available(&self) -> bool {
        self.mcp_available
    }

    #[must_use]
    pub fn last_warning_at(&self) -> Option<DateTime<Utc>> {
        self.last_warning_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true when `tool_name` was not recorded before.
    pub fn record_generic_tool(&mut self, tool_name: &str) -> bool {
        self.generic_tools_used.insert(tool_name)
    }

    /// Returns true when `tool_name` was not recorded before.
    pub fn record_specialized_tool(&mut self, tool_name: &str) -> bool {
        self.mcp_tools_used.insert(tool_name)
    }

    /// Bump the violation count, saturating at `u32::MAX`.
    pub fn increment_violations(&mut self) -> u32 {
        self.violation_count = self.violation_count.saturating_add(1);
        self.violation_count
    }

    /// Reset the violation count to zero, returning the prior value.
    pub fn reset_violations(&mut self) -> u32 {
        std::mem::take(&mut self.violation_count)
    }

    pub fn mark_warned(&mut self, at: DateTime<Utc>) {
        self.last_warning_at = Some(at);
    }
}

/// Parse a persisted timestamp.
///
/// Accepts RFC 3339 and the naive local ISO-8601 form written by older
/// hook versions (`2025-01-01T12:00:00.123456`).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = raw.parse::<NaiveDateTime>().ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

// An unreadable warning timestamp means "no cooldown", not a corrupt record.
fn optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn required_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_timestamp(deserializer)?.unwrap_or_else(Utc::now))
}
