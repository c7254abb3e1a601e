//! Hook event payload delivered on stdin by the host agent runtime.

use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

/// Session identifier used when the payload does not carry one.
pub const UNKNOWN_SESSION: &str = "unknown";

#[derive(Debug, Error)]
#[error("malformed hook payload: {0}")]
pub struct InputParseError(#[from] serde_json::Error);

/// Fields of `tool_input` the classifier looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolInput {
    pub command: Option<String>,
    pub pattern: Option<String>,
}

impl ToolInput {
    fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            command: map.get("command").and_then(stringify),
            pattern: map.get("pattern").and_then(stringify),
        }
    }
}

/// One tool-use event.
///
/// Every field is optional: unknown keys are ignored and fields of the wrong
/// type are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookPayload {
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub tool_name: Option<String>,
    pub tool_input: ToolInput,
}

impl HookPayload {
    /// Parse raw stdin. Blank input is an empty payload, not an error.
    pub fn parse(raw: &str) -> Result<Self, InputParseError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&value))
    }

    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            session_id: string_field(obj, "session_id"),
            cwd: string_field(obj, "cwd"),
            tool_name: string_field(obj, "tool_name"),
            tool_input: obj
                .get("tool_input")
                .and_then(Value::as_object)
                .map(ToolInput::from_map)
                .unwrap_or_default(),
        }
    }

    /// The session identifier, or [`UNKNOWN_SESSION`] when absent or blank.
    #[must_use]
    pub fn session_id(&self) -> &str {
        self.session_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(UNKNOWN_SESSION)
    }

    #[must_use]
    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn cwd(&self) -> Option<&Path> {
        self.cwd
            .as_deref()
            .filter(|cwd| !cwd.is_empty())
            .map(Path::new)
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

// Non-string scalars in tool_input are matched on their JSON text.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
