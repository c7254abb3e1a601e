//! Warning text for each severity band.

use std::fmt::Write;

use serena_guard_types::{SessionState, ToolSet, WarningLevel};

#[derive(Debug, Clone)]
pub struct WarningPresenter {
    tool_prefix: String,
}

impl WarningPresenter {
    /// `tool_prefix` is the namespace of the tools the warnings recommend,
    /// e.g. `mcp__serena-daemon__`.
    pub fn new(tool_prefix: impl Into<String>) -> Self {
        Self {
            tool_prefix: tool_prefix.into(),
        }
    }

    #[must_use]
    pub fn render(&self, level: WarningLevel, state: &SessionState, tool_name: &str) -> String {
        match level {
            WarningLevel::Reminder => self.reminder(tool_name),
            WarningLevel::Escalated => self.escalated(state),
            WarningLevel::Violation => self.violation(state),
        }
    }

    fn reminder(&self, tool_name: &str) -> String {
        let prefix = &self.tool_prefix;
        let mut out = String::new();
        out.push_str("\n  Serena MCP Tools Reminder\n\n");
        let _ = writeln!(
            out,
            "  You're using generic tool '{tool_name}' during a serena-refactor context."
        );
        out.push_str("  Consider using specialized Serena MCP tools instead:\n\n");
        let _ = writeln!(out, "  * {prefix}find_symbol - Find code definitions");
        let _ = writeln!(out, "  * {prefix}search_for_pattern - Search codebase");
        let _ = writeln!(out, "  * {prefix}get_symbols_overview - Code analysis");
        out.push_str("\n  This is an informational warning.\n");
        out
    }

    fn escalated(&self, state: &SessionState) -> String {
        let mut out = String::new();
        out.push_str("\n  Serena MCP Tools - Escalated Warning\n\n");
        let _ = writeln!(
            out,
            "  You've used generic tools {} times without using Serena MCP.",
            state.violation_count()
        );
        let _ = writeln!(
            out,
            "  MCP tools used so far: {}",
            state.mcp_tools_used().len()
        );
        out.push_str("\n  Generic tools are less effective than specialized analysis tools.\n\n");
        out.push_str("  To proceed effectively:\n");
        let _ = writeln!(
            out,
            "  1. Use '{}*' tools for code analysis",
            self.tool_prefix
        );
        out.push_str("  2. Or acknowledge you understand the limitation\n");
        out
    }

    fn violation(&self, state: &SessionState) -> String {
        let mut out = String::new();
        out.push_str("\n  Serena MCP Tools - Usage Pattern Violation\n\n");
        let _ = writeln!(
            out,
            "  You've used generic tools {} times with minimal MCP usage.",
            state.violation_count()
        );
        out.push_str("  This defeats the purpose of the serena-refactor plugin.\n\n");
        let _ = writeln!(
            out,
            "  Current MCP tools used: {}",
            list_or_none(state.mcp_tools_used())
        );
        let _ = writeln!(
            out,
            "  Generic tools used: {}",
            list_or_none(state.generic_tools_used())
        );
        let _ = writeln!(
            out,
            "\n  Please use {}* tools for analysis.",
            self.tool_prefix
        );
        out
    }
}

fn list_or_none(tools: &ToolSet) -> String {
    if tools.is_empty() {
        "NONE".to_owned()
    } else {
        tools.iter().collect::<Vec<_>>().join(", ")
    }
}
