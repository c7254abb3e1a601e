use std::fmt;

/// How a tool-use event is treated by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Matches the allow-list; invisible to the violation machine.
    Allowed,
    /// Belongs to the semantic-code-analysis toolset.
    Specialized,
    /// Anything else.
    Generic,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Specialized => "specialized",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity band of a guard warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WarningLevel {
    /// Informational reminder.
    Reminder,
    /// Escalated warning.
    Escalated,
    /// Blocking-tone warning. Still advisory.
    Violation,
}

impl WarningLevel {
    /// Numeric level, 1 through 3.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Reminder => 1,
            Self::Escalated => 2,
            Self::Violation => 3,
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level-{}", self.number())
    }
}
