//! The violation state machine.
//!
//! The guard transition runs on every generic-tool event while enforcement
//! applies. It records the tool, escalates the violation count while no
//! specialized tool has been used, and decides which warning band (if any)
//! to show. The tracker transition runs on every specialized-tool event and
//! resets the count to zero.
//!
//! Both transitions mutate the state in place; the caller persists it.

use chrono::{DateTime, TimeDelta, Utc};
use serena_guard_config::{PolicyConfig, Thresholds};
use serena_guard_types::{SessionState, WarningLevel};

/// What the guard should do after a generic-tool event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAction {
    /// Below the first threshold.
    Silent,
    /// Render a warning at this level.
    Warn(WarningLevel),
    /// A warning was due but the cooldown holds.
    Suppressed(WarningLevel),
}

impl GuardAction {
    #[must_use]
    pub fn level(self) -> Option<WarningLevel> {
        match self {
            Self::Silent => None,
            Self::Warn(level) | Self::Suppressed(level) => Some(level),
        }
    }
}

/// Result of the tracker transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    /// The tool was not in `mcp_tools_used` before.
    pub newly_tracked: bool,
    /// Prior violation count, when it was non-zero and got reset.
    pub reset_from: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ViolationEngine {
    thresholds: Thresholds,
    cooldown: TimeDelta,
}

impl ViolationEngine {
    #[must_use]
    pub fn new(policy: &PolicyConfig) -> Self {
        Self {
            thresholds: policy.thresholds,
            cooldown: TimeDelta::from_std(policy.cooldown).unwrap_or(TimeDelta::MAX),
        }
    }

    /// Warning band for a violation count.
    ///
    /// With the default thresholds: `1` is a reminder, `2..=3` escalated,
    /// `4..` a violation, and `0` nothing.
    #[must_use]
    pub fn level_for(&self, count: u32) -> Option<WarningLevel> {
        let t = &self.thresholds;
        if count >= t.block {
            Some(WarningLevel::Violation)
        } else if count >= t.escalated {
            Some(WarningLevel::Escalated)
        } else if count >= t.first {
            Some(WarningLevel::Reminder)
        } else {
            None
        }
    }

    /// True when a warning was rendered less than one cooldown ago.
    #[must_use]
    pub fn in_cooldown(&self, state: &SessionState, now: DateTime<Utc>) -> bool {
        state
            .last_warning_at()
            .is_some_and(|last| now.signed_duration_since(last) < self.cooldown)
    }

    /// Guard transition for an event classified generic.
    pub fn on_generic(
        &self,
        state: &mut SessionState,
        tool_name: &str,
        now: DateTime<Utc>,
    ) -> GuardAction {
        if !tool_name.is_empty() {
            state.record_generic_tool(tool_name);
        }

        // Once any specialized tool is on record, generic use stops escalating.
        if state.mcp_tools_used().is_empty() {
            state.increment_violations();
        }

        let Some(level) = self.level_for(state.violation_count()) else {
            return GuardAction::Silent;
        };

        if self.in_cooldown(state, now) {
            tracing::debug!(
                session_id = state.session_id(),
                %level,
                "Warning suppressed by cooldown"
            );
            return GuardAction::Suppressed(level);
        }

        state.mark_warned(now);
        GuardAction::Warn(level)
    }

    /// Tracker transition for an event naming a specialized tool.
    pub fn on_specialized(&self, state: &mut SessionState, tool_name: &str) -> TrackOutcome {
        let newly_tracked = state.record_specialized_tool(tool_name);
        let prior = state.reset_violations();
        TrackOutcome {
            newly_tracked,
            reset_from: (prior > 0).then_some(prior),
        }
    }
}
