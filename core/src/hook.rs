//! Guard and tracker handlers.
//!
//! Each handler takes one parsed payload, runs the matching transition, saves
//! the record and returns a [`HookReport`]: the lines to write to stderr and
//! what was decided. Nothing here can fail the host; persistence errors are
//! logged and turned into a report line.

use std::env;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serena_guard_config::GuardConfig;
use serena_guard_types::{Category, HookPayload, SessionState};

use crate::classifier::{ContextDetector, EventClassifier};
use crate::engine::{GuardAction, TrackOutcome, ViolationEngine};
use crate::error::PatternError;
use crate::presenter::WarningPresenter;
use crate::store::{FileStateStore, SessionStateStore};

/// What a handler decided for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The working directory is outside the enforced workflow.
    NotApplicable,
    /// Allow-listed; state untouched.
    Allowed,
    /// Not this handler's kind of tool; state untouched.
    Ignored,
    Guarded(GuardAction),
    Tracked(TrackOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub disposition: Disposition,
    /// Lines for stderr, in order.
    pub messages: Vec<String>,
}

impl HookReport {
    fn quiet(disposition: Disposition) -> Self {
        Self {
            disposition,
            messages: Vec::new(),
        }
    }
}

/// Parse stdin leniently: a malformed payload is logged and treated as empty.
#[must_use]
pub fn read_payload(raw: &str) -> HookPayload {
    match HookPayload::parse(raw) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Treating hook input as empty: {e}");
            HookPayload::default()
        }
    }
}

pub struct Hooks<S> {
    store: S,
    detector: ContextDetector,
    classifier: EventClassifier,
    engine: ViolationEngine,
    presenter: WarningPresenter,
}

impl Hooks<FileStateStore> {
    pub fn from_config(config: &GuardConfig) -> Result<Self, PatternError> {
        Self::new(FileStateStore::new(&config.storage.state_dir), config)
    }
}

impl<S: SessionStateStore> Hooks<S> {
    pub fn new(store: S, config: &GuardConfig) -> Result<Self, PatternError> {
        Ok(Self {
            store,
            detector: ContextDetector::new(&config.context),
            classifier: EventClassifier::new(&config.policy)?,
            engine: ViolationEngine::new(&config.policy),
            presenter: WarningPresenter::new(config.policy.suggested_tool_prefix.clone()),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pre-tool-use handler: escalate generic-tool usage.
    pub fn guard(&self, payload: &HookPayload, now: DateTime<Utc>) -> HookReport {
        let session_id = payload.session_id();
        let tool_name = payload.tool_name();

        let cwd = payload
            .cwd()
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok());
        if !cwd.is_some_and(|cwd| self.detector.applies(&cwd)) {
            tracing::debug!(session_id, tool_name, "Enforcement not applicable");
            return HookReport::quiet(Disposition::NotApplicable);
        }

        let category = self.classifier.classify(tool_name, &payload.tool_input);
        tracing::debug!(session_id, tool_name, %category, "Classified tool event");
        match category {
            Category::Allowed => return HookReport::quiet(Disposition::Allowed),
            // The tracker owns specialized-tool bookkeeping.
            Category::Specialized => return HookReport::quiet(Disposition::Ignored),
            Category::Generic => {}
        }

        let mut state = self.store.load(session_id);
        let action = self.engine.on_generic(&mut state, tool_name, now);

        let mut report = HookReport::quiet(Disposition::Guarded(action));
        if let GuardAction::Warn(level) = action {
            tracing::info!(
                session_id,
                tool_name,
                %level,
                violation_count = state.violation_count(),
                "Emitting warning"
            );
            report
                .messages
                .push(self.presenter.render(level, &state, tool_name));
        }

        self.persist(&state, &mut report);
        report
    }

    /// Post-tool-use handler: record specialized-tool usage and reset escalation.
    pub fn track(&self, payload: &HookPayload) -> HookReport {
        let session_id = payload.session_id();
        let tool_name = payload.tool_name();

        if !self.classifier.is_specialized(tool_name) {
            return HookReport::quiet(Disposition::Ignored);
        }

        let mut state = self.store.load(session_id);
        let outcome = self.engine.on_specialized(&mut state, tool_name);

        let mut report = HookReport::quiet(Disposition::Tracked(outcome));
        if outcome.newly_tracked {
            tracing::info!(session_id, tool_name, "Tracked specialized tool");
            report
                .messages
                .push(format!("  MCP tool tracked: {tool_name}"));
        }
        if let Some(prior) = outcome.reset_from {
            tracing::info!(session_id, prior, "Reset violation count");
            report
                .messages
                .push(format!("  Resetting violation count (was: {prior})"));
        }

        self.persist(&state, &mut report);
        report
    }

    fn persist(&self, state: &SessionState, report: &mut HookReport) {
        if let Err(e) = self.store.save(state) {
            tracing::warn!(session_id = state.session_id(), "Failed to save session state: {e}");
            report
                .messages
                .push(format!("  serena-guard: could not save session state: {e}"));
        }
    }
}
