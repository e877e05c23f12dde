//! Flow state: the sole mutable unit threaded through the workflow graph.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use cloudpilot_utils::types::{NextAction, StageId};

/// State record for one flow, consumed and produced by every stage.
///
/// Stages never mutate a shared instance; each takes the state by value and
/// returns a new one. That discipline is what makes concurrent flows safe
/// and suspension snapshots trivial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowState {
    /// Original or revised natural-language request.
    pub task: String,
    /// Most recently generated infrastructure code (possibly empty).
    pub generated_code: String,
    /// Where `generated_code` was last persisted.
    pub code_file_path: Option<Utf8PathBuf>,
    /// Human-readable output of the last successful plan.
    pub plan_summary: String,
    /// Structured plan representation, when the tool emitted one.
    pub plan_artifact: Option<serde_json::Value>,
    /// Most recent successful-operation message; cleared once surfaced.
    pub last_result: String,
    /// Most recent failure message; non-empty means the prior stage failed.
    pub last_error: String,
    /// True only when the current code passed validation and planned cleanly.
    pub code_built: bool,
    /// Set when an approval rejection routes back to generate, so the
    /// generator revises the existing code instead of starting fresh.
    pub corrective: bool,
    /// Stage the graph should route to next.
    pub next_action: NextAction,
}

impl FlowState {
    /// Initial state for a fresh task; entry point is the generate stage.
    #[must_use]
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            generated_code: String::new(),
            code_file_path: None,
            plan_summary: String::new(),
            plan_artifact: None,
            last_result: String::new(),
            last_error: String::new(),
            code_built: false,
            corrective: false,
            next_action: NextAction::Stage(StageId::Generate),
        }
    }

    /// Route to the given next action.
    #[must_use]
    pub fn routed(mut self, next: NextAction) -> Self {
        self.next_action = next;
        self
    }

    /// Capture a stage failure and route to the user-interaction fallback.
    ///
    /// Clears `code_built`: a failure against the current code means the
    /// artifact can no longer be trusted, whatever stage produced it.
    #[must_use]
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.last_error = error.into();
        self.code_built = false;
        self.next_action = NextAction::Stage(StageId::UserInteraction);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_enters_at_generate() {
        let state = FlowState::new("create a storage bucket");
        assert_eq!(state.next_action, NextAction::Stage(StageId::Generate));
        assert!(!state.code_built);
        assert!(state.last_error.is_empty());
    }

    #[test]
    fn failed_routes_to_user_interaction() {
        let state = FlowState::new("task").failed("boom");
        assert_eq!(state.last_error, "boom");
        assert_eq!(
            state.next_action,
            NextAction::Stage(StageId::UserInteraction)
        );
    }

    #[test]
    fn failed_clears_code_built() {
        let mut state = FlowState::new("task");
        state.code_built = true;

        let state = state.failed("apply blew up");
        assert!(!state.code_built, "built code must not survive a failure");
        assert!(!state.last_error.is_empty());
    }

    #[test]
    fn state_round_trips_through_serde() {
        let mut state = FlowState::new("task");
        state.generated_code = "resource {}".to_string();
        state.code_file_path = Some(Utf8PathBuf::from("/tmp/main.tf"));
        state.next_action = NextAction::Stage(StageId::Approve);

        let json = serde_json::to_string(&state).unwrap();
        let back: FlowState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task, "task");
        assert_eq!(back.next_action, NextAction::Stage(StageId::Approve));
        assert_eq!(back.code_file_path, Some(Utf8PathBuf::from("/tmp/main.tf")));
    }
}
