use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stage identifiers for the infrastructure workflow.
///
/// `StageId` represents the named steps in cloudpilot's flow graph. Routing
/// between stages is driven by [`NextAction`] values stored in flow state,
/// so an unrecognized stage cannot be represented at all.
///
/// # Stage Order
///
/// The happy path progresses through stages in this order:
///
/// ```text
/// Generate → Plan → Approve → Execute
/// ```
///
/// Any stage failure routes to `UserInteraction`, a non-destructive fallback
/// where the delivery layer owns the conversation.
///
/// # Serialization
///
/// `StageId` serializes to its kebab-case string form (e.g. `"generate"`,
/// `"user-interaction"`), matching the names used in logs and snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    /// Generate or revise infrastructure code from the task description.
    Generate,
    /// Compute an execution plan for the persisted code.
    Plan,
    /// Suspend the flow and wait for a human approval decision.
    Approve,
    /// Apply the approved plan.
    Execute,
    /// Fallback stage after a failure; terminal for the engine core.
    UserInteraction,
}

impl StageId {
    /// Returns the canonical lowercase name used in logs and snapshots.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Plan => "plan",
            Self::Approve => "approve",
            Self::Execute => "execute",
            Self::UserInteraction => "user-interaction",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing symbol stored in flow state: either a stage to run next or the
/// terminal marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NextAction {
    /// Route to the named stage.
    Stage(StageId),
    /// The flow is finished.
    Done,
}

impl fmt::Display for NextAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stage(stage) => f.write_str(stage.as_str()),
            Self::Done => f.write_str("done"),
        }
    }
}

/// Opaque handle identifying one end-to-end flow.
///
/// Minted when a flow starts and used by callers to deliver the approval
/// decision that resumes a suspended flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(Uuid);

impl FlowId {
    /// Mint a fresh flow handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_id_round_trips_through_serde() {
        let json = serde_json::to_string(&StageId::UserInteraction).unwrap();
        assert_eq!(json, "\"user-interaction\"");
        let back: StageId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StageId::UserInteraction);
    }

    #[test]
    fn stage_names_are_stable() {
        assert_eq!(StageId::Generate.as_str(), "generate");
        assert_eq!(StageId::Plan.as_str(), "plan");
        assert_eq!(StageId::Approve.as_str(), "approve");
        assert_eq!(StageId::Execute.as_str(), "execute");
        assert_eq!(StageId::UserInteraction.as_str(), "user-interaction");
    }

    #[test]
    fn flow_ids_are_unique() {
        assert_ne!(FlowId::new(), FlowId::new());
    }
}
