//! Workflow graph: table-driven routing between stages.
//!
//! The graph maps the `next_action` symbol in flow state to the stage
//! function that runs next, or declares the flow terminal. Routing is a
//! single exhaustive table; adding a stage means extending [`StageId`] and
//! this table, and the compiler rejects any unmapped variant.

use cloudpilot_utils::types::{NextAction, StageId};

/// Routing decision for the engine's driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Run the given stage next.
    Run(StageId),
    /// The flow is terminal; stop driving.
    Finished,
}

/// The workflow graph for infrastructure flows.
///
/// ```text
///          ┌────────── rejected ──────────┐
///          ▼                              │
/// generate ──► plan ──► approve ──► execute ──► done
///     │          │         │ (suspends)    │
///     └──────────┴─────────┴───────────────┴──► user-interaction
/// ```
pub struct WorkflowGraph;

impl WorkflowGraph {
    /// Entry stage for a fresh flow.
    pub const ENTRY: StageId = StageId::Generate;

    /// Select the next step for the given routing symbol.
    ///
    /// `user-interaction` is routed as a runnable stage; its core behavior
    /// is a terminal hand-off to the delivery layer (see `stages`).
    #[must_use]
    pub fn route(next_action: NextAction) -> Route {
        match next_action {
            NextAction::Stage(StageId::Generate) => Route::Run(StageId::Generate),
            NextAction::Stage(StageId::Plan) => Route::Run(StageId::Plan),
            NextAction::Stage(StageId::Approve) => Route::Run(StageId::Approve),
            NextAction::Stage(StageId::Execute) => Route::Run(StageId::Execute),
            NextAction::Stage(StageId::UserInteraction) => Route::Run(StageId::UserInteraction),
            NextAction::Done => Route::Finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_stage_symbol_is_mapped() {
        let stages = [
            StageId::Generate,
            StageId::Plan,
            StageId::Approve,
            StageId::Execute,
            StageId::UserInteraction,
        ];
        for stage in stages {
            assert_eq!(
                WorkflowGraph::route(NextAction::Stage(stage)),
                Route::Run(stage)
            );
        }
    }

    #[test]
    fn done_is_terminal() {
        assert_eq!(WorkflowGraph::route(NextAction::Done), Route::Finished);
    }

    #[test]
    fn entry_point_is_generate() {
        assert_eq!(WorkflowGraph::ENTRY, StageId::Generate);
    }
}
