//! The engine: drives flows through the workflow graph.
//!
//! Each flow executes its stage sequence on a single logical thread of
//! control; distinct flows share nothing but the registry. `start_flow` and
//! `respond` both run the driver loop until the next suspension or terminal
//! state and hand back a [`FlowOutcome`] the delivery layer can render
//! without inspecting internals.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use cloudpilot_llm::TextGenBackend;
use cloudpilot_runner::TerraformCli;
use cloudpilot_utils::error::FlowError;
use cloudpilot_utils::logging::{log_stage_complete, log_stage_error};
use cloudpilot_utils::types::{FlowId, NextAction, StageId};

use crate::generator::CodeGenerator;
use crate::graph::{Route, WorkflowGraph};
use crate::registry::FlowRegistry;
use crate::stages::{StageOutcome, Stages};
use crate::state::FlowState;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model passed to the text-generation backend.
    pub model: String,
    /// File name of the persisted code artifact inside the tool's working
    /// directory.
    pub code_file_name: String,
    /// Per-attempt timeout for generation calls.
    pub generation_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5".to_string(),
            code_file_name: "main.tf".to_string(),
            generation_timeout: Duration::from_secs(120),
        }
    }
}

/// Outcome of driving a flow: either parked at the approval gate or
/// terminal. Both carry the latest result and error messages so callers can
/// always render flow status.
#[derive(Debug, Clone)]
pub enum FlowOutcome {
    /// The flow is suspended awaiting an approval decision.
    Suspended {
        flow_id: FlowId,
        question: String,
        plan_summary: String,
        generated_code: String,
        last_result: String,
        last_error: String,
    },
    /// The flow reached a terminal state.
    Finished {
        flow_id: FlowId,
        last_result: String,
        last_error: String,
    },
}

impl FlowOutcome {
    /// Handle of the flow this outcome belongs to.
    #[must_use]
    pub fn flow_id(&self) -> FlowId {
        match self {
            Self::Suspended { flow_id, .. } | Self::Finished { flow_id, .. } => *flow_id,
        }
    }

    /// Latest failure message, empty when the last operation succeeded.
    #[must_use]
    pub fn last_error(&self) -> &str {
        match self {
            Self::Suspended { last_error, .. } | Self::Finished { last_error, .. } => last_error,
        }
    }
}

/// Workflow orchestration engine.
///
/// Safe to share behind an `Arc` and drive many concurrent flows; the
/// registry is the only shared mutable state.
pub struct Engine {
    stages: Stages,
    registry: FlowRegistry,
}

impl Engine {
    /// Build an engine around its external collaborators.
    #[must_use]
    pub fn new(
        backend: Arc<dyn TextGenBackend>,
        terraform: TerraformCli,
        config: EngineConfig,
    ) -> Self {
        let code_path = terraform.working_dir().join(&config.code_file_name);
        let generator = CodeGenerator::new(
            backend,
            config.model,
            code_path,
            config.generation_timeout,
        );
        Self {
            stages: Stages::new(generator, terraform),
            registry: FlowRegistry::new(),
        }
    }

    /// Start a new flow for the given task description.
    ///
    /// Mints a fresh flow handle and drives the graph from the entry stage
    /// until the first suspension or terminal state.
    pub async fn start_flow(&self, task: impl Into<String>) -> FlowOutcome {
        let flow_id = FlowId::new();
        let state = FlowState::new(task);
        debug!(flow_id = %flow_id, "Starting flow");
        self.drive(flow_id, state).await
    }

    /// Deliver the approval decision for a suspended flow and continue
    /// driving it.
    ///
    /// Approval routes to the execute stage; rejection routes back to
    /// generate in corrective mode.
    ///
    /// # Errors
    ///
    /// Returns `FlowError::UnknownFlow` if the handle is unknown or its
    /// decision was already consumed.
    pub async fn respond(&self, flow_id: FlowId, approved: bool) -> Result<FlowOutcome, FlowError> {
        let mut state = self.registry.resume(flow_id)?;
        debug!(flow_id = %flow_id, approved, "Resuming flow");

        if approved {
            state.next_action = NextAction::Stage(StageId::Execute);
        } else {
            state.corrective = true;
            state.next_action = NextAction::Stage(StageId::Generate);
        }

        Ok(self.drive(flow_id, state).await)
    }

    /// Number of flows currently suspended awaiting a decision.
    #[must_use]
    pub fn pending_flows(&self) -> usize {
        self.registry.pending_count()
    }

    /// Question registered for a suspended flow, if the handle is pending.
    #[must_use]
    pub fn pending_question(&self, flow_id: FlowId) -> Option<String> {
        self.registry.pending_question(flow_id)
    }

    /// Run stages in graph order until suspension or a terminal state.
    async fn drive(&self, flow_id: FlowId, mut state: FlowState) -> FlowOutcome {
        loop {
            match WorkflowGraph::route(state.next_action) {
                Route::Finished => {
                    return FlowOutcome::Finished {
                        flow_id,
                        last_result: std::mem::take(&mut state.last_result),
                        last_error: state.last_error,
                    };
                }
                Route::Run(stage) => {
                    let started = Instant::now();
                    match self.stages.run(stage, flow_id, state).await {
                        StageOutcome::Continue(next) => {
                            let elapsed = started.elapsed().as_millis();
                            if next.last_error.is_empty() {
                                log_stage_complete(
                                    &flow_id.to_string(),
                                    stage.as_str(),
                                    elapsed,
                                );
                            } else {
                                log_stage_error(
                                    &flow_id.to_string(),
                                    stage.as_str(),
                                    &next.last_error,
                                    elapsed,
                                );
                            }
                            state = next;
                        }
                        StageOutcome::Suspend {
                            mut state,
                            question,
                        } => {
                            let outcome = FlowOutcome::Suspended {
                                flow_id,
                                question: question.clone(),
                                plan_summary: state.plan_summary.clone(),
                                generated_code: state.generated_code.clone(),
                                // Surfacing consumes the result message.
                                last_result: std::mem::take(&mut state.last_result),
                                last_error: state.last_error.clone(),
                            };
                            if let Err(e) = self.registry.suspend(flow_id, state, question) {
                                // Double suspension is a defect; surface it
                                // on the outcome rather than panicking.
                                return FlowOutcome::Finished {
                                    flow_id,
                                    last_result: String::new(),
                                    last_error: e.to_string(),
                                };
                            }
                            return outcome;
                        }
                    }
                }
            }
        }
    }
}
