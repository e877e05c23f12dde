//! Stage functions: the nodes of the workflow graph.
//!
//! Each stage consumes a [`FlowState`] and produces a new one, setting
//! `next_action` before returning. Failures are captured into `last_error`
//! and routed to the user-interaction fallback; they are never raised to the
//! engine's caller.

use tracing::info;

use cloudpilot_runner::TerraformCli;
use cloudpilot_utils::types::{FlowId, NextAction, StageId};

use crate::generator::{CodeGenerator, RevisionContext};
use crate::state::FlowState;

/// Question surfaced to the human when a flow suspends for approval.
pub const APPROVAL_QUESTION: &str = "Apply this plan?";

/// Result of running one stage.
#[derive(Debug)]
pub enum StageOutcome {
    /// The stage completed; continue driving the graph with the new state.
    Continue(FlowState),
    /// The approve stage requests suspension; the engine must park the state
    /// and surface the question to the caller.
    Suspend { state: FlowState, question: String },
}

/// The stage functions, sharing the collaborators they invoke.
pub struct Stages {
    generator: CodeGenerator,
    terraform: TerraformCli,
}

impl Stages {
    /// Create the stage set around its collaborators.
    #[must_use]
    pub fn new(generator: CodeGenerator, terraform: TerraformCli) -> Self {
        Self {
            generator,
            terraform,
        }
    }

    /// Run a single stage against the given flow state.
    pub async fn run(
        &self,
        stage: StageId,
        flow_id: FlowId,
        state: FlowState,
    ) -> StageOutcome {
        match stage {
            StageId::Generate => StageOutcome::Continue(self.generate(flow_id, state).await),
            StageId::Plan => StageOutcome::Continue(self.plan(state).await),
            StageId::Approve => self.approve(state),
            StageId::Execute => StageOutcome::Continue(self.execute(state).await),
            StageId::UserInteraction => StageOutcome::Continue(Self::user_interaction(state)),
        }
    }

    /// Generate or revise infrastructure code for the task.
    pub async fn generate(
        &self,
        flow_id: FlowId,
        mut state: FlowState,
    ) -> FlowState {
        state.last_error.clear();

        if state.task.trim().is_empty() {
            return state.failed("Missing precondition: task description is empty");
        }

        let revision = if state.corrective && !state.generated_code.is_empty() {
            Some(RevisionContext {
                current_code: state.generated_code.clone(),
                analysis: if state.plan_summary.is_empty() {
                    state.last_result.clone()
                } else {
                    state.plan_summary.clone()
                },
            })
        } else {
            None
        };

        match self
            .generator
            .generate(flow_id, &state.task, revision.as_ref())
            .await
        {
            Ok(generated) => {
                info!(flow_id = %flow_id, path = %generated.path, "Generated code persisted");
                state.generated_code = generated.code;
                state.code_file_path = Some(generated.path.clone());
                state.code_built = true;
                state.corrective = false;
                state.last_result = format!("Terraform code generated and saved to {}", generated.path);
                state.routed(NextAction::Stage(StageId::Plan))
            }
            Err(e) => state.failed(format!("Error generating Terraform code: {e}")),
        }
    }

    /// Compute an execution plan for the persisted code.
    pub async fn plan(&self, mut state: FlowState) -> FlowState {
        state.last_error.clear();

        let Some(path) = state.code_file_path.clone() else {
            return state.failed("Missing precondition: no Terraform file path specified");
        };

        // Fail before invoking the tool if the artifact is gone.
        if !path.exists() {
            return state.failed(format!("Missing precondition: Terraform file not found: {path}"));
        }

        if let Err(e) = self.terraform.init().await {
            return state.failed(format!("Error initializing Terraform: {e}"));
        }

        match self.terraform.plan().await {
            Ok(plan) => {
                state.plan_summary = plan.summary;
                state.plan_artifact = plan.artifact;
                state.last_result = "Terraform plan computed".to_string();
                state.routed(NextAction::Stage(StageId::Approve))
            }
            Err(e) => state.failed(format!("Error in terraform plan: {e}")),
        }
    }

    /// Suspend the flow for a human approval decision.
    ///
    /// Entered with a stale error (a mis-routed failure), there is nothing
    /// meaningful to approve: route straight to user-interaction without
    /// suspending.
    pub fn approve(&self, state: FlowState) -> StageOutcome {
        if !state.last_error.is_empty() {
            return StageOutcome::Continue(
                state.routed(NextAction::Stage(StageId::UserInteraction)),
            );
        }

        if state.plan_summary.is_empty() {
            return StageOutcome::Continue(
                state.failed("Missing precondition: no plan available to approve"),
            );
        }

        StageOutcome::Suspend {
            state,
            question: APPROVAL_QUESTION.to_string(),
        }
    }

    /// Apply the approved plan with unattended confirmation.
    pub async fn execute(&self, mut state: FlowState) -> FlowState {
        state.last_error.clear();

        if state.code_file_path.is_none() {
            return state.failed("Missing precondition: no Terraform file path specified");
        }

        match self.terraform.apply().await {
            Ok(output) => {
                state.last_result = output;
                state.routed(NextAction::Done)
            }
            Err(e) => state.failed(format!("Error executing Terraform: {e}")),
        }
    }

    /// Terminal hand-off: the delivery layer owns the conversation from
    /// here, with `last_error`/`last_result` carried on the state.
    fn user_interaction(state: FlowState) -> FlowState {
        state.routed(NextAction::Done)
    }
}
