//! Resumable workflow orchestration engine for cloudpilot.
//!
//! Sequences code generation, validation/retry, plan computation,
//! human-approval suspension, and apply steps for many concurrent flows.
//! A flow suspends at the approval gate and survives arbitrary delays
//! between `start_flow` and `respond`; the registry holds its snapshot
//! until the decision arrives.

mod engine;
mod generator;
mod graph;
mod registry;
mod stages;
mod state;

pub use engine::{Engine, EngineConfig, FlowOutcome};
pub use generator::{CodeGenerator, GeneratedCode, MAX_ATTEMPTS, RevisionContext};
pub use graph::{Route, WorkflowGraph};
pub use registry::{DecisionSlot, FlowRegistry};
pub use stages::{APPROVAL_QUESTION, StageOutcome, Stages};
pub use state::FlowState;

pub use cloudpilot_utils::error::{CloudPilotError, FlowError, GenerationError};
pub use cloudpilot_utils::types::{FlowId, NextAction, StageId};
