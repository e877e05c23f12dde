//! cloudpilot: natural-language infrastructure requests turned into
//! plan-reviewed Terraform.
//!
//! A task description is handed to the engine, which generates and validates
//! Terraform code, computes an execution plan, and suspends for a human
//! approval decision before applying anything. The crates underneath:
//!
//! - [`cloudpilot_engine`]: the resumable workflow orchestration engine
//! - [`cloudpilot_llm`]: text-generation backends
//! - [`cloudpilot_runner`]: subprocess execution and the Terraform wrapper
//! - `cloudpilot-validation`: syntactic checks on generated code
//! - [`cloudpilot_utils`]: errors, types, atomic writes, tracing setup

pub mod config;

pub use cloudpilot_engine::{Engine, EngineConfig, FlowError, FlowId, FlowOutcome};
pub use cloudpilot_llm::{LlmConfig, TextGenBackend, from_config as backend_from_config};
pub use cloudpilot_runner::TerraformCli;
pub use cloudpilot_utils::error::CloudPilotError;
pub use cloudpilot_utils::logging::init_tracing;

pub use config::Config;
