//! Subprocess execution for cloudpilot.
//!
//! Argv-style command specification, bounded process execution, and the
//! Terraform CLI wrapper used by the plan and execute stages.

mod command_spec;
mod process;
mod terraform;

pub use command_spec::CommandSpec;
pub use process::{ProcessOutput, run_command};
pub use terraform::{PlanOutput, TerraformCli};
