//! Terraform CLI wrapper
//!
//! Invokes the provisioning tool as a subprocess against a working directory
//! holding the persisted code file. Contract: exit code 0 = success,
//! non-zero = failure with diagnostics on stderr.

use std::time::Duration;

use camino::Utf8PathBuf;
use cloudpilot_utils::error::ToolError;
use tracing::{debug, info};

use crate::command_spec::CommandSpec;
use crate::process::run_command;

/// File name for the binary plan artifact inside the working directory.
const PLAN_FILE: &str = "tfplan.bin";

/// Plan result: human-readable summary plus a best-effort structured form.
#[derive(Debug, Clone)]
pub struct PlanOutput {
    /// Combined stdout/stderr of `terraform plan`.
    pub summary: String,
    /// Parsed `terraform show -json` output for the plan, when available.
    pub artifact: Option<serde_json::Value>,
}

/// Wrapper around the `terraform` binary.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: String,
    working_dir: Utf8PathBuf,
    timeout: Duration,
}

impl TerraformCli {
    /// Create a wrapper invoking `binary` inside `working_dir`.
    #[must_use]
    pub fn new(binary: impl Into<String>, working_dir: Utf8PathBuf, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            working_dir,
            timeout,
        }
    }

    /// Working directory the tool runs in.
    #[must_use]
    pub fn working_dir(&self) -> &Utf8PathBuf {
        &self.working_dir
    }

    fn command(&self, subcommand: &str) -> CommandSpec {
        CommandSpec::new(&self.binary)
            .arg(subcommand)
            .cwd(self.working_dir.as_std_path())
    }

    async fn run_subcommand(&self, spec: CommandSpec, subcommand: &str) -> Result<String, ToolError> {
        let output = run_command(&spec, self.timeout).await.map_err(|e| {
            // Preserve the subcommand name on timeouts instead of the full argv.
            match e {
                ToolError::Timeout {
                    timeout_seconds, ..
                } => ToolError::Timeout {
                    subcommand: subcommand.to_string(),
                    timeout_seconds,
                },
                other => other,
            }
        })?;

        if !output.success() {
            return Err(ToolError::CommandFailed {
                subcommand: subcommand.to_string(),
                exit_code: output.exit_code.unwrap_or(-1),
                stderr: output.stderr.clone(),
            });
        }

        Ok(output.combined())
    }

    /// Run `terraform init`. Idempotent; safe to run before every plan.
    ///
    /// # Errors
    ///
    /// Returns `ToolError` on spawn failure, timeout, or non-zero exit.
    pub async fn init(&self) -> Result<String, ToolError> {
        info!(working_dir = %self.working_dir, "Running terraform init");
        let spec = self.command("init").arg("-input=false").arg("-no-color");
        self.run_subcommand(spec, "init").await
    }

    /// Run `terraform plan`, capturing combined stdout/stderr as the summary
    /// and a structured plan artifact when the tool can emit one.
    ///
    /// # Errors
    ///
    /// Returns `ToolError` on spawn failure, timeout, or non-zero exit. A
    /// failure of the structured-artifact step is never an error; the
    /// artifact is simply absent.
    pub async fn plan(&self) -> Result<PlanOutput, ToolError> {
        info!(working_dir = %self.working_dir, "Running terraform plan");
        let spec = self
            .command("plan")
            .arg("-input=false")
            .arg("-no-color")
            .arg(format!("-out={PLAN_FILE}"));
        let summary = self.run_subcommand(spec, "plan").await?;

        let artifact = self.show_plan_json().await;

        Ok(PlanOutput { summary, artifact })
    }

    /// Run `terraform apply` with unattended confirmation.
    ///
    /// # Errors
    ///
    /// Returns `ToolError` on spawn failure, timeout, or non-zero exit.
    pub async fn apply(&self) -> Result<String, ToolError> {
        info!(working_dir = %self.working_dir, "Running terraform apply");
        let spec = self
            .command("apply")
            .arg("-input=false")
            .arg("-auto-approve")
            .arg("-no-color");
        self.run_subcommand(spec, "apply").await
    }

    /// Best-effort `terraform show -json` for the saved plan file.
    async fn show_plan_json(&self) -> Option<serde_json::Value> {
        let spec = self.command("show").arg("-json").arg(PLAN_FILE);
        match run_command(&spec, self.timeout).await {
            Ok(output) if output.success() => match serde_json::from_str(&output.stdout) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(error = %e, "Plan artifact was not valid JSON; skipping");
                    None
                }
            },
            Ok(output) => {
                debug!(exit_code = ?output.exit_code, "terraform show failed; skipping artifact");
                None
            }
            Err(e) => {
                debug!(error = %e, "terraform show could not run; skipping artifact");
                None
            }
        }
    }
}
