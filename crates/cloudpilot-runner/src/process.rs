use std::process::Stdio;
use std::time::Duration;

use cloudpilot_utils::error::ToolError;
use tracing::debug;

use crate::command_spec::CommandSpec;

/// Output from a completed process execution.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Standard output, lossily decoded as UTF-8
    pub stdout: String,
    /// Standard error, lossily decoded as UTF-8
    pub stderr: String,
    /// Exit code (None if terminated by signal)
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Check if the process exited successfully (exit code 0).
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Combined stdout and stderr, stdout first.
    #[must_use]
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Execute a command to completion with a timeout.
///
/// # Errors
///
/// - `ToolError::Spawn` if the program cannot be started
/// - `ToolError::Timeout` if it does not finish within `timeout`
///
/// A non-zero exit code is NOT an error at this level; callers decide what
/// a failure exit means for their subcommand.
pub async fn run_command(spec: &CommandSpec, timeout: Duration) -> Result<ProcessOutput, ToolError> {
    debug!(command = %spec.display(), "Running command");

    let mut command = spec.to_command();
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = command.spawn().map_err(|e| ToolError::Spawn {
        program: spec.program.to_string_lossy().to_string(),
        reason: e.to_string(),
    })?;

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| ToolError::Timeout {
            subcommand: spec.display(),
            timeout_seconds: timeout.as_secs(),
        })?
        .map_err(|e| ToolError::Spawn {
            program: spec.program.to_string_lossy().to_string(),
            reason: e.to_string(),
        })?;

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let spec = CommandSpec::new("echo").arg("hello");
        let output = run_command(&spec, Duration::from_secs(10)).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn reports_spawn_failure_for_missing_program() {
        let spec = CommandSpec::new("definitely-not-a-real-binary-xyz");
        let err = run_command(&spec, Duration::from_secs(10)).await.unwrap_err();
        assert!(matches!(err, ToolError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn times_out_long_running_process() {
        let spec = CommandSpec::new("sleep").arg("5");
        let err = run_command(&spec, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_not_an_error_here() {
        let spec = CommandSpec::new("false");
        let output = run_command(&spec, Duration::from_secs(10)).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, Some(1));
    }
}
