//! Error taxonomy for cloudpilot.
//!
//! Stage failures are captured into flow state and routed to the
//! user-interaction fallback rather than propagated as errors; the variants
//! here are what the stage functions and their collaborators produce before
//! that capture happens. Only [`FlowError::UnknownFlow`] is ever surfaced
//! directly to a caller of the engine.

use std::time::Duration;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Top-level error type returned by cloudpilot library operations.
#[derive(Error, Debug)]
pub enum CloudPilotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Text generation error: {0}")]
    Llm(#[from] LlmError),

    #[error("Provisioning tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Code generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),

    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration file or field errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: Utf8PathBuf, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: Utf8PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Text-generation backend errors. Each one counts as a single failed
/// attempt inside the validation-retry loop.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed response)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature or provider
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Provisioning tool (subprocess) errors.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("`{subcommand}` exited with code {exit_code}: {stderr}")]
    CommandFailed {
        subcommand: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("`{subcommand}` timed out after {timeout_seconds} seconds")]
    Timeout {
        subcommand: String,
        timeout_seconds: u64,
    },
}

/// Syntactic validation failures for generated code.
///
/// Handled internally as retry triggers by the generator; never surfaced
/// past it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unbalanced delimiter '{delimiter}' opened at byte {position}")]
    UnbalancedDelimiter { delimiter: char, position: usize },

    #[error("Unexpected closing delimiter '{delimiter}' at byte {position}")]
    UnexpectedClosing { delimiter: char, position: usize },

    #[error("Text ends on an incomplete token: '{token}'")]
    DanglingToken { token: String },

    #[error("Response too short: {actual} significant characters, minimum {minimum}")]
    TooShort { actual: usize, minimum: usize },

    #[error("{open_blocks} block(s) left unclosed at end of text")]
    UnclosedBlock { open_blocks: usize },
}

/// Failure of the bounded validation-retry generation loop.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Max retries exhausted after {attempts} attempts; last failure: {last_failure}")]
    RetriesExhausted { attempts: u32, last_failure: String },

    #[error("Failed to persist generated code to {path}: {reason}")]
    Persist { path: Utf8PathBuf, reason: String },
}

/// Flow registry errors.
#[derive(Error, Debug)]
pub enum FlowError {
    /// No pending suspension is registered for the handle. Returned both for
    /// never-seen handles and for handles whose decision was already consumed.
    #[error("Unknown or already resolved flow handle: {flow_id}")]
    UnknownFlow { flow_id: String },

    /// A suspension was registered while one was already pending. Stage
    /// execution is single-threaded per flow, so this indicates a defect.
    #[error("Flow {flow_id} already has a pending suspension")]
    AlreadySuspended { flow_id: String },
}
