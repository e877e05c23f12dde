//! Core types for the text-generation backend abstraction

use std::time::Duration;

use async_trait::async_trait;
use cloudpilot_utils::error::LlmError;
use cloudpilot_utils::types::FlowId;

/// Input to a text-generation invocation.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Flow this invocation belongs to, for logging and tracing.
    pub flow_id: FlowId,
    /// Model to use for this invocation.
    pub model: String,
    /// Fully assembled prompt text.
    pub prompt: String,
    /// Timeout for this invocation.
    pub timeout: Duration,
}

impl GenerationRequest {
    /// Create a new generation request.
    #[must_use]
    pub fn new(
        flow_id: FlowId,
        model: impl Into<String>,
        prompt: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            flow_id,
            model: model.into(),
            prompt: prompt.into(),
            timeout,
        }
    }
}

/// Result of a text-generation invocation.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Raw response text from the service.
    pub raw_response: String,
    /// Provider name (e.g. "anthropic").
    pub provider: String,
    /// Model that was actually used.
    pub model_used: String,
    /// Input tokens consumed, if reported.
    pub tokens_input: Option<u64>,
    /// Output tokens generated, if reported.
    pub tokens_output: Option<u64>,
}

/// Trait implemented by all text-generation backends.
///
/// The engine works against this trait and never knows provider details.
/// Backends must be safe to share across concurrently running flows.
#[async_trait]
pub trait TextGenBackend: std::fmt::Debug + Send + Sync {
    /// Provider name for logs and results.
    fn provider(&self) -> &str;

    /// Generate text for the given request.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] on transport, auth, quota, outage, or timeout
    /// failures. Each error counts as one failed attempt in the caller's
    /// retry loop.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, LlmError>;
}
