//! Scripted backend for tests
//!
//! Pops queued responses in order and records every prompt it receives, so
//! tests can drive the retry loop deterministically and assert on prompt
//! contents (e.g. corrective-mode regeneration).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use cloudpilot_utils::error::LlmError;

use crate::types::{GenerationRequest, GenerationResult, TextGenBackend};

const PROVIDER_NAME: &str = "scripted";

/// Canned backend returning pre-queued responses.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    /// Create an empty scripted backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn push_response(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(text.into()));
    }

    /// Queue `count` copies of the same response.
    pub fn push_repeated(&self, text: impl Into<String>, count: usize) {
        let text = text.into();
        for _ in 0..count {
            self.push_response(text.clone());
        }
    }

    /// Queue a failed attempt.
    pub fn push_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Prompts received so far, in invocation order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Number of invocations made against this backend.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenBackend for ScriptedBackend {
    fn provider(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(raw_response)) => Ok(GenerationResult {
                raw_response,
                provider: PROVIDER_NAME.to_string(),
                model_used: request.model.clone(),
                tokens_input: None,
                tokens_output: None,
            }),
            Some(Err(e)) => Err(e),
            None => Err(LlmError::Transport(
                "scripted backend exhausted its queued responses".to_string(),
            )),
        }
    }
}
