//! Text-generation backend abstraction for cloudpilot
//!
//! All providers implement the [`TextGenBackend`] trait, so the engine can
//! invoke any of them without knowing transport or provider details. The
//! only production backend in this version is Anthropic's Messages API over
//! HTTP; a scripted backend is available to tests behind the `test-utils`
//! feature.

mod anthropic_backend;
mod config;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod scripted;

pub use anthropic_backend::AnthropicBackend;
pub use cloudpilot_utils::error::LlmError;
pub use config::{AnthropicConfig, LlmConfig};
pub use types::{GenerationRequest, GenerationResult, TextGenBackend};

/// Create a text-generation backend from configuration.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for unknown providers and
/// `LlmError::Misconfiguration` when provider settings are invalid.
pub fn from_config(config: &LlmConfig) -> Result<Box<dyn TextGenBackend>, LlmError> {
    match config.provider.as_str() {
        "anthropic" => {
            let backend = AnthropicBackend::new_from_config(&config.anthropic)?;
            Ok(Box::new(backend))
        }
        unknown => Err(LlmError::Unsupported(format!(
            "Unknown text-generation provider '{unknown}'. Supported providers: anthropic."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use cloudpilot_utils::types::FlowId;

    use super::scripted::ScriptedBackend;
    use super::*;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(FlowId::new(), "test-model", prompt, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn scripted_backend_pops_responses_in_order() {
        let backend = ScriptedBackend::new();
        backend.push_response("first");
        backend.push_response("second");

        let a = backend.generate(&request("p1")).await.unwrap();
        let b = backend.generate(&request("p2")).await.unwrap();
        assert_eq!(a.raw_response, "first");
        assert_eq!(b.raw_response, "second");
        assert_eq!(backend.prompts(), vec!["p1", "p2"]);
    }

    #[tokio::test]
    async fn scripted_backend_errors_when_exhausted() {
        let backend = ScriptedBackend::new();
        let err = backend.generate(&request("p")).await.unwrap_err();
        assert!(matches!(err, LlmError::Transport(_)));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn factory_rejects_unknown_provider() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        let err = from_config(&config).unwrap_err();
        assert!(matches!(err, LlmError::Unsupported(_)));
    }
}
