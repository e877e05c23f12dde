//! Anthropic HTTP backend
//!
//! Text-generation backend for Anthropic's Messages API. API keys are read
//! from an environment variable named in configuration, never stored in the
//! config file itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use cloudpilot_utils::error::LlmError;

use crate::config::AnthropicConfig;
use crate::types::{GenerationRequest, GenerationResult, TextGenBackend};

/// Default Anthropic API endpoint
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROVIDER_NAME: &str = "anthropic";

/// Anthropic Messages API backend.
#[derive(Debug)]
pub struct AnthropicBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicBackend {
    /// Create a backend from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment
    /// variable is unset or the HTTP client cannot be constructed.
    pub fn new_from_config(config: &AnthropicConfig) -> Result<Self, LlmError> {
        let api_key_env = config.api_key_env.as_deref().unwrap_or("ANTHROPIC_API_KEY");
        let api_key = std::env::var(api_key_env).map_err(|_| {
            LlmError::Misconfiguration(format!(
                "Anthropic API key not found in environment variable '{api_key_env}'. \
                 Set this variable or configure a different api_key_env under [llm]."
            ))
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| LlmError::Misconfiguration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            max_tokens: config.max_tokens.unwrap_or(2048),
            temperature: config.temperature.unwrap_or(0.2),
        })
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage<'a>>,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
}

/// Map a non-success HTTP status to the provider error taxonomy.
fn status_error(status: reqwest::StatusCode, detail: &str) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::ProviderAuth(format!("HTTP {status}: {detail}")),
        429 => LlmError::ProviderQuota(format!("HTTP {status}: {detail}")),
        s if s >= 500 => LlmError::ProviderOutage(format!("HTTP {status}: {detail}")),
        _ => LlmError::Transport(format!("HTTP {status}: {detail}")),
    }
}

#[async_trait]
impl TextGenBackend for AnthropicBackend {
    fn provider(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, LlmError> {
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![ApiMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        debug!(
            flow_id = %request.flow_id,
            model = %request.model,
            prompt_bytes = request.prompt.len(),
            "Sending generation request"
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        duration: request.timeout,
                    }
                } else {
                    LlmError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(status, &detail));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Transport(format!("Malformed response body: {e}")))?;

        let raw_response = parsed
            .content
            .iter()
            .map(|block| block.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        Ok(GenerationResult {
            raw_response,
            provider: PROVIDER_NAME.to_string(),
            model_used: parsed.model,
            tokens_input: parsed.usage.as_ref().and_then(|u| u.input_tokens),
            tokens_output: parsed.usage.as_ref().and_then(|u| u.output_tokens),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn auth_failures_map_to_provider_auth() {
        for code in [401, 403] {
            let err = status_error(StatusCode::from_u16(code).unwrap(), "bad key");
            assert!(
                matches!(err, LlmError::ProviderAuth(_)),
                "status {code} mapped to {err:?}"
            );
        }
    }

    #[test]
    fn rate_limit_maps_to_provider_quota() {
        let err = status_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(err, LlmError::ProviderQuota(_)));
    }

    #[test]
    fn server_errors_map_to_provider_outage() {
        for code in [500, 502, 503, 529] {
            let err = status_error(StatusCode::from_u16(code).unwrap(), "overloaded");
            assert!(
                matches!(err, LlmError::ProviderOutage(_)),
                "status {code} mapped to {err:?}"
            );
        }
    }

    #[test]
    fn other_statuses_map_to_transport_with_detail() {
        let err = status_error(StatusCode::NOT_FOUND, "no such model");
        match err {
            LlmError::Transport(msg) => {
                assert!(msg.contains("404"));
                assert!(msg.contains("no such model"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn missing_api_key_env_is_misconfiguration() {
        let config = AnthropicConfig {
            api_key_env: Some("CLOUDPILOT_TEST_UNSET_API_KEY".to_string()),
            ..AnthropicConfig::default()
        };
        let err = AnthropicBackend::new_from_config(&config).unwrap_err();
        match err {
            LlmError::Misconfiguration(msg) => {
                assert!(msg.contains("CLOUDPILOT_TEST_UNSET_API_KEY"));
            }
            other => panic!("expected Misconfiguration, got {other:?}"),
        }
    }
}
