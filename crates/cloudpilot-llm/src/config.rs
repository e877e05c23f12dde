//! Backend configuration section
//!
//! Deserialized from the `[llm]` table of the application config file.

use serde::{Deserialize, Serialize};

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

/// Text-generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider to use. Currently only "anthropic" is supported.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-invocation timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Provider-specific settings.
    #[serde(default)]
    pub anthropic: AnthropicConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            anthropic: AnthropicConfig::default(),
        }
    }
}

/// Anthropic-specific settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnthropicConfig {
    /// Environment variable holding the API key (default `ANTHROPIC_API_KEY`).
    pub api_key_env: Option<String>,
    /// Custom API endpoint, for proxies and test servers.
    pub base_url: Option<String>,
    /// Maximum tokens to generate (default 2048).
    pub max_tokens: Option<u32>,
    /// Sampling temperature (default 0.2).
    pub temperature: Option<f32>,
}
