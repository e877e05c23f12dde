//! Application configuration
//!
//! TOML configuration with `[llm]`, `[terraform]`, and `[engine]` sections.
//! Every field has a default, so an absent or empty config file yields a
//! working setup pointed at `terraform/` in the current directory.

use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use cloudpilot_engine::EngineConfig;
use cloudpilot_llm::LlmConfig;
use cloudpilot_runner::TerraformCli;
use cloudpilot_utils::error::ConfigError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Text-generation settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Provisioning tool settings.
    #[serde(default)]
    pub terraform: TerraformConfig,
    /// Engine settings.
    #[serde(default)]
    pub engine: EngineSection,
}

/// `[terraform]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TerraformConfig {
    /// Binary to invoke (default `terraform`, resolved via PATH).
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Working directory holding the persisted code file.
    #[serde(default = "default_working_dir")]
    pub working_dir: Utf8PathBuf,
    /// Per-subcommand timeout in seconds.
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_binary() -> String {
    "terraform".to_string()
}

fn default_working_dir() -> Utf8PathBuf {
    Utf8PathBuf::from("terraform")
}

fn default_tool_timeout_secs() -> u64 {
    600
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            working_dir: default_working_dir(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSection {
    /// File name for the persisted code artifact.
    #[serde(default = "default_code_file_name")]
    pub code_file_name: String,
}

fn default_code_file_name() -> String {
    "main.tf".to_string()
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            code_file_name: default_code_file_name(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read and
    /// `ConfigError::Parse` if it is not valid TOML for this schema.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Engine configuration derived from this config.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            model: self.llm.model.clone(),
            code_file_name: self.engine.code_file_name.clone(),
            generation_timeout: Duration::from_secs(self.llm.timeout_secs),
        }
    }

    /// Provisioning tool wrapper derived from this config.
    #[must_use]
    pub fn terraform_cli(&self) -> TerraformCli {
        TerraformCli::new(
            self.terraform.binary.clone(),
            self.terraform.working_dir.clone(),
            Duration::from_secs(self.terraform.timeout_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.terraform.binary, "terraform");
        assert_eq!(config.terraform.working_dir, "terraform");
        assert_eq!(config.engine.code_file_name, "main.tf");
        assert_eq!(config.llm.provider, "anthropic");
    }

    #[test]
    fn sections_override_defaults() {
        let config: Config = toml::from_str(
            r#"
[llm]
model = "claude-haiku-4-5"
timeout_secs = 30

[terraform]
binary = "tofu"
working_dir = "/srv/infra"

[engine]
code_file_name = "generated.tf"
"#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "claude-haiku-4-5");
        assert_eq!(config.terraform.binary, "tofu");
        assert_eq!(config.terraform.working_dir, "/srv/infra");
        assert_eq!(config.engine.code_file_name, "generated.tf");
        assert_eq!(
            config.engine_config().generation_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load(Utf8Path::new("/nonexistent/cloudpilot.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloudpilot.toml");
        fs::write(&path, "[llm\nbroken").unwrap();
        let utf8 = Utf8PathBuf::from_path_buf(path).unwrap();

        let err = Config::load(&utf8).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
