//! Validation-retry generator.
//!
//! Wraps the text-generation backend with syntactic validation and a bounded
//! retry loop. The backend is non-deterministic; any per-attempt failure
//! (transport error or failed validation) triggers another attempt until the
//! ceiling is hit. Successful code is persisted atomically before being
//! handed back, so the provisioning tool can never observe a partial write.

use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use tracing::{debug, warn};

use cloudpilot_llm::{GenerationRequest, TextGenBackend};
use cloudpilot_utils::atomic_write::write_file_atomic;
use cloudpilot_utils::error::GenerationError;
use cloudpilot_utils::types::FlowId;
use cloudpilot_validation::CodeValidator;

/// Hard ceiling on generation attempts (0-indexed attempts 0..=3).
pub const MAX_ATTEMPTS: u32 = 4;

/// Context for corrective regeneration after a rejected plan or a revised
/// task: the generator is asked to modify existing code rather than start
/// fresh.
#[derive(Debug, Clone)]
pub struct RevisionContext {
    /// The code currently on disk.
    pub current_code: String,
    /// Plan or analysis output to take into account, possibly empty.
    pub analysis: String,
}

/// Successfully generated and persisted code.
#[derive(Debug, Clone)]
pub struct GeneratedCode {
    /// The validated code text.
    pub code: String,
    /// Where it was persisted.
    pub path: Utf8PathBuf,
}

/// Bounded validation-retry wrapper around a text-generation backend.
pub struct CodeGenerator {
    backend: Arc<dyn TextGenBackend>,
    model: String,
    output_path: Utf8PathBuf,
    timeout: Duration,
}

impl CodeGenerator {
    /// Create a generator writing validated code to `output_path`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn TextGenBackend>,
        model: impl Into<String>,
        output_path: Utf8PathBuf,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            output_path,
            timeout,
        }
    }

    /// Generate syntactically well-formed code for `task`, retrying up to
    /// [`MAX_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// - `GenerationError::RetriesExhausted` once the attempt ceiling is hit
    /// - `GenerationError::Persist` if the validated code cannot be written
    pub async fn generate(
        &self,
        flow_id: FlowId,
        task: &str,
        revision: Option<&RevisionContext>,
    ) -> Result<GeneratedCode, GenerationError> {
        let prompt = build_prompt(task, revision);
        let mut last_failure = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            debug!(flow_id = %flow_id, attempt, "Generation attempt");

            let request =
                GenerationRequest::new(flow_id, self.model.as_str(), prompt.as_str(), self.timeout);
            let response = match self.backend.generate(&request).await {
                Ok(result) => result.raw_response,
                Err(e) => {
                    warn!(flow_id = %flow_id, attempt, error = %e, "Generation attempt failed");
                    last_failure = e.to_string();
                    continue;
                }
            };

            let code = strip_code_fences(&response);

            if let Err(errors) = CodeValidator::validate(&code) {
                let reasons = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(flow_id = %flow_id, attempt, reasons = %reasons, "Validation rejected response");
                last_failure = reasons;
                continue;
            }

            write_file_atomic(&self.output_path, &code).map_err(|e| GenerationError::Persist {
                path: self.output_path.clone(),
                reason: e.to_string(),
            })?;

            return Ok(GeneratedCode {
                code,
                path: self.output_path.clone(),
            });
        }

        Err(GenerationError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
            last_failure,
        })
    }
}

/// Assemble the fixed instruction template for an attempt.
fn build_prompt(task: &str, revision: Option<&RevisionContext>) -> String {
    match revision {
        Some(context) => {
            let mut prompt = format!(
                "Modify the following Terraform code based on this task: {task}\n\n\
                 Current Terraform code:\n```\n{}\n```\n",
                context.current_code
            );
            if !context.analysis.is_empty() {
                prompt.push_str(&format!(
                    "\nTake this plan output into account:\n{}\n",
                    context.analysis
                ));
            }
            prompt.push_str("\nReturn only the modified Terraform code, no explanations.");
            prompt
        }
        None => format!(
            "Generate Terraform code for the following task: {task}\n\n\
             Return only the Terraform code, no explanations."
        ),
    }
}

/// Remove a surrounding Markdown code fence, including a language tag on the
/// opening line.
fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let without_open = match trimmed.find('\n') {
        Some(idx) => &trimmed[idx + 1..],
        None => return String::new(),
    };
    let without_close = without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim_end();
    without_close.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudpilot_llm::scripted::ScriptedBackend;
    use cloudpilot_utils::error::LlmError;

    const VALID_CODE: &str = r#"resource "aws_s3_bucket" "storage" {
  bucket = "cloudpilot-example-storage"
}"#;

    fn generator(backend: Arc<ScriptedBackend>, dir: &tempfile::TempDir) -> CodeGenerator {
        let path = Utf8PathBuf::from_path_buf(dir.path().join("main.tf")).unwrap();
        CodeGenerator::new(backend, "test-model", path, Duration::from_secs(5))
    }

    #[test]
    fn strips_fences_with_language_tag() {
        let fenced = "```hcl\nresource \"a\" \"b\" {}\n```";
        assert_eq!(strip_code_fences(fenced), "resource \"a\" \"b\" {}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("plain text"), "plain text");
    }

    #[test]
    fn corrective_prompt_embeds_existing_code_and_analysis() {
        let revision = RevisionContext {
            current_code: "resource \"x\" \"y\" {}".to_string(),
            analysis: "Plan: 1 to add".to_string(),
        };
        let prompt = build_prompt("add encryption", Some(&revision));
        assert!(prompt.contains("Modify the following Terraform code"));
        assert!(prompt.contains("resource \"x\" \"y\" {}"));
        assert!(prompt.contains("Plan: 1 to add"));
    }

    #[tokio::test]
    async fn succeeds_on_first_valid_response() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_response(format!("```hcl\n{VALID_CODE}\n```"));
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(backend.clone(), &dir);

        let generated = generator
            .generate(FlowId::new(), "create a storage bucket", None)
            .await
            .unwrap();

        assert!(generated.code.contains("aws_s3_bucket"));
        assert_eq!(std::fs::read_to_string(&generated.path).unwrap().trim(), VALID_CODE);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn retries_after_invalid_response() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_response("resource \"aws_s3_bucket\" \"b\" {"); // unbalanced
        backend.push_response(VALID_CODE);
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(backend.clone(), &dir);

        let generated = generator
            .generate(FlowId::new(), "create a storage bucket", None)
            .await
            .unwrap();

        assert!(generated.code.contains("aws_s3_bucket"));
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn backend_errors_count_as_attempts() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_error(LlmError::Transport("connection reset".to_string()));
        backend.push_response(VALID_CODE);
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(backend.clone(), &dir);

        let generated = generator
            .generate(FlowId::new(), "task", None)
            .await
            .unwrap();
        assert!(generated.code.contains("aws_s3_bucket"));
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausts_after_four_attempts() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_repeated("resource \"aws_s3_bucket\" \"b\" {", 8);
        let dir = tempfile::tempdir().unwrap();
        let generator = generator(backend.clone(), &dir);

        let err = generator
            .generate(FlowId::new(), "task", None)
            .await
            .unwrap_err();

        match err {
            GenerationError::RetriesExhausted {
                attempts,
                last_failure,
            } => {
                assert_eq!(attempts, 4);
                assert!(!last_failure.is_empty());
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
        // Never more than four attempts for one invocation.
        assert_eq!(backend.call_count(), 4);
    }
}
