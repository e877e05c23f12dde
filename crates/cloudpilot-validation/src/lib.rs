//! Syntactic validation for generated Terraform/HCL text.
//!
//! The text-generation service is non-deterministic and occasionally returns
//! truncated or malformed output. This module rejects such output before it
//! ever reaches the provisioning tool; it does not understand the semantics
//! of the code, only its surface structure.
//!
//! All checks must pass: balanced paired delimiters, no dangling trailing
//! token, a minimum length threshold, and every block opener closed by the
//! end of the text.

use cloudpilot_utils::error::ValidationError;

/// Minimum number of significant (non-whitespace) characters. Anything
/// shorter is treated as a truncated response.
const MIN_SIGNIFICANT_CHARS: usize = 30;

/// Keywords that open a block in HCL; a response must not end on one.
const BLOCK_KEYWORDS: &[&str] = &[
    "resource",
    "variable",
    "provider",
    "module",
    "output",
    "data",
    "locals",
    "terraform",
    "dynamic",
];

/// Trailing characters that indicate an incomplete clause.
const DANGLING_CHARS: &[char] = &['=', ',', '.', '{', '(', '['];

/// Validator for generated infrastructure code.
pub struct CodeValidator;

impl CodeValidator {
    /// Validate generated code text.
    ///
    /// Returns `Ok(())` if the text is syntactically plausible, or the full
    /// list of failed checks.
    pub fn validate(content: &str) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        errors.extend(Self::check_delimiters(content));

        if let Some(token) = Self::trailing_incomplete_token(content) {
            errors.push(ValidationError::DanglingToken { token });
        }

        let significant = content.chars().filter(|c| !c.is_whitespace()).count();
        if significant < MIN_SIGNIFICANT_CHARS {
            errors.push(ValidationError::TooShort {
                actual: significant,
                minimum: MIN_SIGNIFICANT_CHARS,
            });
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Scan for unbalanced `()[]{}`, ignoring delimiters inside string
    /// literals and comments.
    fn check_delimiters(content: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut stack: Vec<(char, usize)> = Vec::new();

        let mut chars = content.char_indices().peekable();
        while let Some((pos, c)) = chars.next() {
            match c {
                '"' => {
                    // Skip string literal, honoring escapes.
                    while let Some((_, sc)) = chars.next() {
                        match sc {
                            '\\' => {
                                chars.next();
                            }
                            '"' => break,
                            _ => {}
                        }
                    }
                }
                '#' => {
                    Self::skip_line(&mut chars);
                }
                '/' => match chars.peek() {
                    Some((_, '/')) => {
                        Self::skip_line(&mut chars);
                    }
                    Some((_, '*')) => {
                        chars.next();
                        let mut prev = ' ';
                        for (_, bc) in chars.by_ref() {
                            if prev == '*' && bc == '/' {
                                break;
                            }
                            prev = bc;
                        }
                    }
                    _ => {}
                },
                '(' | '[' | '{' => stack.push((c, pos)),
                ')' | ']' | '}' => {
                    let expected = match c {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    match stack.last() {
                        Some(&(open, _)) if open == expected => {
                            stack.pop();
                        }
                        _ => errors.push(ValidationError::UnexpectedClosing {
                            delimiter: c,
                            position: pos,
                        }),
                    }
                }
                _ => {}
            }
        }

        let open_blocks = stack.iter().filter(|(c, _)| *c == '{').count();
        if let Some(&(delimiter, position)) = stack.iter().find(|(c, _)| *c != '{') {
            errors.push(ValidationError::UnbalancedDelimiter {
                delimiter,
                position,
            });
        }
        if open_blocks > 0 {
            errors.push(ValidationError::UnclosedBlock { open_blocks });
        }

        errors
    }

    fn skip_line(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
        for (_, c) in chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Detect a trailing token that indicates the response was cut off
    /// mid-clause.
    fn trailing_incomplete_token(content: &str) -> Option<String> {
        let trimmed = content.trim_end();
        let last = trimmed.chars().next_back()?;
        if DANGLING_CHARS.contains(&last) {
            return Some(last.to_string());
        }
        let token = trimmed.rsplit(char::is_whitespace).next()?;
        if BLOCK_KEYWORDS.contains(&token) {
            return Some(token.to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_BUCKET: &str = r#"provider "aws" {
  region = "us-east-1"
}

resource "aws_s3_bucket" "storage" {
  bucket = "cloudpilot-example-storage"
}
"#;

    #[test]
    fn accepts_valid_terraform() {
        assert!(CodeValidator::validate(VALID_BUCKET).is_ok());
    }

    #[test]
    fn rejects_unclosed_block() {
        let text = "resource \"aws_s3_bucket\" \"b\" {\n  bucket = \"name\"\n";
        let errors = CodeValidator::validate(text).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::UnclosedBlock { open_blocks: 1 }))
        );
    }

    #[test]
    fn rejects_unexpected_closing_delimiter() {
        let text = "output \"x\" {\n  value = 1\n}\n}\nextra_padding_here = true\n";
        let errors = CodeValidator::validate(text).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::UnexpectedClosing { delimiter: '}', .. }))
        );
    }

    #[test]
    fn rejects_unbalanced_parenthesis() {
        let text = "locals {\n  x = max(1, 2\n}\nlonger_padding_value = true\n";
        let errors = CodeValidator::validate(text).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::UnbalancedDelimiter { delimiter: '(', .. }))
        );
    }

    #[test]
    fn rejects_dangling_block_keyword() {
        let text = "provider \"aws\" {\n  region = \"us-east-1\"\n}\n\nresource";
        let errors = CodeValidator::validate(text).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ValidationError::DanglingToken { token } if token == "resource")
        ));
    }

    #[test]
    fn rejects_trailing_assignment() {
        let text = "variable \"name\" {\n  default = \"x\"\n}\nvalue =";
        let errors = CodeValidator::validate(text).unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::DanglingToken { .. }))
        );
    }

    #[test]
    fn rejects_truncated_response() {
        let errors = CodeValidator::validate("provider {}").unwrap_err();
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, ValidationError::TooShort { .. }))
        );
    }

    #[test]
    fn braces_inside_strings_are_ignored() {
        let text = "resource \"aws_iam_policy\" \"p\" {\n  policy = \"{\\\"Version\\\": \\\"2012-10-17\\\"}\"\n}\n";
        assert!(CodeValidator::validate(text).is_ok());
    }

    #[test]
    fn braces_inside_comments_are_ignored() {
        let text = "# opening { brace in comment\n// another { one\n/* and { here */\nprovider \"aws\" {\n  region = \"us-east-1\"\n}\n";
        assert!(CodeValidator::validate(text).is_ok());
    }

    #[test]
    fn collects_multiple_failures() {
        let errors = CodeValidator::validate("resource \"x\" \"y\" {").unwrap_err();
        assert!(errors.len() >= 2, "expected several errors, got {errors:?}");
    }
}
