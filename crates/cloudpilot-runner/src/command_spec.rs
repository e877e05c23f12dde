use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

use tokio::process::Command;

/// Specification for a command to execute.
///
/// All process execution goes through this type to ensure argv-style
/// invocation: arguments are discrete `OsString` elements, never shell
/// strings, so nothing the text-generation service produced can be
/// interpreted by a shell.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The program to execute
    pub program: OsString,
    /// Arguments as discrete elements (NOT shell strings)
    pub args: Vec<OsString>,
    /// Optional working directory
    pub cwd: Option<PathBuf>,
    /// Optional environment overrides
    pub env: Option<HashMap<OsString, OsString>>,
}

impl CommandSpec {
    /// Create a new `CommandSpec` for the given program.
    #[must_use]
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: None,
        }
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Add an environment variable override.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Build a `tokio::process::Command` from this spec.
    #[must_use]
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        if let Some(env) = &self.env {
            cmd.envs(env);
        }
        cmd
    }

    /// Human-readable rendering for logs and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.to_string_lossy().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().to_string()));
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_argv_style_spec() {
        let spec = CommandSpec::new("terraform")
            .arg("plan")
            .args(["-input=false", "-no-color"])
            .cwd("/tmp/workdir");

        assert_eq!(spec.program, OsString::from("terraform"));
        assert_eq!(spec.args.len(), 3);
        assert_eq!(spec.cwd, Some(PathBuf::from("/tmp/workdir")));
    }

    #[test]
    fn arguments_stay_discrete() {
        // A malicious-looking argument stays a single argv element.
        let spec = CommandSpec::new("terraform").arg("plan; rm -rf /");
        assert_eq!(spec.args, vec![OsString::from("plan; rm -rf /")]);
    }

    #[test]
    fn display_joins_program_and_args() {
        let spec = CommandSpec::new("terraform").arg("init").arg("-input=false");
        assert_eq!(spec.display(), "terraform init -input=false");
    }
}
