//! External command invocation
//!
//! Every adapter that talks to the host (cluster query tool, service
//! manager, rescan agent) goes through [`CommandSpec`]. Commands run
//! synchronously to completion; stdout and stderr are captured as text.

use std::fmt;
use std::io;
use std::process::Command;

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the member name in health commands.
pub const MEMBER_PLACEHOLDER: &str = "{member}";

/// A program and its arguments, configured as a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSpec(Vec<String>);

impl CommandSpec {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(argv.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn program(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    /// Whether any argument mentions `placeholder`.
    pub fn mentions(&self, placeholder: &str) -> bool {
        self.0.iter().any(|arg| arg.contains(placeholder))
    }

    /// Copy with `placeholder` replaced by `value` in every argument.
    pub fn render(&self, placeholder: &str, value: &str) -> Self {
        Self(self.0.iter().map(|arg| arg.replace(placeholder, value)).collect())
    }

    /// Copy with `extra` appended.
    pub fn with_args(&self, extra: &[&str]) -> Self {
        let mut argv = self.0.clone();
        argv.extend(extra.iter().map(|s| s.to_string()));
        Self(argv)
    }

    /// Run to completion, capturing output.
    pub fn run(&self) -> io::Result<CommandOutput> {
        let (program, args) = self.0.split_first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "empty command")
        })?;

        let output = Command::new(program).args(args).output()?;

        Ok(CommandOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Exit code; `None` when killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Non-empty, trimmed stdout lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().map(str::trim).filter(|l| !l.is_empty())
    }

    /// Short description of a failure: first stderr line, else the exit code.
    pub fn failure_summary(&self) -> String {
        match self.stderr.lines().map(str::trim).find(|l| !l.is_empty()) {
            Some(line) => line.to_string(),
            None => match self.code {
                Some(code) => format!("exit status {}", code),
                None => "terminated by signal".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_every_arg() {
        let spec = CommandSpec::new(["query", "--node", "{member}", "name={member}"]);
        let rendered = spec.render(MEMBER_PLACEHOLDER, "node-a");
        assert_eq!(rendered.to_string(), "query --node node-a name=node-a");
        assert!(spec.mentions(MEMBER_PLACEHOLDER));
        assert!(!rendered.mentions(MEMBER_PLACEHOLDER));
    }

    #[test]
    fn test_with_args_appends() {
        let spec = CommandSpec::new(["systemctl"]).with_args(&["is-active", "cron"]);
        assert_eq!(spec.to_string(), "systemctl is-active cron");
        assert_eq!(spec.program(), Some("systemctl"));
    }

    #[test]
    fn test_deserialize_from_array() {
        let spec: CommandSpec = serde_json::from_str(r#"["sh", "-c", "true"]"#).unwrap();
        assert_eq!(spec, CommandSpec::new(["sh", "-c", "true"]));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let err = CommandSpec::new(Vec::<String>::new()).run().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_run_captures_output() {
        let output = CommandSpec::new(["sh", "-c", "echo alpha; echo; echo beta; echo oops >&2; exit 3"])
            .run()
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["alpha", "beta"]);
        assert_eq!(output.failure_summary(), "oops");
    }

    #[test]
    fn test_failure_summary_without_stderr() {
        let output = CommandSpec::new(["sh", "-c", "exit 4"]).run().unwrap();
        assert_eq!(output.failure_summary(), "exit status 4");
    }
}
