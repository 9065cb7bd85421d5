//! External process execution.
//!
//! Every side effect gatewayctl has on the outside world (the translator,
//! `docker`, `kubectl`, `istioctl`) goes through a [`CommandRunner`]. The
//! production runner is [`SystemRunner`]; tests swap in a recording runner.

use std::fmt::{Display, Formatter};
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// A program plus its arguments. No shell is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl Display for CommandSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum ExecError {
    /// The program could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// The program ran and failed.
    #[error("`{command}` exited with {}: {stderr}", describe_exit(.exit_code))]
    NonZeroExit {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "a signal".to_string(),
    }
}

/// Runs external commands to completion.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ExecError>;
}

/// Runs commands with [`std::process::Command`], capturing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ExecError> {
        debug!(command = %command, "running");
        let output = Command::new(&command.program)
            .args(&command.args)
            .output()
            .map_err(|source| ExecError::Spawn {
                command: command.to_string(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(ExecError::NonZeroExit {
                command: command.to_string(),
                exit_code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        if !stdout.trim().is_empty() {
            debug!(command = %command.program, output = %stdout.trim(), "command output");
        }
        Ok(CommandOutput { stdout, stderr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_quotes_whitespace_and_empty() {
        let cmd = CommandSpec::new("docker")
            .arg("run")
            .arg("-e")
            .arg(r#"LABELS={"app": "x"}"#)
            .arg("");
        assert_eq!(cmd.to_string(), r#"docker run -e 'LABELS={"app": "x"}' ''"#);
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_success() {
        let out = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "echo hello"]))
            .unwrap();
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_nonzero_exit() {
        let err = SystemRunner
            .run(&CommandSpec::new("sh").args(["-c", "echo broken >&2; exit 3"]))
            .unwrap_err();
        match err {
            ExecError::NonZeroExit {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[test]
    fn test_system_runner_missing_program() {
        let err = SystemRunner
            .run(&CommandSpec::new("/nonexistent/gatewayctl-test-bin"))
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
