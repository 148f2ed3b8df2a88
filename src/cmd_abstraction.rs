//! Command execution abstraction for testability.
//!
//! Every external program this tool drives (`dpkg-query`, `apt-get`,
//! `systemctl`, `nginx -t`, `htpasswd`) goes through [`CommandExecutor`], so
//! unit tests can script their results without spawning anything.

use anyhow::Result;
use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::error::SetupError;

/// Output from command execution
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Standard output from the command
    pub stdout: String,
    /// Standard error from the command
    pub stderr: String,
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// The exit code, if available
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: String::new(),
            success: true,
            code: Some(0),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.to_string(),
            success: false,
            code: Some(code),
        }
    }

    /// Turn a non-zero exit into [`SetupError::CommandFailed`].
    ///
    /// `command` is only used for the error message.
    pub fn check(self, command: &str) -> Result<Self> {
        if self.success {
            return Ok(self);
        }

        let detail = match (self.code, self.stderr.trim()) {
            (Some(code), "") => format!("exit code {}", code),
            (Some(code), stderr) => format!("exit code {}: {}", code, stderr),
            (None, "") => "terminated by signal".to_string(),
            (None, stderr) => format!("terminated by signal: {}", stderr),
        };

        Err(SetupError::CommandFailed {
            command: command.to_string(),
            detail,
        }
        .into())
    }
}

/// Trait for command execution, allowing dependency injection for testing.
#[cfg_attr(test, automock)]
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with the given arguments.
    ///
    /// Returns `Err` only when the program could not be started; a non-zero
    /// exit is reported through [`CommandOutput::success`].
    fn execute(&self, cmd: &str, args: &[String]) -> Result<CommandOutput>;

    /// Execute a command, feeding `stdin` to its standard input.
    fn execute_with_stdin(&self, cmd: &str, args: &[String], stdin: &str) -> Result<CommandOutput>;
}

/// Real implementation of CommandExecutor that runs actual system commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealCommandExecutor;

impl RealCommandExecutor {
    /// Create a new RealCommandExecutor
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, cmd: &str, args: &[String]) -> Result<CommandOutput> {
        debug!("Running {} {}", cmd, args.join(" "));
        let output = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| anyhow::anyhow!("Failed to execute {}: {}", cmd, e))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }

    fn execute_with_stdin(
        &self,
        cmd: &str,
        args: &[String],
        stdin_data: &str,
    ) -> Result<CommandOutput> {
        // stdin content is never logged, it may be a password
        debug!("Running {} {} (with stdin)", cmd, args.join(" "));
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to execute {}: {}", cmd, e))?;

        // A child that exits without reading closes the pipe early; its exit
        // status and stderr say more than EPIPE does
        let written = match child.stdin.take() {
            Some(mut stdin) => match stdin.write_all(stdin_data.as_bytes()) {
                Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("{} closed stdin before reading all input", cmd);
                    Ok(())
                }
                other => other,
            },
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        written.map_err(|e| anyhow::anyhow!("Failed to write to {}: {}", cmd, e))?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Helper function to convert a slice of &str to Vec<String>.
///
/// mockall has trouble with the nested lifetimes of `&[&str]`, so the trait
/// takes `&[String]`.
pub fn args_to_strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
