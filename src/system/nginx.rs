//! Configuration testing with `nginx -t`.

use anyhow::Result;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::cmd_abstraction::{CommandExecutor, RealCommandExecutor};

/// Verdict of the external configuration test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub passed: bool,
    /// What the validator printed (nginx writes its verdict to stderr)
    pub output: String,
}

/// Checks a configuration file without applying it.
#[cfg_attr(test, automock)]
pub trait ConfigValidator {
    /// `Err` only when the validator itself could not be run; a rejected
    /// configuration is a report with `passed == false`.
    fn validate(&self, config_path: &Path) -> Result<ValidationReport>;
}

/// [`ConfigValidator`] running `nginx -t -c <path>`.
#[derive(Debug, Clone)]
pub struct NginxValidator<E: CommandExecutor = RealCommandExecutor> {
    exec: E,
    binary: String,
}

impl<E: CommandExecutor> NginxValidator<E> {
    pub fn new(exec: E, binary: impl Into<String>) -> Self {
        Self {
            exec,
            binary: binary.into(),
        }
    }
}

impl<E: CommandExecutor> ConfigValidator for NginxValidator<E> {
    fn validate(&self, config_path: &Path) -> Result<ValidationReport> {
        let args = vec![
            "-t".to_string(),
            "-c".to_string(),
            config_path.display().to_string(),
        ];
        let output = self.exec.execute(&self.binary, &args)?;

        let text = if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            output.stderr
        };

        Ok(ValidationReport {
            passed: output.success,
            output: text.trim_end().to_string(),
        })
    }
}
