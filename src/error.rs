//! Error types for nginx-setup.

use std::path::PathBuf;
use thiserror::Error;

/// Failures the caller needs to tell apart from a generic I/O or command error.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("This tool must be run as root. Please run with sudo.")]
    NotRoot,

    #[error("nginx rejected the configuration at {}:\n{output}", path.display())]
    ValidationFailed { path: PathBuf, output: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Input closed while waiting for {0}")]
    InputClosed(String),

    #[error("{command} failed: {detail}")]
    CommandFailed { command: String, detail: String },
}

/// Command-line parsing errors. All of them end the run with exit code 1.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OptionsError {
    #[error("No options given")]
    NoArguments,

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("{0}")]
    Invalid(String),
}
