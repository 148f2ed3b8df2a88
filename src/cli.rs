//! CLI argument parsing with clap.
//!
//! The raw tokens go through [`parse_args`] rather than `Cli::parse()` so that
//! an empty command line and unknown options exit with status 1 and the full
//! usage text, and so that `-h`/`--help` wins over anything else on the line.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::error::OptionsError;

const BIN_NAME: &str = "nginx-setup";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "nginx-setup")]
#[command(author, version, about = "Generate, validate and deploy an NGINX configuration")]
#[command(args_override_self = true)]
pub struct Cli {
    /// Install nginx if it is missing
    #[arg(long)]
    pub check_nginx: bool,

    /// Prompt for a domain and serve it from its own document root
    #[arg(long)]
    pub virtual_host: bool,

    /// Serve ~user/public_html under /~user/
    #[arg(long)]
    pub user_dir: bool,

    /// Protect a location with HTTP basic auth (prompts for credentials)
    #[arg(long)]
    pub auth: bool,

    /// Protect a location with PAM auth (if the module is installed)
    #[arg(long)]
    pub auth_pam: bool,

    /// Run CGI scripts through fcgiwrap
    #[arg(long)]
    pub cgi: bool,

    /// Enable every option above
    #[arg(long)]
    pub all: bool,

    /// Settings file path [default: /etc/nginx-setup/config.yaml]
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Put the previous nginx.conf back if the new one fails validation
    #[arg(long)]
    pub restore_on_failure: bool,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Feature toggles for one run. Built once from the command line and never
/// changed afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    pub check_nginx: bool,
    pub virtual_host: bool,
    pub user_dir: bool,
    pub auth: bool,
    pub auth_pam: bool,
    pub cgi: bool,
}

impl FeatureFlags {
    /// Every feature switched on, as `--all` requests.
    pub const fn all() -> Self {
        Self {
            check_nginx: true,
            virtual_host: true,
            user_dir: true,
            auth: true,
            auth_pam: true,
            cgi: true,
        }
    }
}

impl Cli {
    /// Resolve the feature toggles. `--all` overrides every individual flag.
    pub fn features(&self) -> FeatureFlags {
        if self.all {
            return FeatureFlags::all();
        }

        FeatureFlags {
            check_nginx: self.check_nginx,
            virtual_host: self.virtual_host,
            user_dir: self.user_dir,
            auth: self.auth,
            auth_pam: self.auth_pam,
            cgi: self.cgi,
        }
    }
}

/// Result of a successful parse.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Proceed with the run.
    Run(Cli),
    /// Print this text to stdout and exit with status 0 (help, version).
    Exit(String),
}

/// Parse command-line tokens, excluding the program name.
pub fn parse_args<I, T>(args: I) -> Result<ParseOutcome, OptionsError>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();

    if args.is_empty() {
        return Err(OptionsError::NoArguments);
    }

    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(ParseOutcome::Exit(help_text()));
    }

    // clap would take this as the end of options and ignore it
    if let Some(marker) = args.iter().find(|a| *a == "--") {
        return Err(OptionsError::UnknownOption(marker.clone()));
    }

    let argv = std::iter::once(BIN_NAME.to_string()).chain(args);
    match Cli::try_parse_from(argv) {
        Ok(cli) => Ok(ParseOutcome::Run(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                Ok(ParseOutcome::Exit(err.to_string()))
            }
            ErrorKind::UnknownArgument => Err(OptionsError::UnknownOption(offending_arg(&err))),
            _ => {
                let message = err.to_string();
                let first = message.lines().next().unwrap_or_default();
                Err(OptionsError::Invalid(
                    first.trim_start_matches("error: ").to_string(),
                ))
            }
        },
    }
}

/// Full usage text.
pub fn help_text() -> String {
    Cli::command().render_help().to_string()
}

fn offending_arg(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.clone(),
        _ => String::from("?"),
    }
}
