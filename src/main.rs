//! nginx-setup - NGINX configuration generator
//!
//! Writes nginx.conf from feature flags, tests it and reloads nginx.

use anyhow::Result;
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use nginx_setup::cli::{self, Cli, ParseOutcome};
use nginx_setup::cmd_abstraction::RealCommandExecutor;
use nginx_setup::config::Settings;
use nginx_setup::deploy::DeployOptions;
use nginx_setup::error::SetupError;
use nginx_setup::fs_abstraction::real_fs;
use nginx_setup::prompt::TerminalInput;
use nginx_setup::setup::{self, Request};
use nginx_setup::system::{check_root, Apt, Host, Htpasswd, NginxValidator, Systemctl};

fn main() -> ExitCode {
    let cli = match cli::parse_args(std::env::args().skip(1)) {
        Ok(ParseOutcome::Run(cli)) => cli,
        Ok(ParseOutcome::Exit(text)) => {
            print!("{}", text);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", err);
            eprintln!();
            eprint!("{}", cli::help_text());
            return ExitCode::FAILURE;
        }
    };

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", err);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            match err.downcast_ref::<SetupError>() {
                Some(SetupError::NotRoot) => {}
                Some(SetupError::ValidationFailed { .. }) => {
                    println!("[FAIL] nginx configuration test failed, nginx was not reloaded.");
                }
                _ => println!("[FAIL] nginx was not reconfigured."),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    check_root()?;

    let settings = Settings::load_or_default(cli.config.as_deref())?;

    let exec = RealCommandExecutor::new();
    let packages = Apt::new(exec);
    let services = Systemctl::new(exec);
    let validator = NginxValidator::new(exec, settings.nginx.binary.clone());
    let credentials = Htpasswd::new(exec, settings.auth.htpasswd_binary.clone());

    let host = Host {
        fs: real_fs(),
        packages: &packages,
        services: &services,
        validator: &validator,
        credentials: &credentials,
        input: &TerminalInput,
    };

    let request = Request {
        features: cli.features(),
        deploy: DeployOptions {
            restore_on_failure: cli.restore_on_failure,
        },
    };

    let summary = setup::run(&request, &settings, &host)?;

    println!();
    println!("[OK] nginx configured for {}", summary.site.domain);
    println!("  Config:        {}", summary.deployment.target.display());
    if let Some(backup) = &summary.deployment.backup {
        println!("  Backup:        {}", backup.display());
    }
    println!("  Document root: {}", summary.site.root.display());
    println!();

    Ok(())
}
