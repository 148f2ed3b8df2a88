//! # nginx-setup - NGINX configuration generator
//!
//! Writes a complete `nginx.conf` for a single site from a handful of
//! feature flags, installs whatever those features need, keeps a timestamped
//! backup of the previous file, and reloads nginx only if `nginx -t` accepts
//! the result.
//!
//! ## Features
//!
//! - **Virtual host** - Prompted domain with its own document root
//! - **User directories** - `/~user/` served from `~user/public_html`
//! - **Basic auth** - htpasswd-protected location, password read without echo
//! - **PAM auth** - PAM-protected location when the dynamic module is present
//! - **CGI** - fcgiwrap installed, enabled and wired to `/cgi-bin/`
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       nginx-setup                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)              → FeatureFlags                     │
//! │  Settings (serde_yaml)   → paths, names, constants          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  installer   ensure packages (PackageInstaller)             │
//! │  docroot     site identity + placeholder page               │
//! │  fragments   one location block per feature                 │
//! │  template    skeleton + blocks (minijinja)                  │
//! │  deploy      backup, write, nginx -t, reload                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  system      Apt, Systemctl, NginxValidator, Htpasswd       │
//! │                └── CommandExecutor (std::process)           │
//! │  fs_abstraction, prompt (termios)                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use nginx_setup::cli::FeatureFlags;
//! use nginx_setup::cmd_abstraction::RealCommandExecutor;
//! use nginx_setup::config::Settings;
//! use nginx_setup::fs_abstraction::real_fs;
//! use nginx_setup::prompt::TerminalInput;
//! use nginx_setup::setup::{self, Request};
//! use nginx_setup::system::{check_root, Apt, Host, Htpasswd, NginxValidator, Systemctl};
//!
//! fn main() -> anyhow::Result<()> {
//!     check_root()?;
//!
//!     let settings = Settings::default();
//!     let exec = RealCommandExecutor::new();
//!     let packages = Apt::new(exec);
//!     let services = Systemctl::new(exec);
//!     let validator = NginxValidator::new(exec, "nginx");
//!     let credentials = Htpasswd::new(exec, "htpasswd");
//!
//!     let host = Host {
//!         fs: real_fs(),
//!         packages: &packages,
//!         services: &services,
//!         validator: &validator,
//!         credentials: &credentials,
//!         input: &TerminalInput,
//!     };
//!
//!     let request = Request {
//!         features: FeatureFlags { user_dir: true, ..FeatureFlags::default() },
//!         ..Request::default()
//!     };
//!     let summary = setup::run(&request, &settings, &host)?;
//!     println!("Configured {}", summary.site.domain);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Command-line parsing and feature flags
//! - [`cmd_abstraction`] - Mockable external command execution
//! - [`config`] - Settings file parsing and validation
//! - [`deploy`] - Backup, write, test and reload
//! - [`docroot`] - Site identity and document root provisioning
//! - [`error`] - Error types
//! - [`fragments`] - Per-feature location blocks
//! - [`fs_abstraction`] - Mockable filesystem access
//! - [`installer`] - Package and service dependencies
//! - [`prompt`] - Operator input (domain, credentials)
//! - [`setup`] - The end-to-end run
//! - [`system`] - Package manager, systemd, nginx and htpasswd adapters
//! - [`template`] - nginx.conf and placeholder page rendering
//! - [`utils`] - Small shared helpers
//! - [`validation`] - Domain and username validation

pub mod cli;
pub mod cmd_abstraction;
pub mod config;
pub mod deploy;
pub mod docroot;
pub mod error;
pub mod fragments;
pub mod fs_abstraction;
pub mod installer;
pub mod prompt;
pub mod setup;
pub mod system;
pub mod template;
pub mod utils;
pub mod validation;

pub use cli::{Cli, FeatureFlags};
pub use config::Settings;
