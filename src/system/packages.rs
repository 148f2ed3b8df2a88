//! Debian/Ubuntu package management through dpkg and apt.

use anyhow::Result;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::cmd_abstraction::{args_to_strings, CommandExecutor, RealCommandExecutor};

/// Query and install system packages.
#[cfg_attr(test, automock)]
pub trait PackageInstaller {
    /// Whether `package` is currently installed.
    fn is_installed(&self, package: &str) -> Result<bool>;

    /// Refresh the package index.
    fn refresh_index(&self) -> Result<()>;

    /// Install `package` non-interactively.
    fn install(&self, package: &str) -> Result<()>;
}

/// [`PackageInstaller`] backed by `dpkg-query` and `apt-get`.
#[derive(Debug, Clone, Default)]
pub struct Apt<E: CommandExecutor = RealCommandExecutor> {
    exec: E,
}

impl<E: CommandExecutor> Apt<E> {
    pub fn new(exec: E) -> Self {
        Self { exec }
    }
}

impl<E: CommandExecutor> PackageInstaller for Apt<E> {
    fn is_installed(&self, package: &str) -> Result<bool> {
        let output = self.exec.execute(
            "dpkg-query",
            &args_to_strings(&["-W", "-f=${Status}", package]),
        )?;

        // dpkg-query exits 1 for packages it has never heard of
        let installed = output.success && output.stdout.trim().ends_with("install ok installed");
        debug!("{} installed: {}", package, installed);
        Ok(installed)
    }

    fn refresh_index(&self) -> Result<()> {
        self.exec
            .execute("apt-get", &args_to_strings(&["update"]))?
            .check("apt-get update")?;
        Ok(())
    }

    fn install(&self, package: &str) -> Result<()> {
        self.exec
            .execute("apt-get", &args_to_strings(&["install", "-y", package]))?
            .check(&format!("apt-get install {}", package))?;
        Ok(())
    }
}
