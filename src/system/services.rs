//! systemd unit control.

use anyhow::Result;

#[cfg(test)]
use mockall::automock;

use crate::cmd_abstraction::{args_to_strings, CommandExecutor, RealCommandExecutor};

/// Enable, start and reload services.
#[cfg_attr(test, automock)]
pub trait ServiceController {
    fn enable(&self, unit: &str) -> Result<()>;
    fn start(&self, unit: &str) -> Result<()>;
    /// Graceful reload: the service re-reads its configuration without
    /// dropping connections.
    fn reload(&self, unit: &str) -> Result<()>;
}

/// [`ServiceController`] backed by `systemctl`.
#[derive(Debug, Clone, Default)]
pub struct Systemctl<E: CommandExecutor = RealCommandExecutor> {
    exec: E,
}

impl<E: CommandExecutor> Systemctl<E> {
    pub fn new(exec: E) -> Self {
        Self { exec }
    }

    fn systemctl(&self, action: &str, unit: &str) -> Result<()> {
        self.exec
            .execute("systemctl", &args_to_strings(&[action, unit]))?
            .check(&format!("systemctl {} {}", action, unit))?;
        Ok(())
    }
}

impl<E: CommandExecutor> ServiceController for Systemctl<E> {
    fn enable(&self, unit: &str) -> Result<()> {
        self.systemctl("enable", unit)
    }

    fn start(&self, unit: &str) -> Result<()> {
        self.systemctl("start", unit)
    }

    fn reload(&self, unit: &str) -> Result<()> {
        self.systemctl("reload", unit)
    }
}
