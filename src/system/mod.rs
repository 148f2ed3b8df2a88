//! Host collaborators: package manager, service manager, the nginx binary
//! and htpasswd.
//!
//! Each is a narrow trait with one implementation that shells out through
//! [`CommandExecutor`](crate::cmd_abstraction::CommandExecutor). [`Host`]
//! bundles them together with the filesystem and the operator prompt.

mod htpasswd;
mod nginx;
mod packages;
mod services;

use anyhow::Result;

pub use htpasswd::{CredentialWriter, Htpasswd};
pub use nginx::{ConfigValidator, NginxValidator, ValidationReport};
pub use packages::{Apt, PackageInstaller};
pub use services::{ServiceController, Systemctl};

#[cfg(test)]
pub use htpasswd::MockCredentialWriter;
#[cfg(test)]
pub use nginx::MockConfigValidator;
#[cfg(test)]
pub use packages::MockPackageInstaller;
#[cfg(test)]
pub use services::MockServiceController;

use crate::error::SetupError;
use crate::fs_abstraction::FileSystem;
use crate::prompt::InputSource;

/// Everything a run touches outside of its own memory.
pub struct Host<'a> {
    pub fs: &'a dyn FileSystem,
    pub packages: &'a dyn PackageInstaller,
    pub services: &'a dyn ServiceController,
    pub validator: &'a dyn ConfigValidator,
    pub credentials: &'a dyn CredentialWriter,
    pub input: &'a dyn InputSource,
}

/// Check if running as root (effective UID == 0)
///
/// Installing packages, writing under /etc/nginx and reloading the service
/// all need it, so the run is refused up front instead of failing halfway.
pub fn check_root() -> Result<()> {
    // SAFETY: geteuid() is a simple syscall that reads the effective user ID.
    // It has no preconditions, never fails, and doesn't modify any state.
    let euid = unsafe { libc::geteuid() };

    if euid != 0 {
        return Err(SetupError::NotRoot.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_root_matches_euid() {
        let is_root = unsafe { libc::geteuid() } == 0;
        let result = check_root();
        assert_eq!(result.is_ok(), is_root);
        if let Err(err) = result {
            assert!(matches!(err.downcast_ref::<SetupError>(), Some(SetupError::NotRoot)));
        }
    }
}
