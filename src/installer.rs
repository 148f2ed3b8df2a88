//! Installation of the packages a feature depends on.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::system::{PackageInstaller, ServiceController};

/// Install `package` unless it is already present.
pub fn ensure_package(packages: &dyn PackageInstaller, package: &str) -> Result<()> {
    if packages
        .is_installed(package)
        .with_context(|| format!("Failed to query package state of {}", package))?
    {
        debug!("{} is already installed", package);
        return Ok(());
    }

    info!("{} not found, installing...", package);
    packages
        .refresh_index()
        .context("Failed to refresh package index")?;
    packages
        .install(package)
        .with_context(|| format!("Failed to install {}", package))?;

    info!("Installed {}", package);
    Ok(())
}

/// Install `package` if needed, then enable and start `unit`.
pub fn ensure_service(
    packages: &dyn PackageInstaller,
    services: &dyn ServiceController,
    package: &str,
    unit: &str,
) -> Result<()> {
    ensure_package(packages, package)?;

    info!("Enabling and starting {}...", unit);
    services
        .enable(unit)
        .with_context(|| format!("Failed to enable {}", unit))?;
    services
        .start(unit)
        .with_context(|| format!("Failed to start {}", unit))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{MockPackageInstaller, MockServiceController};
    use mockall::Sequence;

    #[test]
    fn test_installed_package_is_left_alone() {
        let mut packages = MockPackageInstaller::new();
        packages
            .expect_is_installed()
            .withf(|p| p == "nginx")
            .times(1)
            .returning(|_| Ok(true));
        packages.expect_refresh_index().times(0);
        packages.expect_install().times(0);

        ensure_package(&packages, "nginx").unwrap();
    }

    #[test]
    fn test_missing_package_is_installed_after_refresh() {
        let mut packages = MockPackageInstaller::new();
        let mut seq = Sequence::new();

        packages
            .expect_is_installed()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(false));
        packages
            .expect_refresh_index()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        packages
            .expect_install()
            .withf(|p| p == "apache2-utils")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        ensure_package(&packages, "apache2-utils").unwrap();
    }

    #[test]
    fn test_install_failure_is_fatal() {
        let mut packages = MockPackageInstaller::new();
        packages.expect_is_installed().returning(|_| Ok(false));
        packages.expect_refresh_index().returning(|| Ok(()));
        packages
            .expect_install()
            .returning(|_| Err(anyhow::anyhow!("apt-get install nginx failed: exit code 100")));

        let err = ensure_package(&packages, "nginx").unwrap_err();
        assert_eq!(err.to_string(), "Failed to install nginx");
        assert!(format!("{:#}", err).contains("exit code 100"));
    }

    #[test]
    fn test_refresh_failure_skips_install() {
        let mut packages = MockPackageInstaller::new();
        packages.expect_is_installed().returning(|_| Ok(false));
        packages
            .expect_refresh_index()
            .returning(|| Err(anyhow::anyhow!("network unreachable")));
        packages.expect_install().times(0);

        assert!(ensure_package(&packages, "nginx").is_err());
    }

    #[test]
    fn test_ensure_service_enables_then_starts() {
        let mut packages = MockPackageInstaller::new();
        packages.expect_is_installed().returning(|_| Ok(true));

        let mut services = MockServiceController::new();
        let mut seq = Sequence::new();
        services
            .expect_enable()
            .withf(|u| u == "fcgiwrap")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        services
            .expect_start()
            .withf(|u| u == "fcgiwrap")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        ensure_service(&packages, &services, "fcgiwrap", "fcgiwrap").unwrap();
    }

    #[test]
    fn test_ensure_service_stops_on_package_failure() {
        let mut packages = MockPackageInstaller::new();
        packages
            .expect_is_installed()
            .returning(|_| Err(anyhow::anyhow!("dpkg lock held")));

        let mut services = MockServiceController::new();
        services.expect_enable().times(0);
        services.expect_start().times(0);

        assert!(ensure_service(&packages, &services, "fcgiwrap", "fcgiwrap").is_err());
    }
}
