//! Backup, write, test and reload of the nginx configuration.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::NginxSettings;
use crate::error::SetupError;
use crate::system::Host;
use crate::template::RenderedConfiguration;
use crate::utils::backup_path;

/// Knobs for [`deploy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOptions {
    /// Copy the backup back over the target when validation fails.
    pub restore_on_failure: bool,
}

/// What a successful deployment left on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub target: PathBuf,
    /// `None` when there was no previous configuration.
    pub backup: Option<PathBuf>,
}

/// Replace the nginx configuration with `rendered` and reload nginx.
///
/// Any existing file is copied to `<target>.bak.<timestamp>` first. If nginx
/// rejects the new file the service is not reloaded, so the running
/// configuration stays in effect; the broken file stays on disk unless
/// [`DeployOptions::restore_on_failure`] is set.
pub fn deploy<Tz>(
    rendered: &RenderedConfiguration,
    nginx: &NginxSettings,
    host: &Host,
    options: DeployOptions,
    taken_at: &DateTime<Tz>,
) -> Result<Deployment>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let target = &nginx.config_path;

    let backup = if host.fs.exists(target) {
        let backup = backup_path(target, taken_at);
        host.fs
            .copy(target, &backup)
            .with_context(|| format!("Failed to back up {}", target.display()))?;
        info!("Backed up {} to {}", target.display(), backup.display());
        Some(backup)
    } else {
        None
    };

    host.fs
        .write_atomic(target, rendered.as_bytes())
        .with_context(|| format!("Failed to write {}", target.display()))?;
    info!("Wrote {}", target.display());

    info!("Testing configuration...");
    let report = host
        .validator
        .validate(target)
        .context("Failed to run the configuration test")?;

    if !report.passed {
        error!("Configuration test failed, nginx was not reloaded");
        match (&backup, options.restore_on_failure) {
            (Some(backup), true) => {
                host.fs.copy(backup, target).with_context(|| {
                    format!("Failed to restore {} from {}", target.display(), backup.display())
                })?;
                warn!("Restored {} from {}", target.display(), backup.display());
            }
            (Some(backup), false) => {
                warn!(
                    "The previous configuration is saved at {}; restore it with: cp {} {}",
                    backup.display(),
                    backup.display(),
                    target.display()
                );
            }
            (None, _) => warn!("There was no previous configuration to restore"),
        }

        return Err(SetupError::ValidationFailed {
            path: target.clone(),
            output: report.output,
        }
        .into());
    }

    info!("Reloading {}...", nginx.service);
    host.services
        .reload(&nginx.service)
        .with_context(|| format!("Failed to reload {}", nginx.service))?;

    Ok(Deployment {
        target: target.clone(),
        backup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::docroot::SiteIdentity;
    use crate::fragments::Fragments;
    use crate::fs_abstraction::RealFileSystem;
    use crate::prompt::MockInputSource;
    use crate::system::{
        MockConfigValidator, MockCredentialWriter, MockPackageInstaller, MockServiceController,
        ValidationReport,
    };
    use crate::template::assemble;
    use chrono::Utc;
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        nginx: NginxSettings,
        rendered: RenderedConfiguration,
        validator: MockConfigValidator,
        services: MockServiceController,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let mut nginx = Settings::default().nginx;
            nginx.config_path = dir.path().join("nginx.conf");

            let site = SiteIdentity::default_site(&Settings::default().site);
            let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
            let rendered = assemble(&site, &Fragments::default(), &nginx, &at).unwrap();

            Self {
                _dir: dir,
                nginx,
                rendered,
                validator: MockConfigValidator::new(),
                services: MockServiceController::new(),
            }
        }

        fn validator_says(&mut self, passed: bool) {
            let expected = self.nginx.config_path.clone();
            self.validator
                .expect_validate()
                .withf(move |p| p == expected)
                .times(1)
                .returning(move |_| {
                    Ok(ValidationReport {
                        passed,
                        output: if passed {
                            "test is successful".to_string()
                        } else {
                            "nginx: [emerg] unexpected end of file".to_string()
                        },
                    })
                });
        }

        fn run(&self, options: DeployOptions) -> Result<Deployment> {
            let packages = MockPackageInstaller::new();
            let credentials = MockCredentialWriter::new();
            let input = MockInputSource::new();
            let host = Host {
                fs: &RealFileSystem,
                packages: &packages,
                services: &self.services,
                validator: &self.validator,
                credentials: &credentials,
                input: &input,
            };
            let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
            deploy(&self.rendered, &self.nginx, &host, options, &at)
        }

        fn target(&self) -> &Path {
            &self.nginx.config_path
        }

        fn expected_backup(&self) -> PathBuf {
            PathBuf::from(format!("{}.bak.20240102030405", self.target().display()))
        }
    }

    #[test]
    fn test_first_deploy_has_no_backup() {
        let mut fx = Fixture::new();
        fx.validator_says(true);
        fx.services
            .expect_reload()
            .withf(|u| u == "nginx")
            .times(1)
            .returning(|_| Ok(()));

        let deployment = fx.run(DeployOptions::default()).unwrap();

        assert_eq!(deployment.backup, None);
        assert_eq!(std::fs::read_to_string(fx.target()).unwrap(), fx.rendered.as_str());
    }

    #[test]
    fn test_existing_config_is_backed_up() {
        let mut fx = Fixture::new();
        std::fs::write(fx.target(), "# previous config\n").unwrap();
        fx.validator_says(true);
        fx.services.expect_reload().times(1).returning(|_| Ok(()));

        let deployment = fx.run(DeployOptions::default()).unwrap();

        let backup = deployment.backup.unwrap();
        assert_eq!(backup, fx.expected_backup());
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "# previous config\n");
        assert_eq!(std::fs::read_to_string(fx.target()).unwrap(), fx.rendered.as_str());
    }

    #[test]
    fn test_validation_failure_does_not_reload() {
        let mut fx = Fixture::new();
        std::fs::write(fx.target(), "# previous config\n").unwrap();
        fx.validator_says(false);
        fx.services.expect_reload().times(0);

        let err = fx.run(DeployOptions::default()).unwrap_err();

        match err.downcast_ref::<SetupError>() {
            Some(SetupError::ValidationFailed { path, output }) => {
                assert_eq!(path, fx.target());
                assert!(output.contains("unexpected end of file"));
            }
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
        // The new (rejected) file stays in place, the backup is intact
        assert_eq!(std::fs::read_to_string(fx.target()).unwrap(), fx.rendered.as_str());
        assert_eq!(
            std::fs::read_to_string(fx.expected_backup()).unwrap(),
            "# previous config\n"
        );
    }

    #[test]
    fn test_validation_failure_with_restore() {
        let mut fx = Fixture::new();
        std::fs::write(fx.target(), "# previous config\n").unwrap();
        fx.validator_says(false);
        fx.services.expect_reload().times(0);

        let result = fx.run(DeployOptions {
            restore_on_failure: true,
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(fx.target()).unwrap(), "# previous config\n");
    }

    #[test]
    fn test_restore_without_backup_leaves_new_file() {
        let mut fx = Fixture::new();
        fx.validator_says(false);
        fx.services.expect_reload().times(0);

        let result = fx.run(DeployOptions {
            restore_on_failure: true,
        });

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(fx.target()).unwrap(), fx.rendered.as_str());
    }

    #[test]
    fn test_reload_failure_is_reported() {
        let mut fx = Fixture::new();
        fx.validator_says(true);
        fx.services
            .expect_reload()
            .returning(|_| Err(anyhow::anyhow!("nginx.service is not active")));

        let err = fx.run(DeployOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Failed to reload nginx");
    }

    #[test]
    fn test_validator_not_runnable_is_fatal() {
        let mut fx = Fixture::new();
        fx.validator
            .expect_validate()
            .returning(|_| Err(anyhow::anyhow!("Failed to execute nginx")));
        fx.services.expect_reload().times(0);

        assert!(fx.run(DeployOptions::default()).is_err());
    }
}
