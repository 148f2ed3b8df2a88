//! The full run: dependencies, document root, feature blocks, assembly and
//! deployment, in that order.

use anyhow::Result;
use chrono::Local;
use tracing::info;

use crate::cli::FeatureFlags;
use crate::config::Settings;
use crate::deploy::{self, DeployOptions, Deployment};
use crate::docroot::{self, SiteIdentity};
use crate::fragments;
use crate::installer::ensure_package;
use crate::system::Host;
use crate::template;

/// What to do in this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Request {
    pub features: FeatureFlags,
    pub deploy: DeployOptions,
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub site: SiteIdentity,
    pub deployment: Deployment,
}

/// Configure, write and reload nginx according to `request`.
pub fn run(request: &Request, settings: &Settings, host: &Host) -> Result<Summary> {
    let features = &request.features;

    if features.check_nginx {
        info!("Checking for {}...", settings.packages.nginx);
        ensure_package(host.packages, &settings.packages.nginx)?;
    }

    let site = docroot::resolve_site(features.virtual_host, host.input, &settings.site)?;
    info!("Configuring {} (root {})", site.domain, site.root.display());
    docroot::provision(host.fs, &site, &settings.nginx.index_file)?;

    let fragments = fragments::build(features, settings, host)?;

    let now = Local::now();
    let rendered = template::assemble(&site, &fragments, &settings.nginx, &now)?;

    let deployment = deploy::deploy(&rendered, &settings.nginx, host, request.deploy, &now)?;

    Ok(Summary { site, deployment })
}
