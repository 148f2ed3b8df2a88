//! Site identity and document root provisioning.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::SiteSettings;
use crate::fs_abstraction::FileSystem;
use crate::prompt::InputSource;
use crate::template::render_placeholder;
use crate::validation::validate_domain;

/// The domain being served and the directory it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteIdentity {
    pub domain: String,
    pub root: PathBuf,
}

impl SiteIdentity {
    /// The identity used without `--virtual-host`.
    pub fn default_site(site: &SiteSettings) -> Self {
        Self {
            domain: site.default_domain.clone(),
            root: site.default_root.clone(),
        }
    }

    /// A virtual host rooted at `<www_base>/<domain>`. `domain` must already
    /// be validated.
    pub fn for_domain(domain: &str, site: &SiteSettings) -> Self {
        Self {
            domain: domain.to_string(),
            root: site.www_base.join(domain),
        }
    }
}

/// Decide which site this run configures.
///
/// In virtual host mode the operator is asked for a domain; an empty answer
/// falls back to the default site instead of failing.
pub fn resolve_site(
    virtual_host: bool,
    input: &dyn InputSource,
    site: &SiteSettings,
) -> Result<SiteIdentity> {
    if !virtual_host {
        return Ok(SiteIdentity::default_site(site));
    }

    let answer = input.read_line("Enter domain name (e.g. example.com): ")?;
    let domain = answer.trim();

    if domain.is_empty() {
        warn!(
            "No domain entered, falling back to {} ({})",
            site.default_domain,
            site.default_root.display()
        );
        return Ok(SiteIdentity::default_site(site));
    }

    validate_domain(domain)?;
    Ok(SiteIdentity::for_domain(domain, site))
}

/// Make sure the document root exists and holds an index page.
///
/// An existing index page is never touched. Returns the index page path.
pub fn provision(fs: &dyn FileSystem, site: &SiteIdentity, index_file: &str) -> Result<PathBuf> {
    if !fs.exists(&site.root) {
        info!("Creating document root {}", site.root.display());
    }
    fs.create_dir_all(&site.root)
        .with_context(|| format!("Failed to create document root {}", site.root.display()))?;

    let index = site.root.join(index_file);
    if fs.exists(&index) {
        debug!("Keeping existing {}", index.display());
        return Ok(index);
    }

    info!("Writing placeholder {}", index.display());
    let page = render_placeholder(&site.domain)?;
    fs.write(&index, page.as_bytes())
        .with_context(|| format!("Failed to write {}", index.display()))?;

    Ok(index)
}
