//! Per-feature `location` blocks.
//!
//! The `*_block` functions only format text and are tested on their own.
//! [`build`] runs the side effects a feature needs (packages, credentials,
//! the PAM `load_module` drop-in) and collects the blocks for the assembler.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::FeatureFlags;
use crate::config::{AuthSettings, CgiSettings, PamSettings, Settings};
use crate::error::SetupError;
use crate::installer::{ensure_package, ensure_service};
use crate::system::Host;
use crate::validation::validate_username;

/// A feature that contributes a block to the server configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    UserDir,
    Auth,
    AuthPam,
    Cgi,
}

impl Feature {
    /// Order in which blocks appear in the server block, whatever the order
    /// of the command-line flags.
    pub const ORDER: [Feature; 4] = [Feature::UserDir, Feature::Auth, Feature::AuthPam, Feature::Cgi];

    pub fn name(self) -> &'static str {
        match self {
            Feature::UserDir => "user-dir",
            Feature::Auth => "auth",
            Feature::AuthPam => "auth-pam",
            Feature::Cgi => "cgi",
        }
    }
}

/// One block per feature; an empty string means "nothing to add".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    pub user_dir: String,
    pub auth: String,
    pub auth_pam: String,
    pub cgi: String,
}

impl Fragments {
    pub fn get(&self, feature: Feature) -> &str {
        match feature {
            Feature::UserDir => &self.user_dir,
            Feature::Auth => &self.auth,
            Feature::AuthPam => &self.auth_pam,
            Feature::Cgi => &self.cgi,
        }
    }

    /// Non-empty blocks in [`Feature::ORDER`].
    pub fn ordered(&self) -> impl Iterator<Item = (Feature, &str)> {
        Feature::ORDER
            .into_iter()
            .map(move |feature| (feature, self.get(feature)))
            .filter(|(_, block)| !block.is_empty())
    }
}

/// `/~user/path` served from `/home/user/public_html/path`.
pub fn user_dir_block() -> String {
    r#"location ~ ^/~(?<user>[^/]+)(?<path>/.*)?$ {
    alias /home/$user/public_html$path;
    index index.html index.htm;
    autoindex on;
}"#
    .to_string()
}

pub fn auth_block(auth: &AuthSettings) -> String {
    format!(
        r#"location {location} {{
    auth_basic "{realm}";
    auth_basic_user_file {file};
}}"#,
        location = auth.location,
        realm = auth.realm,
        file = auth.htpasswd_file.display(),
    )
}

pub fn pam_block(pam: &PamSettings) -> String {
    format!(
        r#"location {location} {{
    auth_pam "{realm}";
    auth_pam_service_name "{service}";
}}"#,
        location = pam.location,
        realm = pam.realm,
        service = pam.service_name,
    )
}

pub fn cgi_block(cgi: &CgiSettings) -> String {
    format!(
        r#"location {location} {{
    gzip off;
    root {root};
    fastcgi_pass unix:{socket};
    include {params};
    fastcgi_param SCRIPT_FILENAME $document_root$fastcgi_script_name;
}}"#,
        location = cgi.location,
        root = cgi.script_root.display(),
        socket = cgi.socket.display(),
        params = cgi.fastcgi_params.display(),
    )
}

/// Content of the PAM module drop-in file.
pub fn pam_load_directive(pam: &PamSettings) -> String {
    format!("load_module {};\n", pam.module_path.display())
}

/// Produce the block for every enabled feature, running its side effects.
pub fn build(features: &FeatureFlags, settings: &Settings, host: &Host) -> Result<Fragments> {
    let mut fragments = Fragments::default();

    if features.user_dir {
        fragments.user_dir = user_dir_block();
    }
    if features.auth {
        fragments.auth = build_auth(settings, host)?;
    }
    if features.auth_pam {
        fragments.auth_pam = build_pam(&settings.pam, host)?;
    }
    if features.cgi {
        fragments.cgi = build_cgi(settings, host)?;
    }

    Ok(fragments)
}

fn build_auth(settings: &Settings, host: &Host) -> Result<String> {
    ensure_package(host.packages, &settings.packages.htpasswd)?;

    let username = host.input.read_line("Enter username for basic auth: ")?;
    let username = username.trim();
    validate_username(username)?;

    let password = host.input.read_secret("Enter password: ")?;
    if password.is_empty() {
        return Err(SetupError::InvalidInput("password cannot be empty".to_string()).into());
    }

    info!(
        "Writing credentials for '{}' to {}",
        username,
        settings.auth.htpasswd_file.display()
    );
    host.credentials
        .write_single_user(&settings.auth.htpasswd_file, username, &password)
        .context("Failed to write credential file")?;

    Ok(auth_block(&settings.auth))
}

fn build_pam(pam: &PamSettings, host: &Host) -> Result<String> {
    if !host.fs.exists(&pam.module_path) {
        warn!(
            "PAM module not found at {}, skipping auth-pam",
            pam.module_path.display()
        );
        return Ok(String::new());
    }

    if let Some(parent) = pam.load_fragment.parent() {
        host.fs
            .create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    host.fs
        .write(&pam.load_fragment, pam_load_directive(pam).as_bytes())
        .with_context(|| format!("Failed to write {}", pam.load_fragment.display()))?;
    info!("Enabled PAM module in {}", pam.load_fragment.display());

    Ok(pam_block(pam))
}

fn build_cgi(settings: &Settings, host: &Host) -> Result<String> {
    ensure_service(
        host.packages,
        host.services,
        &settings.packages.cgi,
        &settings.cgi.service,
    )?;

    Ok(cgi_block(&settings.cgi))
}
