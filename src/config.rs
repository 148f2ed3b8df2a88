//! Settings for nginx-setup.
//!
//! Every path, name and constant the tool writes into the generated
//! configuration comes from here. A settings file is optional; any section or
//! field it leaves out keeps its default.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::validation::validate_domain;

/// Default location of the settings file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/nginx-setup/config.yaml";

/// Main settings structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Main nginx.conf and the skeleton directives written into it
    pub nginx: NginxSettings,

    /// Default site identity and virtual host layout
    pub site: SiteSettings,

    /// HTTP basic auth location
    pub auth: AuthSettings,

    /// PAM auth location and module
    pub pam: PamSettings,

    /// CGI location and fcgiwrap service
    pub cgi: CgiSettings,

    /// Package names handed to the package manager
    pub packages: PackageSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NginxSettings {
    /// Configuration file that gets replaced
    pub config_path: PathBuf,
    /// nginx binary used for `-t`
    pub binary: String,
    /// Service unit reloaded after a successful test
    pub service: String,
    pub user: String,
    pub worker_processes: String,
    pub pid_file: PathBuf,
    /// Wildcard include for dropped-in `load_module` fragments
    pub modules_include: String,
    pub mime_types: PathBuf,
    pub worker_connections: u32,
    pub listen_port: u16,
    pub index_file: String,
}

impl Default for NginxSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/etc/nginx/nginx.conf"),
            binary: "nginx".to_string(),
            service: "nginx".to_string(),
            user: "www-data".to_string(),
            worker_processes: "auto".to_string(),
            pid_file: PathBuf::from("/run/nginx.pid"),
            modules_include: "/etc/nginx/modules-enabled/*.conf".to_string(),
            mime_types: PathBuf::from("/etc/nginx/mime.types"),
            worker_connections: 768,
            listen_port: 80,
            index_file: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub default_domain: String,
    pub default_root: PathBuf,
    /// Parent of per-domain document roots in virtual host mode
    pub www_base: PathBuf,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            default_domain: "localhost".to_string(),
            default_root: PathBuf::from("/var/www/default"),
            www_base: PathBuf::from("/var/www"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Credential file, recreated with a single user on every run
    pub htpasswd_file: PathBuf,
    pub htpasswd_binary: String,
    pub location: String,
    pub realm: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            htpasswd_file: PathBuf::from("/etc/nginx/.htpasswd"),
            htpasswd_binary: "htpasswd".to_string(),
            location: "/secure".to_string(),
            realm: "Restricted Area".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PamSettings {
    /// Dynamic module that must exist for the PAM location to be emitted
    pub module_path: PathBuf,
    /// Where the `load_module` directive is written
    pub load_fragment: PathBuf,
    pub location: String,
    pub realm: String,
    /// PAM service name (`/etc/pam.d/<name>`)
    pub service_name: String,
}

impl Default for PamSettings {
    fn default() -> Self {
        Self {
            module_path: PathBuf::from("/usr/lib/nginx/modules/ngx_http_auth_pam_module.so"),
            load_fragment: PathBuf::from("/etc/nginx/modules-enabled/50-mod-http-auth-pam.conf"),
            location: "/pam".to_string(),
            realm: "PAM Authentication".to_string(),
            service_name: "nginx".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgiSettings {
    pub location: String,
    /// Directory that `location` is resolved against
    pub script_root: PathBuf,
    pub socket: PathBuf,
    pub fastcgi_params: PathBuf,
    pub service: String,
}

impl Default for CgiSettings {
    fn default() -> Self {
        Self {
            location: "/cgi-bin/".to_string(),
            script_root: PathBuf::from("/usr/lib"),
            socket: PathBuf::from("/var/run/fcgiwrap.socket"),
            fastcgi_params: PathBuf::from("/etc/nginx/fastcgi_params"),
            service: "fcgiwrap".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageSettings {
    pub nginx: String,
    pub htpasswd: String,
    pub cgi: String,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            nginx: "nginx".to_string(),
            htpasswd: "apache2-utils".to_string(),
            cgi: "fcgiwrap".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;
        let settings = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path.as_ref()))?;

        Ok(settings)
    }

    /// Load from an explicit path, or from [`DEFAULT_CONFIG_PATH`] if it
    /// exists, or fall back to the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            debug!("No settings file at {}, using defaults", DEFAULT_CONFIG_PATH);
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate settings values
    pub fn validate(&self) -> Result<()> {
        let absolute = [
            ("nginx.config_path", &self.nginx.config_path),
            ("nginx.pid_file", &self.nginx.pid_file),
            ("site.default_root", &self.site.default_root),
            ("site.www_base", &self.site.www_base),
            ("auth.htpasswd_file", &self.auth.htpasswd_file),
            ("pam.module_path", &self.pam.module_path),
            ("pam.load_fragment", &self.pam.load_fragment),
            ("cgi.socket", &self.cgi.socket),
        ];
        for (name, path) in absolute {
            if !path.is_absolute() {
                anyhow::bail!("{} must be an absolute path: {}", name, path.display());
            }
        }

        if self.nginx.config_path.file_name().is_none() {
            anyhow::bail!(
                "nginx.config_path must name a file: {}",
                self.nginx.config_path.display()
            );
        }

        if self.nginx.listen_port == 0 {
            anyhow::bail!("nginx.listen_port must be between 1 and 65535");
        }

        if self.nginx.worker_connections == 0 {
            anyhow::bail!("nginx.worker_connections must be greater than 0");
        }

        if self.nginx.user.trim().is_empty() {
            anyhow::bail!("nginx.user cannot be empty");
        }

        let index = &self.nginx.index_file;
        if index.is_empty() || index.contains('/') || index.contains(char::is_whitespace) {
            anyhow::bail!("nginx.index_file must be a plain file name: '{}'", index);
        }

        for (name, location) in [
            ("auth.location", &self.auth.location),
            ("pam.location", &self.pam.location),
            ("cgi.location", &self.cgi.location),
        ] {
            if !location.starts_with('/') {
                anyhow::bail!("{} must start with '/': '{}'", name, location);
            }
        }

        for (name, realm) in [("auth.realm", &self.auth.realm), ("pam.realm", &self.pam.realm)] {
            if realm.contains('"') || realm.contains(char::is_control) {
                anyhow::bail!("{} cannot contain quotes or control characters", name);
            }
        }

        validate_domain(&self.site.default_domain).context("site.default_domain")?;

        Ok(())
    }
}
