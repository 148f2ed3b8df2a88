//! Validation of operator input that ends up in nginx.conf or on disk.
//!
//! Domains become a `server_name` value and a directory name under the web
//! root, usernames become an htpasswd entry. Both are checked before use.

use anyhow::Result;

use crate::error::SetupError;

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const MAX_USERNAME_LEN: usize = 255;

fn invalid(message: String) -> anyhow::Error {
    SetupError::InvalidInput(message).into()
}

/// Validate a domain name (RFC 1123 hostname).
///
/// # Examples
/// ```
/// use nginx_setup::validation::validate_domain;
/// assert!(validate_domain("example.com").is_ok());
/// assert!(validate_domain("localhost").is_ok());
/// assert!(validate_domain("../etc").is_err());
/// ```
pub fn validate_domain(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(invalid("domain cannot be empty".to_string()));
    }

    // Reject non-ASCII up front so byte lengths equal char counts
    if !domain.is_ascii() {
        return Err(invalid(format!(
            "domain '{}' must be ASCII (use the punycode form for IDNs)",
            domain
        )));
    }

    if domain.len() > MAX_DOMAIN_LEN {
        return Err(invalid(format!(
            "domain is longer than {} characters",
            MAX_DOMAIN_LEN
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(invalid(format!("domain '{}' has an empty label", domain)));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(invalid(format!(
                "domain '{}' has a label longer than {} characters",
                domain, MAX_LABEL_LEN
            )));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid(format!(
                "domain '{}' has a label starting or ending with '-'",
                domain
            )));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(invalid(format!(
                "domain '{}' may only contain letters, digits, '-' and '.'",
                domain
            )));
        }
    }

    Ok(())
}

/// Validate an htpasswd username.
///
/// # Examples
/// ```
/// use nginx_setup::validation::validate_username;
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("bad:name").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(invalid("username cannot be empty".to_string()));
    }

    if username.len() > MAX_USERNAME_LEN {
        return Err(invalid(format!(
            "username is longer than {} bytes",
            MAX_USERNAME_LEN
        )));
    }

    // ':' separates user from hash in the credential file
    if username.contains(':') {
        return Err(invalid("username cannot contain ':'".to_string()));
    }

    if username
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(invalid(
            "username cannot contain whitespace or control characters".to_string(),
        ));
    }

    Ok(())
}
