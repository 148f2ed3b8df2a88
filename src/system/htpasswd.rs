//! Basic auth credential file maintenance with `htpasswd`.

use anyhow::Result;
use std::path::Path;

#[cfg(test)]
use mockall::automock;

use crate::cmd_abstraction::{CommandExecutor, RealCommandExecutor};
use crate::prompt::SecureString;

/// Writes the credential file read by `auth_basic_user_file`.
#[cfg_attr(test, automock)]
pub trait CredentialWriter {
    /// Create `file`, or replace it if it exists, holding only `username`.
    fn write_single_user(&self, file: &Path, username: &str, password: &SecureString)
        -> Result<()>;
}

/// [`CredentialWriter`] running `htpasswd -i -c`. The password travels over
/// stdin so it never shows up in the process list.
#[derive(Debug, Clone)]
pub struct Htpasswd<E: CommandExecutor = RealCommandExecutor> {
    exec: E,
    binary: String,
}

impl<E: CommandExecutor> Htpasswd<E> {
    pub fn new(exec: E, binary: impl Into<String>) -> Self {
        Self {
            exec,
            binary: binary.into(),
        }
    }
}

impl<E: CommandExecutor> CredentialWriter for Htpasswd<E> {
    fn write_single_user(
        &self,
        file: &Path,
        username: &str,
        password: &SecureString,
    ) -> Result<()> {
        let args = vec![
            "-i".to_string(),
            "-c".to_string(),
            file.display().to_string(),
            username.to_string(),
        ];
        self.exec
            .execute_with_stdin(&self.binary, &args, password.as_str())?
            .check(&self.binary)?;
        Ok(())
    }
}
