use anyhow::{bail, Context, Result};
use keyring::Entry;

use crate::config::Config;

const SERVICE_NAME: &str = "futsal-dash";

/// Keychain slot for the tournament admin's password.
///
/// Only the configured admin account is ever stored; other sign-ins are
/// never remembered.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    account: String,
}

impl CredentialStore {
    pub fn for_admin(config: &Config) -> Self {
        Self {
            account: config.admin_email.trim().to_string(),
        }
    }

    /// The address the password is stored under.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Whether `email` is the account this store holds.
    pub fn holds(&self, email: &str) -> bool {
        !self.account.is_empty() && self.account == email
    }

    fn entry(&self) -> Result<Entry> {
        if self.account.is_empty() {
            bail!("No admin account configured");
        }
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }

    /// Store the admin password in the OS keychain
    pub fn save(&self, password: &str) -> Result<()> {
        if password.is_empty() {
            bail!("Refusing to store an empty password");
        }
        self.entry()?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    /// The stored password, or `None` when nothing is saved.
    pub fn password(&self) -> Result<Option<String>> {
        match self.entry()?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve password from keychain"),
        }
    }

    /// Remove the stored password. Returns whether one was there.
    pub fn forget(&self) -> Result<bool> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(e) => Err(e).context("Failed to delete credential from keychain"),
        }
    }
}
