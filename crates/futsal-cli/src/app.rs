use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use futsal_core::auth::{
    is_admin, AuthProvider, CredentialStore, Identity, IdentityToolkitProvider, Session,
};
use futsal_core::cache::CacheManager;
use futsal_core::sync::{DataSyncController, MutationGateway};
use futsal_core::{ApiClient, Config};
use tracing::{info, warn};

/// Environment variable consulted for the admin password before prompting.
const PASSWORD_ENV: &str = "FUTSAL_ADMIN_PASSWORD";

/// Everything a command needs: configuration, data sync and identity.
pub struct App {
    pub config: Config,
    pub sync: Arc<DataSyncController>,
    pub auth: IdentityToolkitProvider,
    credentials: CredentialStore,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = Config::cache_dir()?;
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let cache = CacheManager::persistent(cache_dir.clone(), config.cache_ttl())?;
        let api = ApiClient::from_config(&config)?;
        let sync = Arc::new(DataSyncController::new(api, cache, config.retry.clone()));

        let auth = IdentityToolkitProvider::new(&config.identity, timeout)?
            .with_session(Session::new(cache_dir));

        let credentials = CredentialStore::for_admin(&config);

        Ok(Self {
            config,
            sync,
            auth,
            credentials,
        })
    }

    pub fn is_admin(&self) -> bool {
        is_admin(self.auth.current_user().as_ref(), &self.config.admin_email)
    }

    /// A gateway that writes with the admin's token.
    ///
    /// Fails unless the signed-in identity is the configured admin.
    pub fn admin_gateway(&self) -> Result<MutationGateway> {
        let identity = self.auth.current_user();
        match identity {
            Some(ref user) if is_admin(identity.as_ref(), &self.config.admin_email) => {
                let api = self.sync.api().with_token(user.id_token.clone());
                Ok(MutationGateway::with_client(api, Arc::clone(&self.sync)))
            }
            Some(ref user) => bail!(
                "{} is not the tournament admin",
                user.email.as_deref().unwrap_or(&user.uid)
            ),
            None => bail!("Not signed in. Run `futsal login` first."),
        }
    }

    /// Sign in, taking the password from the environment, the keychain or
    /// a prompt, in that order.
    pub async fn login(&self, email: &str, remember: bool) -> Result<Identity> {
        let (password, from_keychain) = self.password_for(email)?;
        if password.is_empty() {
            bail!("Email and password required");
        }

        println!("Authenticating...");
        let identity = match self.auth.sign_in_with_email_and_password(email, &password).await {
            Ok(identity) => identity,
            Err(e) => bail!("{}", e.user_message()),
        };

        if remember && !from_keychain {
            if !self.credentials.holds(email) {
                warn!(email, "Only the admin password can be remembered");
            } else if let Err(e) = self.credentials.save(&password) {
                warn!(error = %e, "Failed to store credentials");
            }
        }

        info!(email, "Login successful");
        Ok(identity)
    }

    pub async fn logout(&self, forget: bool) -> Result<()> {
        self.auth.sign_out().await?;

        if forget && self.credentials.forget()? {
            info!(account = self.credentials.account(), "Forgot stored password");
        }
        Ok(())
    }

    fn password_for(&self, email: &str) -> Result<(String, bool)> {
        if let Ok(password) = std::env::var(PASSWORD_ENV) {
            if !password.is_empty() {
                return Ok((password, false));
            }
        }

        let stored = if self.credentials.holds(email) {
            self.credentials.password().unwrap_or_else(|e| {
                warn!(error = %e, "Could not read the keychain");
                None
            })
        } else {
            None
        };

        if let Some(stored) = stored {
            print!("Use stored password? [Y/n]: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if input.trim().to_lowercase() != "n" {
                return Ok((stored, true));
            }
        }

        Ok((rpassword::prompt_password("Password: ")?, false))
    }
}
