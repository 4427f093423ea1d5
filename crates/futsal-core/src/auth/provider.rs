use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;

/// A signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_minutes().max(0)
    }
}

/// Whether `identity` is the configured administrator.
///
/// Exact, case-sensitive comparison of the email field.
pub fn is_admin(identity: Option<&Identity>, admin_email: &str) -> bool {
    identity
        .and_then(|i| i.email.as_deref())
        .is_some_and(|email| email == admin_email)
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("No identity provider API key configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// Message suitable for showing next to the login prompt.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials(_) => "Invalid email or password".to_string(),
            AuthError::MissingApiKey => {
                "Sign-in is not configured (set FUTSAL_IDENTITY_API_KEY)".to_string()
            }
            AuthError::Transport(e) if e.is_timeout() => {
                "Connection timed out. Please try again.".to_string()
            }
            AuthError::Transport(_) => {
                "Unable to connect to server. Check your internet connection.".to_string()
            }
            AuthError::InvalidResponse(msg) => format!("Login failed: {}", msg),
        }
    }
}

/// Identity interface consumed by the dashboard.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    /// The current identity, if signed in with an unexpired token.
    fn current_user(&self) -> Option<Identity>;

    /// Watch identity changes. The receiver starts out holding the current
    /// identity, the way an auth-state listener is called once on attach.
    fn on_auth_state_changed(&self) -> watch::Receiver<Option<Identity>>;
}
