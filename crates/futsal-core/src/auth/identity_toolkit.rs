//! Email/password sign-in against a hosted identity REST service.
//!
//! Sign-in is `POST {endpoint}/v1/accounts:signInWithPassword?key={api_key}`.
//! Sign-out is local: the session is dropped and watchers are notified.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::IdentityConfig;

use super::{AuthError, AuthProvider, Identity, Session};

/// Token lifetime assumed when the service omits `expiresIn`.
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
    id_token: String,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

pub struct IdentityToolkitProvider {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    session: Mutex<Session>,
    state: watch::Sender<Option<Identity>>,
}

impl IdentityToolkitProvider {
    pub fn new(config: &IdentityConfig, timeout: Duration) -> Result<Self, AuthError> {
        let client = Client::builder().timeout(timeout).build()?;
        let (state, _) = watch::channel(None);

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            session: Mutex::new(Session::ephemeral()),
            state,
        })
    }

    /// Use `session` for persistence, restoring its identity if still valid.
    pub fn with_session(self, mut session: Session) -> Self {
        match session.load() {
            Ok(true) => info!("Restored saved session"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Failed to load saved session"),
        }
        let restored = session.data.clone().filter(|d| !d.is_expired(Utc::now()));
        self.state.send_replace(restored);
        *self.session() = session;
        self
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sign_in_url(&self) -> String {
        format!("{}/v1/accounts:signInWithPassword", self.endpoint)
    }

    async fn error_from(response: reqwest::Response) -> AuthError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.chars().take(200).collect());

        if status == reqwest::StatusCode::BAD_REQUEST {
            AuthError::InvalidCredentials(message)
        } else {
            AuthError::InvalidResponse(format!("Status {}: {}", status, message))
        }
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitProvider {
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let api_key = self.api_key.as_deref().ok_or(AuthError::MissingApiKey)?;

        let response = self
            .client
            .post(self.sign_in_url())
            .query(&[("key", api_key)])
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            warn!(error = %err, "Sign-in rejected");
            return Err(err);
        }

        let body: SignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::InvalidResponse(format!("Failed to parse sign-in response: {}", e)))?;

        let lifetime = body
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        let identity = Identity {
            uid: body.local_id,
            email: body.email.or_else(|| Some(email.to_string())),
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        };

        {
            let mut session = self.session();
            session.update(identity.clone());
            if let Err(e) = session.save() {
                warn!(error = %e, "Failed to save session");
            }
        }
        self.state.send_replace(Some(identity.clone()));

        info!(email = ?identity.email, "Signed in");
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        if let Err(e) = self.session().clear() {
            warn!(error = %e, "Failed to remove session file");
        }
        self.state.send_replace(None);
        info!("Signed out");
        Ok(())
    }

    fn current_user(&self) -> Option<Identity> {
        self.state
            .borrow()
            .clone()
            .filter(|identity| !identity.is_expired(Utc::now()))
    }

    fn on_auth_state_changed(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer, api_key: Option<&str>) -> IdentityToolkitProvider {
        let config = IdentityConfig {
            endpoint: server.uri(),
            api_key: api_key.map(str::to_string),
        };
        IdentityToolkitProvider::new(&config, Duration::from_secs(5)).unwrap()
    }

    async fn mount_success(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "email": "admin@ice.com",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "localId": "uid-42",
                "email": "admin@ice.com",
                "idToken": "id-token",
                "refreshToken": "refresh-token",
                "expiresIn": "3600"
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_sign_in_success_notifies_watchers() {
        let server = MockServer::start().await;
        mount_success(&server).await;

        let provider = provider_for(&server, Some("test-key"));
        let mut rx = provider.on_auth_state_changed();
        assert!(rx.borrow().is_none());

        let identity = provider
            .sign_in_with_email_and_password("admin@ice.com", "secret")
            .await
            .unwrap();
        assert_eq!(identity.uid, "uid-42");
        assert_eq!(identity.email.as_deref(), Some("admin@ice.com"));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref(), Some(&identity));
        assert_eq!(provider.current_user(), Some(identity));
    }

    #[tokio::test]
    async fn test_invalid_password_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server, Some("test-key"));
        let err = provider
            .sign_in_with_email_and_password("admin@ice.com", "wrong")
            .await
            .unwrap_err();
        match err {
            AuthError::InvalidCredentials(msg) => assert_eq!(msg, "INVALID_LOGIN_CREDENTIALS"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(provider.current_user().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_sends_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let provider = provider_for(&server, None);
        let err = provider
            .sign_in_with_email_and_password("admin@ice.com", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingApiKey));
    }

    #[tokio::test]
    async fn test_sign_out_clears_identity_and_session_file() {
        let server = MockServer::start().await;
        mount_success(&server).await;
        let dir = tempfile::tempdir().unwrap();

        let provider = provider_for(&server, Some("test-key"))
            .with_session(Session::new(dir.path().to_path_buf()));
        provider
            .sign_in_with_email_and_password("admin@ice.com", "secret")
            .await
            .unwrap();
        assert!(dir.path().join("session.json").exists());

        let rx = provider.on_auth_state_changed();
        provider.sign_out().await.unwrap();
        assert!(rx.borrow().is_none());
        assert!(provider.current_user().is_none());
        assert!(!dir.path().join("session.json").exists());
    }

    #[tokio::test]
    async fn test_session_restored_on_startup() {
        let server = MockServer::start().await;
        mount_success(&server).await;
        let dir = tempfile::tempdir().unwrap();

        provider_for(&server, Some("test-key"))
            .with_session(Session::new(dir.path().to_path_buf()))
            .sign_in_with_email_and_password("admin@ice.com", "secret")
            .await
            .unwrap();

        let restored = provider_for(&server, Some("test-key"))
            .with_session(Session::new(dir.path().to_path_buf()));
        let user = restored.current_user().unwrap();
        assert_eq!(user.email.as_deref(), Some("admin@ice.com"));
        assert!(restored.on_auth_state_changed().borrow().is_some());
    }
}
