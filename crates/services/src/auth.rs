//! Signed-in state owned by the application shell.
//!
//! The profile and bearer token live in the key-value store under `user` and
//! `access_token`. `AuthSession` mirrors them in memory, keeps the API client's
//! bearer credential in sync, and is passed by reference to whatever needs the
//! current user.

use std::sync::Arc;

use serde_json::{Map, Value};
use storage::KeyValueStore;
use tracing::{debug, info, warn};

use quiz_core::model::{AccessToken, Credentials, User};

use crate::api::QuizApi;
use crate::error::AuthError;

pub const USER_KEY: &str = "user";
pub const TOKEN_KEY: &str = "access_token";

pub struct AuthSession {
    kv: Arc<dyn KeyValueStore>,
    api: Arc<dyn QuizApi>,
    user: Option<User>,
    token: Option<AccessToken>,
}

impl AuthSession {
    /// Restore whatever session is persisted locally.
    pub async fn init(kv: Arc<dyn KeyValueStore>, api: Arc<dyn QuizApi>) -> Self {
        let mut session = Self {
            kv,
            api,
            user: None,
            token: None,
        };
        session.refresh().await;
        session
    }

    /// Re-read the persisted profile and token.
    ///
    /// Unreadable or corrupt entries leave the session signed out.
    pub async fn refresh(&mut self) -> Option<&User> {
        self.user = match self.kv.get(USER_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .inspect_err(|err| warn!(error = %err, "stored user profile is corrupt"))
                .ok(),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "failed to read stored user profile");
                None
            }
        };
        self.token = match self.kv.get(TOKEN_KEY).await {
            Ok(raw) => raw.map(AccessToken::new),
            Err(err) => {
                warn!(error = %err, "failed to read stored access token");
                None
            }
        };
        self.api.set_access_token(self.token.clone());
        self.user.as_ref()
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// Authenticate and persist the resulting profile and token.
    ///
    /// The stored profile is the server's `user` object with the login email
    /// filled in when the server omits it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` before any request when a field
    /// is blank, `AuthError::MissingToken` when the server answers without a
    /// token, and `AuthError::Remote` for API failures.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<&User, AuthError> {
        if !credentials.is_complete() {
            return Err(AuthError::MissingCredentials);
        }

        let response = self.api.login(credentials).await?;
        let token = response.access_token.ok_or(AuthError::MissingToken)?;

        let mut profile = match response.user {
            Some(Value::Object(map)) => map,
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                return Err(AuthError::InvalidProfile(format!(
                    "expected an object, got {other}"
                )));
            }
        };
        profile
            .entry("email")
            .or_insert_with(|| Value::String(credentials.email.clone()));
        let user: User = serde_json::from_value(Value::Object(profile))
            .map_err(|err| AuthError::InvalidProfile(err.to_string()))?;

        self.persist(&user, &token).await;
        self.api.set_access_token(Some(token.clone()));
        self.token = Some(token);
        info!(email = %user.email, "signed in");
        Ok(&*self.user.insert(user))
    }

    /// Log out remotely (best-effort) and forget the local session.
    pub async fn teardown(&mut self) {
        if let Err(err) = self.api.logout().await {
            warn!(error = %err, "remote logout failed; clearing local session anyway");
        }
        self.forget().await;
        info!("signed out");
    }

    /// React to an unauthorized response: drop the local session without
    /// calling the API again.
    pub async fn invalidate(&mut self) {
        warn!("session rejected by the server; signing out");
        self.forget().await;
    }

    async fn persist(&self, user: &User, token: &AccessToken) {
        match serde_json::to_string(user) {
            Ok(encoded) => {
                if let Err(err) = self.kv.set(USER_KEY, &encoded).await {
                    warn!(error = %err, "failed to persist user profile");
                }
            }
            Err(err) => warn!(error = %err, "failed to encode user profile"),
        }
        if let Err(err) = self.kv.set(TOKEN_KEY, token.expose()).await {
            warn!(error = %err, "failed to persist access token");
        }
    }

    async fn forget(&mut self) {
        for key in [USER_KEY, TOKEN_KEY] {
            if let Err(err) = self.kv.remove(key).await {
                warn!(key, error = %err, "failed to remove stored session entry");
            }
        }
        self.user = None;
        self.token = None;
        self.api.set_access_token(None);
        debug!("local session cleared");
    }
}
