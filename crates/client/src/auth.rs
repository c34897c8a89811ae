//! Session state: the bearer token and the profile it resolves to.
//!
//! Every time the token changes (login, registration, restore at startup)
//! the profile is fetched from `/auth/me`. If that fails the session is
//! dropped: token and profile are cleared together and the persisted token
//! is forgotten.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, instrument, warn};
use vocalocart_core::{Email, EmailError, LoginRequest, RegisterRequest, User, UserId};

use crate::api::{ApiClient, ApiError, ErrorCategory};
use crate::token_store::{TokenStore, TokenStoreError};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),
    #[error("password cannot be empty")]
    EmptyPassword,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    TokenStore(#[from] TokenStoreError),
}

impl AuthError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Api(e) => e.category(),
            Self::InvalidEmail(_) | Self::EmptyPassword | Self::TokenStore(_) => {
                ErrorCategory::Failure
            }
        }
    }
}

/// Optional profile fields sent at registration. Blank values are omitted.
#[derive(Debug, Clone, Default)]
pub struct RegisterOptions {
    pub nickname: Option<String>,
    pub birthday: Option<NaiveDate>,
}

/// Holds the session and notifies subscribers when the profile changes.
///
/// Cheaply cloneable; clones share the session.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    user: watch::Sender<Option<User>>,
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthStore")
            .field("api", &self.inner.api)
            .field("user", &*self.inner.user.borrow())
            .finish_non_exhaustive()
    }
}

impl AuthStore {
    /// Create a logged-out store. Call [`restore`](Self::restore) to pick up
    /// a persisted session.
    #[must_use]
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        api.set_token(None);
        let (user, _) = watch::channel(None);
        Self {
            inner: Arc::new(AuthStoreInner { api, tokens, user }),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// The resolved profile, if logged in.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.user.borrow().clone()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.inner.user.borrow().as_ref().map(|u| u.id)
    }

    /// Whether a token is set. The profile may still be loading.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner.api.has_token()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner.user.borrow().is_some()
    }

    /// Watch profile changes. `None` means logged out.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.inner.user.subscribe()
    }

    /// Apply the persisted token, if there is one.
    ///
    /// Returns `Ok(None)` when nothing was persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the token store cannot be read or the profile
    /// fetch fails. In the latter case the session has been cleared.
    pub async fn restore(&self) -> Result<Option<User>, AuthError> {
        match self.inner.tokens.load()? {
            Some(token) => self.apply_token(token).await.map(Some),
            None => Ok(None),
        }
    }

    /// Exchange credentials for a token, persist it, and load the profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is malformed, the credentials are
    /// rejected, or the profile cannot be loaded. A rejected login leaves the
    /// previous session untouched.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let request = LoginRequest {
            email: Email::parse(email)?,
            password: non_empty(password)?,
        };
        let response = self.inner.api.login(&request).await?;
        self.accept_token(SecretString::from(response.token)).await
    }

    /// Create an account, then proceed as after [`login`](Self::login).
    ///
    /// # Errors
    ///
    /// Returns an error if the email is malformed, the backend rejects the
    /// registration, or the profile cannot be loaded.
    #[instrument(skip(self, password, options))]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        options: RegisterOptions,
    ) -> Result<User, AuthError> {
        let request = RegisterRequest {
            email: Email::parse(email)?,
            password: non_empty(password)?,
            nickname: options
                .nickname
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            birthday: options.birthday,
        };
        let response = self.inner.api.register(&request).await?;
        self.accept_token(SecretString::from(response.token)).await
    }

    /// Re-fetch the profile for the current token. No-op without a token.
    ///
    /// # Errors
    ///
    /// Returns the API error. A 401/403 also ends the session; other
    /// failures keep it.
    pub async fn refresh(&self) -> Result<Option<User>, AuthError> {
        if !self.has_token() {
            return Ok(None);
        }
        match self.inner.api.me().await {
            Ok(user) => {
                self.inner.user.send_replace(Some(user.clone()));
                Ok(Some(user))
            }
            Err(e) => {
                if e.category() == ErrorCategory::NotAuthorized {
                    self.logout();
                }
                Err(e.into())
            }
        }
    }

    /// Clear token and profile, in memory and in the token store.
    pub fn logout(&self) {
        self.inner.api.set_token(None);
        self.inner.user.send_replace(None);
        if let Err(e) = self.inner.tokens.clear() {
            warn!(error = %e, "Failed to clear persisted token");
        }
    }

    async fn accept_token(&self, token: SecretString) -> Result<User, AuthError> {
        if let Err(e) = self.inner.tokens.save(&token) {
            warn!(error = %e, "Failed to persist token");
        }
        self.apply_token(token).await
    }

    /// Switch to `token` and load its profile, logging out on failure.
    async fn apply_token(&self, token: SecretString) -> Result<User, AuthError> {
        self.inner.api.set_token(Some(token));
        match self.inner.api.me().await {
            Ok(user) => {
                info!(user_id = %user.id, "Session established");
                self.inner.user.send_replace(Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "Profile fetch failed, logging out");
                self.logout();
                Err(e.into())
            }
        }
    }
}

fn non_empty(password: &str) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }
    Ok(password.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;

    fn store() -> (AuthStore, Arc<MemoryTokenStore>) {
        let tokens = Arc::new(MemoryTokenStore::with_token("stale"));
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        (AuthStore::new(api, tokens.clone()), tokens)
    }

    #[tokio::test]
    async fn test_login_validates_email_before_network() {
        let (auth, _) = store();
        assert!(matches!(
            auth.login("not-an-email", "pw").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.login("miku@example.jp", "").await,
            Err(AuthError::EmptyPassword)
        ));
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_noop() {
        let (auth, _) = store();
        assert!(auth.refresh().await.unwrap().is_none());
        assert!(!auth.is_logged_in());
    }

    #[tokio::test]
    async fn test_restore_failure_logs_out() {
        let (auth, tokens) = store();
        // Nothing listens on the port, so the profile fetch fails.
        assert!(auth.restore().await.is_err());
        assert!(!auth.has_token());
        assert!(auth.user().is_none());
        assert!(tokens.load().unwrap().is_none());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (auth, tokens) = store();
        auth.logout();
        auth.logout();
        assert!(!auth.has_token());
        assert!(tokens.load().unwrap().is_none());
    }
}
