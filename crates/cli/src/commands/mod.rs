//! Subcommand implementations and their shared session context.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod health;
pub mod session;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use vocalocart_client::{
    ApiClient, ApiError, AuthError, AuthStore, CartError, CartStore, CheckoutError, ErrorCategory,
    FileTokenStore,
};
use vocalocart_core::{ContactError, EmailError, User};

/// Errors surfaced by any subcommand.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
    #[error("invalid message: {0}")]
    Contact(#[from] ContactError),
    #[error("not logged in; run `vc-cli login` first")]
    LoginRequired,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{0} health check(s) failed")]
    HealthCheckFailed(usize),
}

impl CliError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Api(e) => e.category(),
            Self::Auth(e) => e.category(),
            Self::Cart(e) => e.category(),
            Self::Checkout(e) => e.category(),
            Self::LoginRequired => ErrorCategory::NotAuthorized,
            Self::Email(_) | Self::Contact(_) | Self::MissingFields(_) | Self::HealthCheckFailed(_) => {
                ErrorCategory::Failure
            }
        }
    }

    /// Process exit code for the error's category.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Failure => 1,
            ErrorCategory::NotAuthorized => 3,
            ErrorCategory::NotFound => 4,
        }
    }
}

/// API client and stores for one CLI invocation.
pub struct Context {
    pub auth: AuthStore,
    pub cart: CartStore,
}

impl Context {
    /// Build the stores and pick up the saved session, if any.
    ///
    /// An expired or rejected saved session is dropped with a warning rather
    /// than failing the command.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a usable base URL.
    pub async fn open(api_url: &str, token_file: &Path) -> Result<Self, CliError> {
        let api = ApiClient::new(api_url)?;
        let auth = AuthStore::new(api, Arc::new(FileTokenStore::new(token_file)));
        if let Err(e) = auth.restore().await {
            tracing::warn!(error = %e, "Saved session could not be restored");
        }
        let cart = CartStore::new(auth.clone());
        Ok(Self { auth, cart })
    }

    pub fn api(&self) -> &ApiClient {
        self.auth.api()
    }

    /// The logged-in user.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::LoginRequired`] when no session is active.
    pub fn user(&self) -> Result<User, CliError> {
        self.auth.user().ok_or(CliError::LoginRequired)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    #[test]
    fn test_exit_codes_follow_categories() {
        assert_eq!(CliError::LoginRequired.exit_code(), 3);
        assert_eq!(
            CliError::Api(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                message: None
            })
            .exit_code(),
            4
        );
        assert_eq!(CliError::HealthCheckFailed(2).exit_code(), 1);
        assert_eq!(
            CliError::Cart(CartError::LoginRequired).exit_code(),
            3
        );
    }

    #[test]
    fn test_missing_fields_message() {
        let err = CliError::MissingFields(vec!["line1", "city"]);
        assert_eq!(err.to_string(), "missing required fields: line1, city");
    }
}
