//! Forwarding errors and their HTTP responses.
//!
//! Every failure answers with a JSON body `{"error": "..."}`. Upstream
//! details never reach the caller: the rule's static message is used
//! instead, and the real cause goes to the log and Sentry.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use vocalocart_core::ErrorBody;

use crate::rules::FailurePolicy;

/// Error type for the forwarding handler.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No rule covers the path.
    #[error("no route for {0}")]
    NoRoute(String),

    /// A rule covers the path but not the method.
    #[error("method not allowed for {0}")]
    MethodNotAllowed(String),

    /// The upstream could not be reached or did not answer in time.
    #[error("upstream request failed: {source}")]
    Upstream {
        policy: FailurePolicy,
        #[source]
        source: reqwest::Error,
    },

    /// The upstream answered with a non-success status.
    #[error("upstream answered {status}")]
    UpstreamStatus {
        policy: FailurePolicy,
        status: StatusCode,
    },

    /// The path contains dot segments and is never forwarded.
    #[error("invalid path {0}")]
    BadRequest(String),
}

impl ProxyError {
    /// Status code sent to the caller.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoRoute(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::Upstream { policy, .. } => policy.status,
            Self::UpstreamStatus { policy, status } => {
                if policy.relay_upstream_status {
                    *status
                } else {
                    policy.status
                }
            }
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message placed in the response body.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::NoRoute(_) => "Not found".to_string(),
            Self::MethodNotAllowed(_) => "Method not allowed".to_string(),
            Self::Upstream { policy, .. } | Self::UpstreamStatus { policy, .. } => {
                policy.message.clone()
            }
            Self::BadRequest(_) => "Invalid path".to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            Self::Upstream { .. } => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Forwarding failed"
                );
            }
            Self::UpstreamStatus { status, .. } if status.is_server_error() => {
                tracing::error!(error = %self, "Upstream error");
            }
            Self::UpstreamStatus { .. } => {
                tracing::warn!(error = %self, "Upstream rejected request");
            }
            Self::NoRoute(_) | Self::MethodNotAllowed(_) | Self::BadRequest(_) => {
                tracing::debug!(error = %self, "Request not forwarded");
            }
        }

        (self.status(), Json(ErrorBody::new(self.message()))).into_response()
    }
}

/// Result type alias for `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;
