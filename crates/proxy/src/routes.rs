//! Router assembly.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health        - Liveness (always "ok")
//! GET  /health/ready  - Readiness (503 when the upstream does not answer)
//! *    /*             - Forwarded per the rule table, otherwise 404/405
//! ```

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{Request, Response, StatusCode},
    middleware::from_fn,
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::forward::forward;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

const READINESS_TIMEOUT: Duration = Duration::from_secs(3);

/// Build the proxy router with its middleware stack.
///
/// Sentry layers are added by the binary so tests can drive the router
/// without a Sentry hub.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .fallback(forward)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the upstream.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Any HTTP answer from the upstream origin counts as ready, including error
/// statuses. Connection failures and timeouts return 503.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let probe = state
        .http()
        .get(state.config().upstream_base_url.as_str())
        .timeout(READINESS_TIMEOUT)
        .send()
        .await;

    match probe {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Upstream not reachable");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
