//! The forwarding handler.
//!
//! Mounted as the router fallback: every request that is not a health check
//! is looked up in the [`RouteTable`](crate::rules::RouteTable) and, when a
//! rule matches, replayed against the upstream origin.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderName, Method, Uri, header},
    response::Response,
};

use crate::error::{ProxyError, Result};
use crate::rules::RouteMatch;
use crate::state::AppState;

/// End-to-end request headers passed to the upstream.
static FORWARDED_REQUEST_HEADERS: [HeaderName; 3] =
    [header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT];

/// Upstream response headers passed back to the caller.
static RELAYED_RESPONSE_HEADERS: [HeaderName; 3] =
    [header::CONTENT_TYPE, header::LOCATION, header::CACHE_CONTROL];

/// Forward a whitelisted request to the upstream and relay its answer.
///
/// # Errors
///
/// Returns 400 for paths with dot segments, 404/405 for paths no rule
/// accepts, and the matching rule's
/// failure status when the upstream is unreachable or answers with an error.
#[tracing::instrument(skip(state, headers, body), fields(%method, path = %uri.path()))]
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    let path = uri.path();
    let (rule, upstream_path) = match state.routes().resolve(&method, path) {
        RouteMatch::Forward {
            rule,
            upstream_path,
        } => (rule, upstream_path),
        RouteMatch::MethodNotAllowed => return Err(ProxyError::MethodNotAllowed(path.to_string())),
        RouteMatch::NotFound => return Err(ProxyError::NoRoute(path.to_string())),
        RouteMatch::InvalidPath => return Err(ProxyError::BadRequest(path.to_string())),
    };

    let url = state.config().upstream_url(&upstream_path, uri.query());
    tracing::debug!(%url, rule = rule.prefix(), "Forwarding request");

    let mut outbound = HeaderMap::new();
    for name in &FORWARDED_REQUEST_HEADERS {
        if let Some(value) = headers.get(name) {
            outbound.insert(name.clone(), value.clone());
        }
    }

    let upstream = state
        .http()
        .request(method, &url)
        .headers(outbound)
        .body(body)
        .send()
        .await
        .map_err(|source| ProxyError::Upstream {
            policy: rule.failure().clone(),
            source,
        })?;

    let status = upstream.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(ProxyError::UpstreamStatus {
            policy: rule.failure().clone(),
            status,
        });
    }

    let mut relayed = HeaderMap::new();
    for name in &RELAYED_RESPONSE_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            relayed.insert(name.clone(), value.clone());
        }
    }

    let bytes = upstream
        .bytes()
        .await
        .map_err(|source| ProxyError::Upstream {
            policy: rule.failure().clone(),
            source,
        })?;

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    *response.headers_mut() = relayed;
    Ok(response)
}
