//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ProxyConfig;
use crate::rules::RouteTable;

/// Upper bound on a single upstream exchange.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Nothing in here changes after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ProxyConfig,
    routes: RouteTable,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ProxyConfig, routes: RouteTable) -> Result<Self, reqwest::Error> {
        // Redirects are relayed to the caller, not followed.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                routes,
                http,
            }),
        })
    }

    /// Get a reference to the proxy configuration.
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.inner.config
    }

    /// Get a reference to the forwarding table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.inner.routes
    }

    /// Get a reference to the pooled upstream HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
