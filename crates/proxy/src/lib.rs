//! VocaloCart API forwarder library.
//!
//! Relays whitelisted storefront routes to a single upstream origin. The
//! binary in `main.rs` adds configuration loading, Sentry and the listener;
//! everything else lives here so it can be tested in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod forward;
pub mod middleware;
pub mod routes;
pub mod rules;
pub mod state;

pub use config::{ConfigError, ProxyConfig};
pub use error::ProxyError;
pub use routes::router;
pub use rules::{FailurePolicy, ForwardRule, RouteMatch, RouteTable, RouteTableError};
pub use state::AppState;
