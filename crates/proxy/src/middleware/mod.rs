//! HTTP middleware stack for the proxy.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. CORS (permissive)
//! 3. `TraceLayer` (request span with an empty `request_id` field)
//! 4. Request ID (fills the span field, echoes the header)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
