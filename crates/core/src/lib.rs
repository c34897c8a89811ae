//! VocaloCart Core - Shared wire types.
//!
//! This crate provides the types exchanged between every VocaloCart component:
//! - `proxy` - HTTP forwarder in front of the backend service
//! - `client` - Typed API client with the cart and auth stores
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. All JSON
//! field names follow the backend's camelCase convention.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`models`] - Request and response payloads for each backend resource

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
