//! VocaloCart storefront client.
//!
//! A typed API client plus the stores a front end keeps between calls:
//!
//! - [`AuthStore`]: bearer token and profile, persisted through a
//!   [`TokenStore`]
//! - [`CartStore`]: the backend's cart as last fetched
//! - [`Checkout`]: address selection and order placement
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vocalocart_client::{ApiClient, AuthStore, CartStore, FileTokenStore};
//!
//! let api = ApiClient::new("http://127.0.0.1:5000")?;
//! let auth = AuthStore::new(api, Arc::new(FileTokenStore::new(".vocalocart-token")));
//! auth.login("miku@example.jp", "secret").await?;
//!
//! let cart = CartStore::new(auth.clone());
//! cart.add_to_cart(ProductId::new(39), 1).await?;
//! println!("{}", cart.grand_total());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod token_store;

pub use api::{ApiClient, ApiError, ErrorCategory};
pub use auth::{AuthError, AuthStore, RegisterOptions};
pub use cart::{CartError, CartStore};
pub use checkout::{Checkout, CheckoutError, CheckoutSummary};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
