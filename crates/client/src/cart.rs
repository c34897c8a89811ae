//! Client-side cart store.
//!
//! The backend owns the cart. Each mutation is one request followed by a
//! full refetch, and the local snapshot is only ever replaced by what the
//! backend returns. There is no optimistic update, so observers see the old
//! snapshot until the refetch lands.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, instrument};
use vocalocart_core::{AddToCartRequest, CartItemId, CartLineItem, CartSnapshot, Price, ProductId};

use crate::api::{ApiClient, ApiError, ErrorCategory};
use crate::auth::AuthStore;

#[derive(Debug, Error)]
pub enum CartError {
    /// No user is logged in.
    #[error("please log in to use the cart")]
    LoginRequired,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CartError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::LoginRequired => ErrorCategory::NotAuthorized,
            Self::Api(e) => e.category(),
        }
    }
}

/// The logged-in user's cart as last fetched.
///
/// Cheaply cloneable; clones share the snapshot.
#[derive(Clone, Debug)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

#[derive(Debug)]
struct CartStoreInner {
    api: ApiClient,
    auth: AuthStore,
    snapshot: watch::Sender<CartSnapshot>,
}

impl CartStore {
    #[must_use]
    pub fn new(auth: AuthStore) -> Self {
        let (snapshot, _) = watch::channel(CartSnapshot::default());
        Self {
            inner: Arc::new(CartStoreInner {
                api: auth.api().clone(),
                auth,
                snapshot,
            }),
        }
    }

    /// Replace the snapshot with the backend's current cart.
    ///
    /// Sends nothing when no user is logged in; a snapshot left over from
    /// the previous session is dropped instead.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous snapshot is kept.
    pub async fn fetch_cart(&self) -> Result<(), CartError> {
        let Some(user_id) = self.inner.auth.user_id() else {
            self.inner.snapshot.send_if_modified(|snapshot| {
                if snapshot.is_empty() {
                    return false;
                }
                debug!("Dropping cart of logged-out session");
                *snapshot = CartSnapshot::default();
                true
            });
            return Ok(());
        };
        let snapshot = self.inner.api.cart(user_id).await?;
        debug!(lines = snapshot.len(), total = %snapshot.grand_total(), "Cart fetched");
        self.inner.snapshot.send_replace(snapshot);
        Ok(())
    }

    /// Add `quantity` units of a product, then refetch.
    ///
    /// The backend merges into an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LoginRequired`] without sending anything when
    /// logged out, otherwise the API error.
    #[instrument(skip(self))]
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let user_id = self.inner.auth.user_id().ok_or(CartError::LoginRequired)?;
        self.inner
            .api
            .add_to_cart(&AddToCartRequest {
                user_id,
                product_id,
                quantity,
            })
            .await?;
        self.fetch_cart().await
    }

    /// Remove one unit of a line, then refetch. A line at quantity 1 is
    /// deleted by the backend.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LoginRequired`] when logged out, otherwise the
    /// API error (404 for an unknown line).
    #[instrument(skip(self))]
    pub async fn remove_from_cart(&self, cart_item_id: CartItemId) -> Result<(), CartError> {
        self.require_user()?;
        self.inner.api.decrement_cart_item(cart_item_id).await?;
        self.fetch_cart().await
    }

    /// Delete a line whatever its quantity, then refetch.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::LoginRequired`] when logged out, otherwise the
    /// API error.
    #[instrument(skip(self))]
    pub async fn remove_all_from_cart(&self, cart_item_id: CartItemId) -> Result<(), CartError> {
        self.require_user()?;
        self.inner.api.delete_cart_item(cart_item_id).await?;
        self.fetch_cart().await
    }

    /// Drop the local snapshot, e.g. after logout.
    pub fn clear(&self) {
        self.inner.snapshot.send_replace(CartSnapshot::default());
    }

    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    #[must_use]
    pub fn items(&self) -> Vec<CartLineItem> {
        self.inner.snapshot.borrow().items().to_vec()
    }

    /// Sum of the lines' server-computed totals.
    #[must_use]
    pub fn grand_total(&self) -> Price {
        self.inner.snapshot.borrow().grand_total()
    }

    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.inner.snapshot.borrow().item_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.snapshot.borrow().is_empty()
    }

    /// Watch snapshot replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.snapshot.subscribe()
    }

    fn require_user(&self) -> Result<(), CartError> {
        if self.inner.auth.user_id().is_none() {
            return Err(CartError::LoginRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;

    fn logged_out() -> CartStore {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap();
        CartStore::new(AuthStore::new(api, Arc::new(MemoryTokenStore::new())))
    }

    #[tokio::test]
    async fn test_mutations_require_login() {
        let cart = logged_out();
        assert!(matches!(
            cart.add_to_cart(ProductId::new(1), 1).await,
            Err(CartError::LoginRequired)
        ));
        assert!(matches!(
            cart.remove_from_cart(CartItemId::new(1)).await,
            Err(CartError::LoginRequired)
        ));
        assert!(matches!(
            cart.remove_all_from_cart(CartItemId::new(1)).await,
            Err(CartError::LoginRequired)
        ));
    }

    #[tokio::test]
    async fn test_fetch_without_user_is_noop() {
        let cart = logged_out();
        let rx = cart.subscribe();
        cart.fetch_cart().await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.grand_total(), Price::ZERO);
        assert!(!rx.has_changed().unwrap());
    }
}
