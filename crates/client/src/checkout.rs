//! Checkout: pick a shipping address and turn the cart into an order.

use thiserror::Error;
use tracing::{info, instrument, warn};
use vocalocart_core::{Address, AddressId, Order, Price, UserId};

use crate::api::{ApiError, ErrorCategory};
use crate::auth::AuthStore;
use crate::cart::CartStore;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("please log in to check out")]
    LoginRequired,
    #[error("address {0} is not one of your saved addresses")]
    UnknownAddress(AddressId),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::LoginRequired => ErrorCategory::NotAuthorized,
            Self::UnknownAddress(_) => ErrorCategory::NotFound,
            Self::Api(e) => e.category(),
        }
    }
}

/// What the order will contain, as of the last cart fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub lines: usize,
    pub item_count: u32,
    pub grand_total: Price,
    pub address: Option<Address>,
}

/// One checkout attempt.
#[derive(Debug)]
pub struct Checkout {
    auth: AuthStore,
    cart: CartStore,
    addresses: Vec<Address>,
    selected: Option<AddressId>,
}

impl Checkout {
    #[must_use]
    pub const fn new(auth: AuthStore, cart: CartStore) -> Self {
        Self {
            auth,
            cart,
            addresses: Vec::new(),
            selected: None,
        }
    }

    fn user_id(&self) -> Result<UserId, CheckoutError> {
        self.auth.user_id().ok_or(CheckoutError::LoginRequired)
    }

    /// Fetch the saved addresses and preselect the default one.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::LoginRequired`] when logged out, otherwise
    /// the API error.
    pub async fn load_addresses(&mut self) -> Result<&[Address], CheckoutError> {
        let user_id = self.user_id()?;
        self.addresses = self.auth.api().addresses(user_id).await?;
        self.selected = Address::find_default(&self.addresses).map(|a| a.id);
        Ok(&self.addresses)
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    #[must_use]
    pub fn selected_address(&self) -> Option<&Address> {
        let id = self.selected?;
        self.addresses.iter().find(|a| a.id == id)
    }

    /// Choose a loaded address for shipping.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownAddress`] if `id` was not loaded.
    pub fn select_address(&mut self, id: AddressId) -> Result<(), CheckoutError> {
        if !self.addresses.iter().any(|a| a.id == id) {
            return Err(CheckoutError::UnknownAddress(id));
        }
        self.selected = Some(id);
        Ok(())
    }

    #[must_use]
    pub fn summary(&self) -> CheckoutSummary {
        let snapshot = self.cart.snapshot();
        CheckoutSummary {
            lines: snapshot.len(),
            item_count: snapshot.item_count(),
            grand_total: snapshot.grand_total(),
            address: self.selected_address().cloned(),
        }
    }

    /// Place the order, shipping to `address_id` or else the selected
    /// address, then refetch the (now empty) cart.
    ///
    /// Without any address the backend falls back to the user's default.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::LoginRequired`] when logged out, otherwise
    /// the API error (an empty cart or short stock surfaces here with the
    /// backend's message).
    #[instrument(skip(self))]
    pub async fn place_order(&self, address_id: Option<AddressId>) -> Result<Order, CheckoutError> {
        let user_id = self.user_id()?;
        let address_id = address_id.or(self.selected);
        let order = self.auth.api().place_order(user_id, address_id).await?;
        info!(order_id = %order.id, total = %order.total_amount, "Order placed");

        // The order exists at this point; a failed refetch only leaves the
        // local cart stale.
        if let Err(e) = self.cart.fetch_cart().await {
            warn!(error = %e, "Cart refetch after order failed");
        }
        Ok(order)
    }
}
