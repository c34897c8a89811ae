//! Cart line items and the cart snapshot.

use serde::{Deserialize, Serialize};

use crate::types::{CartItemId, Price, ProductId, UserId};

/// A single cart row associating a user, product, and quantity.
///
/// `total_price` is computed by the backend as `price * quantity` and is
/// trusted as-is. The backend's item DTO names the fields `id` and
/// `subtotal`, so those are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    #[serde(alias = "id")]
    pub cart_item_id: CartItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(alias = "subtotal")]
    pub total_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
}

/// The backend's view of a user's cart at one point in time.
///
/// Serializes as a bare JSON array of line items, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartSnapshot {
    items: Vec<CartLineItem>,
}

impl CartSnapshot {
    #[must_use]
    pub const fn new(items: Vec<CartLineItem>) -> Self {
        Self { items }
    }

    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<CartLineItem> {
        self.items
    }

    /// Sum of every line's `total_price`. This is the displayed grand total.
    #[must_use]
    pub fn grand_total(&self) -> Price {
        self.items.iter().map(|item| item.total_price).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn line(&self, id: CartItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.cart_item_id == id)
    }

    #[must_use]
    pub fn line_for_product(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }
}

/// Body of `POST /api/cart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i64, product: i64, price: i64, quantity: u32) -> CartLineItem {
        CartLineItem {
            cart_item_id: CartItemId::new(id),
            product_id: ProductId::new(product),
            product_name: format!("Product {product}"),
            price: Price::new(price),
            quantity,
            total_price: Price::new(price) * quantity,
            product_image: None,
        }
    }

    #[test]
    fn test_grand_total_sums_line_totals() {
        let cart = CartSnapshot::new(vec![line(1, 10, 1000, 2), line(2, 11, 350, 3)]);
        assert_eq!(cart.grand_total(), Price::new(3050));
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn test_grand_total_trusts_server_total() {
        let mut odd = line(1, 10, 1000, 2);
        odd.total_price = Price::new(1800);
        let cart = CartSnapshot::new(vec![odd]);
        assert_eq!(cart.grand_total(), Price::new(1800));
    }

    #[test]
    fn test_totals_saturate_on_huge_lines() {
        let mut huge = line(1, 10, i64::MAX, 1);
        huge.quantity = u32::MAX;
        let cart = CartSnapshot::new(vec![huge, line(2, 11, 1000, 5)]);
        assert_eq!(cart.item_count(), u32::MAX);
        assert_eq!(cart.grand_total(), Price::new(i64::MAX));
    }

    #[test]
    fn test_deserializes_both_field_spellings() {
        let frontend = r#"[{"cartItemId":1,"productId":10,"productName":"Miku V4X",
            "price":1000,"quantity":2,"totalPrice":2000}]"#;
        let backend = r#"[{"id":1,"productId":10,"productName":"Miku V4X",
            "productImage":"/img/miku.png","price":1000,"quantity":2,"subtotal":2000}]"#;
        let a: CartSnapshot = serde_json::from_str(frontend).unwrap();
        let b: CartSnapshot = serde_json::from_str(backend).unwrap();
        assert_eq!(a.items()[0].cart_item_id, b.items()[0].cart_item_id);
        assert_eq!(a.grand_total(), b.grand_total());
        assert_eq!(b.items()[0].product_image.as_deref(), Some("/img/miku.png"));
    }

    #[test]
    fn test_lookup_by_line_and_product() {
        let cart = CartSnapshot::new(vec![line(1, 10, 1000, 1), line(2, 11, 500, 1)]);
        assert_eq!(
            cart.line(CartItemId::new(2)).map(|l| l.product_id),
            Some(ProductId::new(11))
        );
        assert!(cart.line_for_product(ProductId::new(99)).is_none());
    }

    #[test]
    fn test_add_request_wire_shape() {
        let req = AddToCartRequest {
            user_id: UserId::new(3),
            product_id: ProductId::new(7),
            quantity: 1,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"userId":3,"productId":7,"quantity":1}"#
        );
    }
}
