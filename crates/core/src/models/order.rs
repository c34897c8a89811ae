//! Orders and their line items.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OrderItemId, OrderStatus, Price, ProductId, UserId};

/// Shipping address snapshot copied onto an order when it is placed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_recipient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_phone: Option<String>,
}

impl ShippingDetails {
    /// Whether the order was placed with an address.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.ship_recipient_name.is_some() || self.ship_line1.is_some()
    }

    /// Single-line rendering of the non-empty parts.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            &self.ship_recipient_name,
            &self.ship_line1,
            &self.ship_line2,
            &self.ship_city,
            &self.ship_state,
            &self.ship_postal_code,
            &self.ship_country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image_url: Option<String>,
    pub quantity: u32,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Price>,
}

impl OrderItem {
    /// Server subtotal when present, otherwise `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.subtotal.unwrap_or(self.price * self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ordered_at: Option<NaiveDateTime>,
    pub total_amount: Price,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// Raw status code. Kept as a string so an unknown code still renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub shipping: ShippingDetails,
}

impl Order {
    /// Parsed status, if present and recognised.
    #[must_use]
    pub fn status(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    #[must_use]
    pub fn status_label(&self) -> String {
        OrderStatus::readable(self.status.as_deref())
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.status() == Some(OrderStatus::Canceled)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER_JSON: &str = r#"{
        "id": 12,
        "userId": 3,
        "orderedAt": "2025-03-09T14:30:00",
        "totalAmount": 3000,
        "status": "IN_DELIVERY",
        "shipRecipientName": "Hatsune Miku",
        "shipLine1": "1-39 Crypton St",
        "shipCity": "Sapporo",
        "shipPostalCode": "060-0001",
        "shipCountry": "JP",
        "items": [
            {"productId": 1, "productName": "Miku V4X", "quantity": 2, "price": 1000, "subtotal": 2000},
            {"productId": 2, "productName": "Negi", "quantity": 1, "price": 1000}
        ]
    }"#;

    #[test]
    fn test_order_deserializes_flat_shipping_fields() {
        let order: Order = serde_json::from_str(ORDER_JSON).unwrap();
        assert_eq!(order.status(), Some(OrderStatus::InDelivery));
        assert_eq!(order.status_label(), "Shipping");
        assert!(order.shipping.is_present());
        assert_eq!(
            order.shipping.one_line(),
            "Hatsune Miku, 1-39 Crypton St, Sapporo, 060-0001, JP"
        );
        let lines: Price = order.items.iter().map(OrderItem::line_total).sum();
        assert_eq!(lines, order.total_amount);
    }

    #[test]
    fn test_unknown_status_still_renders() {
        let order: Order =
            serde_json::from_str(r#"{"id":1,"totalAmount":0,"status":"ON_HOLD"}"#).unwrap();
        assert_eq!(order.status(), None);
        assert_eq!(order.status_label(), "ON HOLD");
        assert!(!order.shipping.is_present());
        assert!(!order.is_canceled());
    }
}
