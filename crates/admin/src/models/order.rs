//! Orders and their line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use storedesk_core::{CartItemId, OrderId, OrderStatus, Price, ProductId, ProductImages, UserId};

use super::null_as_default;

/// Title shown for a line whose product no longer exists.
pub const UNKNOWN_PRODUCT: &str = "Unknown Product";

/// A row of the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_amount: Price,
    /// Free text in storage; see [`Order::status`].
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<Value>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Known status, with missing treated as pending.
    #[must_use]
    pub fn status(&self) -> Option<OrderStatus> {
        OrderStatus::parse_lenient(self.status.as_deref())
    }

    /// Label for the status badge; unknown statuses show their raw text.
    #[must_use]
    pub fn status_label(&self) -> String {
        self.status().map_or_else(
            || self.status.clone().unwrap_or_default(),
            |s| s.label().to_owned(),
        )
    }

    #[must_use]
    pub fn status_badge(&self) -> &'static str {
        self.status().map_or("badge", OrderStatus::badge_class)
    }

    /// Shipping address flattened to one line.
    ///
    /// Stored either as text or as a JSON object whose string values are
    /// joined in key order.
    #[must_use]
    pub fn shipping_summary(&self) -> Option<String> {
        let summary = match self.shipping_address.as_ref()? {
            Value::String(s) => s.trim().to_owned(),
            Value::Object(map) => map
                .values()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        };
        (!summary.is_empty()).then_some(summary)
    }
}

/// An order together with the email of the user who placed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderRow {
    #[serde(flatten)]
    pub order: Order,
    pub email: Option<String>,
}

impl OrderRow {
    #[must_use]
    pub fn email_text(&self) -> &str {
        self.email.as_deref().unwrap_or("-")
    }
}

/// The product subset embedded in an order line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemProduct {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub price: Price,
    #[serde(default, deserialize_with = "ProductImages::nullable")]
    pub images: ProductImages,
}

/// A `cart_items` row that belongs to an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: CartItemId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: i64,
    #[serde(default)]
    pub price_at_time: Option<Price>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product: Option<OrderItemProduct>,
}

impl OrderItem {
    #[must_use]
    pub fn product_title(&self) -> &str {
        self.product.as_ref().map_or(UNKNOWN_PRODUCT, |p| p.title.as_str())
    }

    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        self.product.as_ref().and_then(|p| p.images.first())
    }

    /// Price paid per unit: the recorded price, else the current one.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.price_at_time
            .or_else(|| self.product.as_ref().map(|p| p.price))
            .unwrap_or(Price::ZERO)
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// The order columns the dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_amount: Price,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(status: Value) -> Order {
        serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "user_id": "0b7e4c0e-2f7c-4b8a-9a4f-5f1e2d3c4b5a",
            "total_amount": "42.50",
            "status": status,
        }))
        .unwrap()
    }

    #[test]
    fn test_status_defaults_to_pending() {
        let o = order(Value::Null);
        assert_eq!(o.status(), Some(OrderStatus::Pending));
        assert_eq!(o.status_label(), "Pending");
    }

    #[test]
    fn test_unknown_status_shows_raw_text() {
        let o = order(json!("refunded"));
        assert_eq!(o.status(), None);
        assert_eq!(o.status_label(), "refunded");
        assert_eq!(o.status_badge(), "badge");
    }

    #[test]
    fn test_shipping_summary() {
        let mut o = order(json!("completed"));
        assert_eq!(o.shipping_summary(), None);

        o.shipping_address = Some(json!({"line1": "1 Main St", "city": "Springfield", "zip": 12345}));
        let summary = o.shipping_summary().unwrap();
        assert!(summary.contains("1 Main St"));
        assert!(summary.contains("Springfield"));

        o.shipping_address = Some(json!("  "));
        assert_eq!(o.shipping_summary(), None);
    }

    #[test]
    fn test_item_without_product() {
        let item: OrderItem = serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "quantity": 2,
            "price_at_time": "5.00",
            "product": null
        }))
        .unwrap();

        assert_eq!(item.product_title(), UNKNOWN_PRODUCT);
        assert!(item.thumbnail().is_none());
        assert_eq!(item.line_total().to_string(), "$10.00");
    }

    #[test]
    fn test_item_falls_back_to_product_price() {
        let item: OrderItem = serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "quantity": 3,
            "product": {
                "id": "0b7e4c0e-2f7c-4b8a-9a4f-5f1e2d3c4b5a",
                "title": "Wig",
                "price": 4,
                "images": ["w.jpg"]
            }
        }))
        .unwrap();

        assert_eq!(item.product_title(), "Wig");
        assert_eq!(item.thumbnail().as_deref(), Some("w.jpg"));
        assert_eq!(item.line_total().to_string(), "$12.00");
    }
}
