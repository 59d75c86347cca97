//! Shopping cart lines and per-user carts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::{CartItemId, OrderId, Price, ProductId, UserId};

use super::{Product, User, null_as_default};

/// A `cart_items` row not yet attached to an order, with its product and
/// owner embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
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
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub user: Option<User>,
}

impl CartItem {
    #[must_use]
    pub fn product_title(&self) -> &str {
        self.product
            .as_ref()
            .map_or(super::order::UNKNOWN_PRODUCT, |p| p.title.as_str())
    }

    /// Live product price; zero when the product is gone.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.product.as_ref().map_or(Price::ZERO, |p| p.price)
    }

    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }
}

/// All cart lines belonging to one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartGroupedByUser {
    pub user: User,
    pub items: Vec<CartItem>,
}

impl CartGroupedByUser {
    #[must_use]
    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Creation time of the first line, which dates the whole cart.
    #[must_use]
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.items.first().and_then(|i| i.created_at)
    }
}

/// Group cart lines by owner, keeping first-seen order.
///
/// Lines without a `user_id` or without an embedded user are skipped.
#[must_use]
pub fn group_carts(items: Vec<CartItem>) -> Vec<CartGroupedByUser> {
    let mut index: HashMap<UserId, usize> = HashMap::new();
    let mut carts: Vec<CartGroupedByUser> = Vec::new();

    for item in items {
        let (Some(user_id), Some(user)) = (item.user_id, item.user.clone()) else {
            continue;
        };

        if let Some(&i) = index.get(&user_id) {
            if let Some(cart) = carts.get_mut(i) {
                cart.items.push(item);
            }
        } else {
            index.insert(user_id, carts.len());
            carts.push(CartGroupedByUser {
                user,
                items: vec![item],
            });
        }
    }

    carts
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    const ADA: &str = "0b7e4c0e-2f7c-4b8a-9a4f-5f1e2d3c4b5a";
    const GRACE: &str = "1c8f5d1f-3a8d-4c9b-8b5a-6a2f3e4d5c6b";

    fn item(id: u8, user_id: Option<&str>, with_user: bool, price: f64, quantity: i64) -> CartItem {
        let user: Value = match (user_id, with_user) {
            (Some(uid), true) => json!({"id": uid, "email": format!("{uid}@shop.test")}),
            _ => Value::Null,
        };
        serde_json::from_value(json!({
            "id": format!("00000000-0000-4000-8000-0000000000{id:02}"),
            "user_id": user_id,
            "quantity": quantity,
            "created_at": format!("2024-03-{:02}T10:00:00Z", id.max(1)),
            "product": {
                "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
                "title": "Wig",
                "price": price
            },
            "user": user
        }))
        .unwrap()
    }

    #[test]
    fn test_group_carts_first_seen_order() {
        let carts = group_carts(vec![
            item(3, Some(GRACE), true, 1.0, 1),
            item(2, Some(ADA), true, 2.0, 2),
            item(1, Some(GRACE), true, 3.0, 1),
        ]);

        assert_eq!(carts.len(), 2);
        assert_eq!(carts[0].user.id.to_string(), GRACE);
        assert_eq!(carts[0].items.len(), 2);
        assert_eq!(carts[1].user.id.to_string(), ADA);
    }

    #[test]
    fn test_group_carts_skips_lines_without_owner() {
        let carts = group_carts(vec![
            item(1, None, false, 1.0, 1),
            item(2, Some(ADA), false, 1.0, 1),
            item(3, Some(ADA), true, 1.0, 1),
        ]);

        assert_eq!(carts.len(), 1);
        assert_eq!(carts[0].items.len(), 1);
    }

    #[test]
    fn test_cart_totals() {
        let carts = group_carts(vec![
            item(5, Some(ADA), true, 2.5, 2),
            item(4, Some(ADA), true, 10.0, 1),
        ]);

        let cart = &carts[0];
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total_amount().to_string(), "$15.00");
        assert_eq!(
            cart.created_at().unwrap().to_rfc3339(),
            "2024-03-05T10:00:00+00:00"
        );
    }

    #[test]
    fn test_missing_product_counts_as_zero() {
        let mut line = item(1, Some(ADA), true, 9.0, 4);
        line.product = None;
        assert_eq!(line.product_title(), "Unknown Product");
        assert_eq!(line.line_total(), Price::ZERO);
    }
}
