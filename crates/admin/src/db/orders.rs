//! Order repository.

use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use tracing::instrument;

use storedesk_core::{OrderId, OrderStatus};

use super::{RepositoryError, UserRepository};
use crate::backend::DataApi;
use crate::models::{Order, OrderItem, OrderRow, OrderSnapshot};

const TABLE: &str = "orders";

/// Order lines with the product subset the order view shows.
const ITEM_COLUMNS: &str = "id,user_id,order_id,product_id,quantity,price_at_time,created_at,updated_at,\
                            product:products(id,title,description,price,images)";

/// Repository for the `orders` table and its lines in `cart_items`.
pub struct OrderRepository<'a> {
    api: &'a DataApi,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(api: &'a DataApi) -> Self {
        Self { api }
    }

    /// All orders, newest first, each with its customer's email.
    ///
    /// Emails are looked up concurrently, one request per order. A failed
    /// lookup leaves that order's email empty rather than failing the list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the orders themselves cannot be
    /// fetched.
    #[instrument(skip(self))]
    pub async fn list_with_emails(&self) -> Result<Vec<OrderRow>, RepositoryError> {
        let orders: Vec<Order> = self
            .api
            .from(TABLE)
            .select("*")
            .order("created_at", false)
            .fetch()
            .await?;

        let users = UserRepository::new(self.api);
        let lookups = orders.iter().map(|order| {
            let users = &users;
            async move {
                let user_id = order.user_id?;
                match users.email_for(user_id).await {
                    Ok(email) => email,
                    Err(e) => {
                        tracing::warn!(order_id = %order.id, error = %e, "Failed to look up order email");
                        None
                    }
                }
            }
        });
        let emails = join_all(lookups).await;

        Ok(orders
            .into_iter()
            .zip(emails)
            .map(|(order, email)| OrderRow { order, email })
            .collect())
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this ID.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_by_id(&self, id: OrderId) -> Result<Order, RepositoryError> {
        self.api
            .from(TABLE)
            .select("*")
            .eq("id", id)
            .single()
            .await
            .map_err(RepositoryError::from_single)
    }

    /// Lines of an order with their products embedded.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn items_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let items: Vec<OrderItem> = self
            .api
            .from("cart_items")
            .select(ITEM_COLUMNS)
            .eq("order_id", order_id)
            .fetch()
            .await?;

        let missing = items.iter().filter(|i| i.product.is_none()).count();
        if missing > 0 {
            tracing::debug!(missing, "Order lines reference missing products");
        }
        Ok(items)
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self, status), fields(order_id = %id, status = %status))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), RepositoryError> {
        self.api
            .from(TABLE)
            .update(&serde_json::json!({ "status": status.as_str() }))?
            .eq("id", id)
            .execute()
            .await?;

        tracing::info!("Updated order status");
        Ok(())
    }

    /// Orders created within `[start, end]`, oldest first, reduced to the
    /// columns the dashboard aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidInput` if `start` is after `end`.
    pub async fn snapshots_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<OrderSnapshot>, RepositoryError> {
        if start > end {
            return Err(RepositoryError::InvalidInput(
                "window start is after its end".to_owned(),
            ));
        }

        Ok(self
            .api
            .from(TABLE)
            .select("total_amount,status,created_at")
            .gte("created_at", start.to_rfc3339_opts(SecondsFormat::Millis, true))
            .lte("created_at", end.to_rfc3339_opts(SecondsFormat::Millis, true))
            .order("created_at", true)
            .fetch()
            .await?)
    }
}
