//! Cart repository.
//!
//! Cart lines live in `cart_items` with a null `order_id`; once an order is
//! placed its lines keep their rows and gain the order's ID.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use storedesk_core::{CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::backend::DataApi;
use crate::models::{CartGroupedByUser, CartItem, group_carts};

const TABLE: &str = "cart_items";

/// A bare cart line as returned by mutations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub user_id: Option<UserId>,
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub quantity: i64,
}

#[derive(Serialize)]
struct NewCartLine {
    user_id: UserId,
    product_id: ProductId,
    quantity: i64,
}

#[derive(Serialize)]
struct QuantityPatch {
    quantity: i64,
}

/// Repository for cart lines.
pub struct CartRepository<'a> {
    api: &'a DataApi,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(api: &'a DataApi) -> Self {
        Self { api }
    }

    /// Open carts grouped by user, newest line first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_grouped(&self) -> Result<Vec<CartGroupedByUser>, RepositoryError> {
        let items: Vec<CartItem> = self
            .api
            .from(TABLE)
            .select("*,product:products(*),user:users(*)")
            .is_null("order_id")
            .order("created_at", false)
            .fetch()
            .await?;

        Ok(group_carts(items))
    }

    /// Open cart lines of one user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn items_for_user(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        Ok(self
            .api
            .from(TABLE)
            .select("*,product:products(*)")
            .eq("user_id", user_id)
            .is_null("order_id")
            .fetch()
            .await?)
    }

    /// Add `quantity` of a product to a user's cart.
    ///
    /// Increments the existing line for this product, or inserts one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidInput` for a non-positive quantity.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<CartLine, RepositoryError> {
        if quantity < 1 {
            return Err(RepositoryError::InvalidInput(
                "quantity must be at least 1".to_owned(),
            ));
        }

        let existing: Option<CartLine> = self
            .api
            .from(TABLE)
            .select("*")
            .eq("user_id", user_id)
            .eq("product_id", product_id)
            .is_null("order_id")
            .maybe_single()
            .await?;

        let line: CartLine = match existing {
            Some(line) => {
                self.api
                    .from(TABLE)
                    .update(&QuantityPatch {
                        quantity: line.quantity + quantity,
                    })?
                    .eq("id", line.id)
                    .returning()
                    .single()
                    .await?
            }
            None => {
                self.api
                    .from(TABLE)
                    .insert(&NewCartLine {
                        user_id,
                        product_id,
                        quantity,
                    })?
                    .returning()
                    .single()
                    .await?
            }
        };

        Ok(line)
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, id: CartItemId) -> Result<(), RepositoryError> {
        self.api.from(TABLE).delete().eq("id", id).execute().await?;
        Ok(())
    }

    /// Set a cart line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidInput` for a non-positive quantity
    /// and `RepositoryError::NotFound` if the line does not exist.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        id: CartItemId,
        quantity: i64,
    ) -> Result<CartLine, RepositoryError> {
        if quantity < 1 {
            return Err(RepositoryError::InvalidInput(
                "quantity must be at least 1".to_owned(),
            ));
        }

        self.api
            .from(TABLE)
            .update(&QuantityPatch { quantity })?
            .eq("id", id)
            .returning()
            .single()
            .await
            .map_err(RepositoryError::from_single)
    }
}
