//! Product repository.

use serde::Deserialize;
use tracing::instrument;

use storedesk_core::{Price, ProductId};

use super::RepositoryError;
use crate::backend::DataApi;
use crate::models::{NewProduct, Product, ProductUpdate};

const TABLE: &str = "products";

/// The two product columns the category chart needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryPrice {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "crate::models::null_as_default")]
    pub price: Price,
}

/// Repository for the `products` table.
pub struct ProductRepository<'a> {
    api: &'a DataApi,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(api: &'a DataApi) -> Self {
        Self { api }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .api
            .from(TABLE)
            .select("*")
            .order("created_at", false)
            .fetch()
            .await?)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_by_id(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.api
            .from(TABLE)
            .select("*")
            .eq("id", id)
            .single()
            .await
            .map_err(RepositoryError::from_single)
    }

    /// Insert a product and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidInput` for a blank title, or
    /// `RepositoryError::Api` if the insert is rejected.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        if product.title.trim().is_empty() {
            return Err(RepositoryError::InvalidInput("title is required".to_owned()));
        }

        let created: Product = self
            .api
            .from(TABLE)
            .insert(product)?
            .returning()
            .single()
            .await?;

        tracing::info!(product_id = %created.id, "Created product");
        Ok(created)
    }

    /// Apply a partial update and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this ID.
    #[instrument(skip(self, changes), fields(product_id = %id))]
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        self.api
            .from(TABLE)
            .update(changes)?
            .eq("id", id)
            .returning()
            .single()
            .await
            .map_err(RepositoryError::from_single)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.api.from(TABLE).delete().eq("id", id).execute().await?;
        tracing::info!(product_id = %id, "Deleted product");
        Ok(())
    }

    /// Exact number of products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(self.api.from(TABLE).select("id").count().await?)
    }

    /// Category and price of every product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    pub async fn category_prices(&self) -> Result<Vec<CategoryPrice>, RepositoryError> {
        Ok(self
            .api
            .from(TABLE)
            .select("category,price")
            .fetch()
            .await?)
    }
}
