//! Repositories over the hosted table API.
//!
//! # Tables
//!
//! - `users` - backend user records (synced from the identity provider)
//! - `products` - catalog
//! - `orders` - placed orders
//! - `cart_items` - cart lines (`order_id` null) and order lines (`order_id` set)
//!
//! Every repository borrows a [`DataApi`] that already carries the caller's
//! credentials, so the same code serves the console (signed-in admin) and
//! the CLI (service key).

pub mod carts;
pub mod orders;
pub mod products;
pub mod users;

use thiserror::Error;

use crate::backend::DataApiError;

pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Hosted API error.
    #[error("backend error: {0}")]
    Api(#[from] DataApiError),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Caller supplied a value the backend would reject.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl RepositoryError {
    /// Map the backend's "no row" signal onto [`RepositoryError::NotFound`].
    pub(crate) fn from_single(err: DataApiError) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::Api(err)
        }
    }
}
