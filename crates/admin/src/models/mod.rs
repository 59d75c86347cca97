//! Domain models for the admin console.
//!
//! Each type mirrors a row (or an embedded row) of the hosted backend's
//! tables. Rows are loosely typed in storage, so optional columns default
//! rather than fail.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{CartGroupedByUser, CartItem, group_carts};
pub use order::{Order, OrderItem, OrderItemProduct, OrderRow, OrderSnapshot};
pub use product::{NewProduct, Product, ProductDraft, ProductForm, ProductUpdate};
pub use session::{AccessToken, CurrentAdmin, keys as session_keys};
pub use user::{NewUser, User, UserUpdate};

use serde::{Deserialize, Deserializer};

/// Deserialize a column that may be `null`, using the type's default instead.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
