//! Newtype IDs for type-safe entity references.
//!
//! Every table in the hosted backend keys its rows by UUID. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing IDs
//! from different tables.

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around `uuid::Uuid` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `generate()`, `as_uuid()`
/// - `Display` and `FromStr` using the hyphenated form
///
/// # Example
///
/// ```rust
/// # use storedesk_core::define_id;
/// define_id!(ReviewId);
/// define_id!(CouponId);
///
/// let review_id = ReviewId::generate();
/// let parsed: ReviewId = review_id.to_string().parse().unwrap();
/// assert_eq!(review_id, parsed);
///
/// // These are different types, so this won't compile:
/// // let _: CouponId = review_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn new(id: ::uuid::Uuid) -> Self {
                Self(id)
            }

            /// Generate a fresh random (v4) ID.
            #[must_use]
            pub fn generate() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0.hyphenated())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(id: ::uuid::Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(OrderId);
// Order lines and cart lines share the `cart_items` table.
define_id!(CartItemId);

/// Parse any of the ID types from a path segment, returning `None` on garbage.
#[must_use]
pub fn parse_id<T: core::str::FromStr>(raw: &str) -> Option<T> {
    raw.parse().ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_display_is_hyphenated() {
        let id = ProductId::new(Uuid::parse_str("6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11").unwrap());
        assert_eq!(id.to_string(), "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11");
    }

    #[test]
    fn test_from_str_trims_whitespace() {
        let id: OrderId = " 6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11 ".parse().unwrap();
        assert_eq!(id.to_string(), "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11");
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id::<UserId>("not-a-uuid").is_none());
        assert!(parse_id::<UserId>("").is_none());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = CartItemId::new(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
        let back: CartItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(UserId::generate(), UserId::generate());
    }
}
