//! Core types for Storedesk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod images;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use images::ProductImages;
pub use price::Price;
pub use status::*;
