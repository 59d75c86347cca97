//! Storedesk Core - Shared domain types.
//!
//! This crate provides the vocabulary shared by the Storedesk components:
//! - `admin` - The administrative web console
//! - `cli` - Operator commands for user management and reporting
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O and no HTTP
//! clients. Rows fetched from the hosted table API are mapped onto these
//! types by the admin crate.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, prices, statuses and product images

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
