//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - identity-provider sign-in and user record sync
//! - `dashboard` - date windows and chart aggregation
//! - `filtering` - in-memory search, filter and sort for list pages

pub mod auth;
pub mod dashboard;
pub mod filtering;

pub use auth::{AdminAuthError, AuthEvent, AuthGate};
pub use dashboard::{DashboardStats, DateWindow, WindowQuery};
pub use filtering::{CartFilter, DateRange, DateSort, OrderSearch, StatusFilter};
