//! API route handlers for admin.
//!
//! JSON endpoints for chart widgets. Signed-out requests get 401 instead of
//! a login redirect.

pub mod dashboard;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn router() -> Router<AppState> {
    Router::new().merge(dashboard::router())
}
