//! HTTP middleware for admin.
//!
//! - `auth` - extractors gating handlers on a signed-in admin
//! - `session` - cookie session layer

pub mod auth;
pub mod session;

pub use auth::{
    OptionalAdminAuth, RequireAdminAuth, clear_current_admin, set_current_admin, set_flash,
    take_flash,
};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
