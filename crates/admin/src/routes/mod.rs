//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Auth (email/password via the identity provider)
//! GET  /auth/login                  - Login page
//! POST /auth/login                  - Sign in
//! POST /auth/logout                 - Sign out
//!
//! # Dashboard
//! GET  /                            - Redirect to /dashboard
//! GET  /dashboard                   - Cards and charts for a date window
//! GET  /api/dashboard               - Same figures as JSON
//!
//! # Products
//! GET  /products                    - Product table with search
//! GET  /products/new                - Create form
//! POST /products                    - Create
//! GET  /products/{id}/edit          - Edit form
//! POST /products/{id}               - Update
//! POST /products/{id}/delete        - Delete
//!
//! # Orders
//! GET  /orders                      - Order table with status filter
//! GET  /orders/{id}                 - Order lines
//! POST /orders/{id}/status          - Update status
//!
//! # Carts
//! GET  /carts                       - Open carts grouped by user
//! POST /carts/items/{id}/quantity   - Update a cart line quantity
//! POST /carts/items/{id}/delete     - Remove a cart line
//! ```

pub mod api;
pub mod auth;
pub mod carts;
pub mod dashboard;
pub mod orders;
pub mod products;

use askama::Template;
use axum::{
    Router,
    response::{Html, Redirect},
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::create_session_layer;
use crate::models::CurrentAdmin;
use crate::state::AppState;

/// Stylesheets and images, relative to the workspace root.
const STATIC_DIR: &str = "crates/admin/static";

/// Signed-in admin shown in the page header.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub photo_url: Option<String>,
    pub is_admin: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name().to_string(),
            email: admin.email.clone().unwrap_or_default(),
            photo_url: admin.photo_url.clone(),
            is_admin: admin.role == storedesk_core::UserRole::Admin,
        }
    }
}

/// Render a page, logging template failures.
pub(crate) fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

/// Parse an id from a path segment; a malformed id is reported as not found.
pub(crate) fn path_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    storedesk_core::parse_id(raw).ok_or_else(|| AppError::NotFound(format!("{what} {raw}")))
}

/// Create all console routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/dashboard") }))
        .merge(auth::router())
        .merge(dashboard::router())
        .merge(api::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(carts::router())
}

/// Build the full application: routes, static files, sessions and tracing.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
