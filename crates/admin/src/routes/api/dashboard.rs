//! Dashboard figures as JSON.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use chrono::Utc;
use serde::Serialize;

use crate::{
    error::AppError,
    middleware::auth::RequireAdminAuth,
    services::dashboard::{self, DashboardStats, DateWindow, WindowQuery},
    state::AppState,
};

/// Build the dashboard API router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(stats))
}

/// Response for the dashboard endpoint.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub range: &'static str,
    pub start: String,
    pub end: String,
    #[serde(flatten)]
    pub stats: DashboardStats,
}

/// Chart-ready dashboard figures for a date window.
///
/// GET /api/dashboard?range=7|30|90|custom&start=..&end=..
///
/// # Errors
///
/// Returns 502 when the backend cannot be read.
#[tracing::instrument(skip(admin, state))]
pub async fn stats(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let window = DateWindow::from_query(&query, Utc::now());
    let api = state.api_for(&admin);

    let stats = dashboard::load(&api, &window).await?;

    Ok(Json(DashboardResponse {
        range: window.preset.as_str(),
        start: window.start.to_rfc3339(),
        end: window.end.to_rfc3339(),
        stats,
    }))
}
