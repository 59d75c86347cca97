//! Dashboard route handler.

use askama::Template;
use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use chrono::Utc;
use tracing::instrument;

use crate::{
    filters,
    middleware::auth::RequireAdminAuth,
    services::dashboard::{self, DashboardStats, DateWindow, RangePreset, WindowQuery},
    state::AppState,
    store::Fetched,
};

use super::{AdminUserView, render};

/// One option of the date range picker.
#[derive(Debug, Clone)]
pub struct RangeOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Horizontal bar of a server-rendered chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarView {
    pub label: String,
    pub value: String,
    /// Width relative to the largest bar, 0-100.
    pub percent: u32,
    pub color: String,
}

/// Percentage of `max` that `value` represents, clamped to 0-100.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent_of(value: f64, max: f64) -> u32 {
    if max <= 0.0 || value <= 0.0 {
        return 0;
    }
    ((value / max) * 100.0).round().clamp(0.0, 100.0) as u32
}

fn bars(points: Vec<(String, f64, String, String)>) -> Vec<BarView> {
    let max = points.iter().map(|(_, v, _, _)| *v).fold(0.0, f64::max);
    points
        .into_iter()
        .map(|(label, raw, value, color)| BarView {
            label,
            value,
            percent: percent_of(raw, max),
            color,
        })
        .collect()
}

const BAR_COLOR: &str = "#1976d2";

/// Chart bars derived from the dashboard figures.
#[derive(Debug, Clone, Default)]
pub struct DashboardCharts {
    pub status: Vec<BarView>,
    pub daily: Vec<BarView>,
    pub categories: Vec<BarView>,
}

impl From<&DashboardStats> for DashboardCharts {
    #[allow(clippy::cast_precision_loss)]
    fn from(stats: &DashboardStats) -> Self {
        let status = stats
            .orders_by_status
            .iter()
            .map(|s| {
                (
                    s.label.clone(),
                    s.value as f64,
                    s.value.to_string(),
                    s.color.clone(),
                )
            })
            .collect();

        let daily = stats
            .daily_revenue
            .iter()
            .map(|d| {
                (
                    d.x.clone(),
                    d.y,
                    format!("${:.2}", d.y),
                    BAR_COLOR.to_string(),
                )
            })
            .collect();

        let categories = stats
            .revenue_by_category
            .iter()
            .map(|c| {
                (
                    c.label.clone(),
                    c.value,
                    format!("${:.2}", c.value),
                    BAR_COLOR.to_string(),
                )
            })
            .collect();

        Self {
            status: bars(status),
            daily: bars(daily),
            categories: bars(categories),
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub ranges: Vec<RangeOption>,
    pub is_custom: bool,
    pub start: String,
    pub end: String,
    pub stats: DashboardStats,
    pub charts: DashboardCharts,
    pub error: Option<String>,
}

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(index))
}

/// Dashboard page handler.
///
/// GET /dashboard?range=7|30|90|custom&start=YYYY-MM-DD&end=YYYY-MM-DD
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Html<String> {
    let window = DateWindow::from_query(&query, Utc::now());
    let api = state.api_for(&admin);

    let fetched = Fetched::from_result(dashboard::load(&api, &window).await, "dashboard data");

    let ranges = RangePreset::ALL
        .iter()
        .map(|preset| RangeOption {
            value: preset.as_str(),
            label: preset.label(),
            selected: *preset == window.preset,
        })
        .collect();

    let template = DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/dashboard".to_string(),
        ranges,
        is_custom: window.preset == RangePreset::Custom,
        start: window.start_date().format("%Y-%m-%d").to_string(),
        end: window.end_date().format("%Y-%m-%d").to_string(),
        charts: DashboardCharts::from(&fetched.data),
        stats: fetched.data,
        error: fetched.error,
    };

    render(&template)
}
