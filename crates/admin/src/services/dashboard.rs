//! Dashboard aggregation.
//!
//! Fetches the orders inside a date window plus product prices and count,
//! then reduces them into totals and chart series. The reducers are pure
//! so they can be tested without a backend.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};

use storedesk_core::{OrderStatus, Price};

use super::filtering::{end_of_day, parse_date, start_of_day};
use crate::backend::DataApi;
use crate::db::products::CategoryPrice;
use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::models::OrderSnapshot;

/// Window used when the query names none or an unusable one.
pub const DEFAULT_DAYS: i64 = 7;

const OTHER_COLOR: &str = "#9e9e9e";
const UNCATEGORIZED: &str = "uncategorized";

/// Dashboard query parameters (`?range=30` or `?range=custom&start=..&end=..`).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WindowQuery {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// The selectable date ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    Last7,
    Last30,
    Last90,
    Custom,
}

impl RangePreset {
    pub const ALL: [Self; 4] = [Self::Last7, Self::Last30, Self::Last90, Self::Custom];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Last7 => "7",
            Self::Last30 => "30",
            Self::Last90 => "90",
            Self::Custom => "custom",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Last7 => "Last 7 Days",
            Self::Last30 => "Last 30 Days",
            Self::Last90 => "Last 90 Days",
            Self::Custom => "Custom Range",
        }
    }

    const fn days(self) -> Option<i64> {
        match self {
            Self::Last7 => Some(7),
            Self::Last30 => Some(30),
            Self::Last90 => Some(90),
            Self::Custom => None,
        }
    }
}

/// Time window the dashboard aggregates over, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub preset: RangePreset,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// The `days` days up to `now`.
    #[must_use]
    pub fn last_days(preset: RangePreset, days: i64, now: DateTime<Utc>) -> Self {
        Self {
            preset,
            start: now - Duration::days(days),
            end: now,
        }
    }

    /// Resolve query parameters into a window.
    ///
    /// A custom range needs both dates and spans whole days; anything
    /// incomplete or unrecognised falls back to the last seven days.
    #[must_use]
    pub fn from_query(query: &WindowQuery, now: DateTime<Utc>) -> Self {
        let preset = match query.range.as_deref().map(str::trim) {
            Some("30") => RangePreset::Last30,
            Some("90") => RangePreset::Last90,
            Some("custom") => RangePreset::Custom,
            _ => RangePreset::Last7,
        };

        if let Some(days) = preset.days() {
            return Self::last_days(preset, days, now);
        }

        let start = parse_date(query.start.as_deref());
        let end = parse_date(query.end.as_deref());
        match (start, end) {
            (Some(start), Some(end)) if start <= end => Self {
                preset,
                start: start_of_day(start),
                end: end_of_day(end),
            },
            _ => Self::last_days(RangePreset::Last7, DEFAULT_DAYS, now),
        }
    }

    /// First day of a custom window, for refilling the form.
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    #[must_use]
    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

// =============================================================================
// Chart Types
// =============================================================================

/// Order counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub cancelled: usize,
    /// Statuses outside the four known ones.
    pub other: usize,
}

impl StatusBreakdown {
    /// Count one order; missing status counts as pending.
    pub fn record(&mut self, raw: Option<&str>) {
        match OrderStatus::parse_lenient(raw) {
            Some(OrderStatus::Pending) => self.pending += 1,
            Some(OrderStatus::Processing) => self.processing += 1,
            Some(OrderStatus::Completed) => self.completed += 1,
            Some(OrderStatus::Cancelled) => self.cancelled += 1,
            None => self.other += 1,
        }
    }

    #[must_use]
    pub const fn get(&self, status: OrderStatus) -> usize {
        match status {
            OrderStatus::Pending => self.pending,
            OrderStatus::Processing => self.processing,
            OrderStatus::Completed => self.completed,
            OrderStatus::Cancelled => self.cancelled,
        }
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.cancelled + self.other
    }

    /// Pie slices: the four statuses always, `other` only when non-zero.
    #[must_use]
    pub fn slices(&self) -> Vec<StatusSlice> {
        let mut slices: Vec<StatusSlice> = OrderStatus::ALL
            .iter()
            .map(|&status| StatusSlice {
                id: status.as_str().to_owned(),
                label: status.label().to_owned(),
                value: self.get(status),
                color: status.color().to_owned(),
            })
            .collect();

        if self.other > 0 {
            slices.push(StatusSlice {
                id: "other".to_owned(),
                label: "Other".to_owned(),
                value: self.other,
                color: OTHER_COLOR.to_owned(),
            });
        }
        slices
    }
}

/// One pie slice of the orders-by-status chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSlice {
    pub id: String,
    pub label: String,
    pub value: usize,
    pub color: String,
}

/// Revenue on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRevenue {
    /// `YYYY-MM-DD`
    pub x: String,
    pub y: f64,
}

/// Summed listed price of the products in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub id: String,
    pub label: String,
    pub value: f64,
}

fn price_as_f64<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(price.to_f64())
}

/// Everything the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    #[serde(serialize_with = "price_as_f64")]
    pub total_revenue: Price,
    pub total_orders: usize,
    pub total_products: u64,
    #[serde(serialize_with = "price_as_f64")]
    pub average_order_value: Price,
    pub revenue_by_category: Vec<CategoryRevenue>,
    pub orders_by_status: Vec<StatusSlice>,
    pub daily_revenue: Vec<DailyRevenue>,
    pub status_breakdown: StatusBreakdown,
}

// =============================================================================
// Reducers
// =============================================================================

/// Capitalise the first character.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Revenue per UTC day, ascending. Undated orders are left out.
#[must_use]
pub fn daily_revenue(orders: &[OrderSnapshot]) -> Vec<DailyRevenue> {
    let mut by_day: BTreeMap<NaiveDate, Price> = BTreeMap::new();
    for order in orders {
        if let Some(created_at) = order.created_at {
            let day = by_day.entry(created_at.date_naive()).or_default();
            *day = *day + order.total_amount;
        }
    }

    by_day
        .into_iter()
        .map(|(day, total)| DailyRevenue {
            x: day.format("%Y-%m-%d").to_string(),
            y: total.to_f64(),
        })
        .collect()
}

/// Listed price summed per category, in first-seen order.
#[must_use]
pub fn revenue_by_category(products: &[CategoryPrice]) -> Vec<CategoryRevenue> {
    let mut totals: Vec<(String, Price)> = Vec::new();
    for product in products {
        let category = product
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);

        match totals.iter_mut().find(|(id, _)| id == category) {
            Some((_, total)) => *total = *total + product.price,
            None => totals.push((category.to_owned(), product.price)),
        }
    }

    totals
        .into_iter()
        .map(|(id, total)| CategoryRevenue {
            label: capitalize(&id),
            value: total.to_f64(),
            id,
        })
        .collect()
}

/// Reduce fetched rows into dashboard figures.
#[must_use]
pub fn summarize(
    orders: &[OrderSnapshot],
    products: &[CategoryPrice],
    total_products: u64,
) -> DashboardStats {
    let total_revenue: Price = orders.iter().map(|o| o.total_amount).sum();
    let total_orders = orders.len();

    let mut status_breakdown = StatusBreakdown::default();
    for order in orders {
        status_breakdown.record(order.status.as_deref());
    }

    DashboardStats {
        total_revenue,
        total_orders,
        total_products,
        average_order_value: total_revenue.average_over(total_orders),
        revenue_by_category: revenue_by_category(products),
        orders_by_status: status_breakdown.slices(),
        daily_revenue: daily_revenue(orders),
        status_breakdown,
    }
}

/// Fetch the window's orders, product prices and product count
/// concurrently, then summarize.
///
/// # Errors
///
/// Returns the first `RepositoryError` among the three fetches.
#[tracing::instrument(skip(api), fields(start = %window.start, end = %window.end))]
pub async fn load(api: &DataApi, window: &DateWindow) -> Result<DashboardStats, RepositoryError> {
    let orders = OrderRepository::new(api);
    let products = ProductRepository::new(api);

    let (snapshots, prices, count) = tokio::join!(
        orders.snapshots_between(window.start, window.end),
        products.category_prices(),
        products.count(),
    );

    Ok(summarize(&snapshots?, &prices?, count?))
}
