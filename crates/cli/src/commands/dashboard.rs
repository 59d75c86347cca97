//! Dashboard summary command.
//!
//! Prints the same figures the console dashboard shows, for the last N days.

use chrono::Utc;

use storedesk_admin::services::dashboard::{self, DateWindow, RangePreset};

use super::{CliError, backend_api};

/// Longest window accepted, in days.
const MAX_DAYS: i64 = 3650;

/// Log the dashboard figures for the `days` days up to now.
pub async fn summary(days: i64) -> Result<(), CliError> {
    if !(1..=MAX_DAYS).contains(&days) {
        return Err(CliError::InvalidDays(days));
    }

    let api = backend_api()?;
    let window = DateWindow::last_days(RangePreset::Custom, days, Utc::now());
    let stats = dashboard::load(&api, &window).await?;

    tracing::info!(
        "Dashboard {} to {}",
        window.start_date(),
        window.end_date()
    );
    tracing::info!("  Total revenue:       {}", stats.total_revenue);
    tracing::info!("  Total orders:        {}", stats.total_orders);
    tracing::info!("  Average order value: {}", stats.average_order_value);
    tracing::info!("  Total products:      {}", stats.total_products);

    tracing::info!("Orders by status:");
    for slice in &stats.orders_by_status {
        tracing::info!("  {:<12} {}", slice.label, slice.value);
    }

    tracing::info!("Revenue by category:");
    for category in &stats.revenue_by_category {
        tracing::info!("  {:<12} ${:.2}", category.label, category.value);
    }

    tracing::info!("Daily revenue:");
    for day in &stats.daily_revenue {
        tracing::info!("  {}   ${:.2}", day.x, day.y);
    }

    Ok(())
}
