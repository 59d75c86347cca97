//! Search, filter and sort over fetched rows.
//!
//! All filtering happens in memory after a full fetch; the lists involved
//! are small admin views, not paginated feeds.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use storedesk_core::OrderStatus;

use crate::models::{CartGroupedByUser, OrderRow, Product};

/// Case-insensitive substring match. A blank term matches everything.
#[must_use]
pub fn matches_search(field: &str, term: &str) -> bool {
    let term = term.trim();
    term.is_empty() || field.to_lowercase().contains(&term.to_lowercase())
}

/// Products whose title or description contains `term`.
#[must_use]
pub fn filter_products<'a>(products: &'a [Product], term: &str) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| matches_search(&p.title, term) || matches_search(p.description_text(), term))
        .collect()
}

// =============================================================================
// Orders
// =============================================================================

/// Order status filter from the `status` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Parse `all` or a status name; anything unrecognised means `All`.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("" | "all") => Self::All,
            Some(s) => s.parse().map_or(Self::All, Self::Only),
        }
    }

    /// Query-string value for this filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(status) => status.as_str(),
        }
    }

    #[must_use]
    pub fn matches(self, row: &OrderRow) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => row.order.status() == Some(status),
        }
    }
}

/// Independent search terms for the orders page; both must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSearch {
    pub user_id: String,
    pub email: String,
}

impl OrderSearch {
    #[must_use]
    pub fn matches(&self, row: &OrderRow) -> bool {
        let user_id = row.order.user_id.map(|id| id.to_string()).unwrap_or_default();
        matches_search(&user_id, &self.user_id)
            && matches_search(row.email.as_deref().unwrap_or_default(), &self.email)
    }
}

/// Orders matching the status filter and both search terms.
#[must_use]
pub fn filter_orders<'a>(
    rows: &'a [OrderRow],
    search: &OrderSearch,
    status: StatusFilter,
) -> Vec<&'a OrderRow> {
    rows.iter()
        .filter(|row| status.matches(row))
        .filter(|row| search.matches(row))
        .collect()
}

// =============================================================================
// Carts
// =============================================================================

/// Cart ordering by the date of the cart's first line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSort {
    #[default]
    Newest,
    Oldest,
}

impl DateSort {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("oldest") => Self::Oldest,
            _ => Self::Newest,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
        }
    }
}

/// Inclusive calendar-day range in UTC; either end may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Parse `YYYY-MM-DD` bounds, ignoring blank or malformed values.
    #[must_use]
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Self {
        Self {
            start: parse_date(start),
            end: parse_date(end),
        }
    }

    /// Whether `at` falls on or after the start day and on or before the end day.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let after_start = self.start.is_none_or(|d| at >= start_of_day(d));
        let before_end = self.end.is_none_or(|d| at <= end_of_day(d));
        after_start && before_end
    }
}

/// Parse a `YYYY-MM-DD` form value.
#[must_use]
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// 00:00:00.000 UTC on `day`.
#[must_use]
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// 23:59:59.999 UTC on `day`.
#[must_use]
pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Utc.from_utc_datetime(&day.and_time(last_milli))
}

/// Search, date range and sort applied to the carts page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartFilter {
    pub term: String,
    pub range: DateRange,
    pub sort: DateSort,
}

impl CartFilter {
    /// Carts whose owner's email contains the term and whose first line
    /// falls in the range, sorted by that date.
    ///
    /// A cart without a dated line is treated as created `now` when
    /// filtering and as the oldest when sorting.
    #[must_use]
    pub fn apply<'a>(
        &self,
        carts: &'a [CartGroupedByUser],
        now: DateTime<Utc>,
    ) -> Vec<&'a CartGroupedByUser> {
        let mut matched: Vec<&CartGroupedByUser> = carts
            .iter()
            .filter(|cart| matches_search(&cart.user.email, &self.term))
            .filter(|cart| self.range.contains(cart.created_at().unwrap_or(now)))
            .collect();

        // None sorts before Some, so undated carts land last for newest-first.
        // Both sorts are stable; equal dates keep fetch order.
        match self.sort {
            DateSort::Newest => matched.sort_by(|a, b| b.created_at().cmp(&a.created_at())),
            DateSort::Oldest => matched.sort_by_key(|cart| cart.created_at()),
        }
        matched
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn product(title: &str, description: Value) -> Product {
        serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "title": title,
            "description": description,
            "price": 1
        }))
        .unwrap()
    }

    fn order_row(user_id: &str, status: Value, email: Option<&str>) -> OrderRow {
        OrderRow {
            order: serde_json::from_value(json!({
                "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
                "user_id": user_id,
                "total_amount": 10,
                "status": status
            }))
            .unwrap(),
            email: email.map(ToOwned::to_owned),
        }
    }

    fn cart(email: &str, created_at: Option<&str>) -> CartGroupedByUser {
        serde_json::from_value::<Vec<crate::models::CartItem>>(json!([{
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "user_id": "0b7e4c0e-2f7c-4b8a-9a4f-5f1e2d3c4b5a",
            "quantity": 1,
            "created_at": created_at,
            "user": {"id": "0b7e4c0e-2f7c-4b8a-9a4f-5f1e2d3c4b5a", "email": email}
        }]))
        .map(crate::models::group_carts)
        .unwrap()
        .remove(0)
    }

    #[test]
    fn test_matches_search() {
        assert!(matches_search("Red Wig", "wig"));
        assert!(matches_search("Red Wig", "  "));
        assert!(!matches_search("Red Wig", "blue"));
        assert!(matches_search("", ""));
    }

    #[test]
    fn test_filter_products_title_or_description() {
        let products = vec![
            product("Wig", json!("Long and blue")),
            product("Lipstick", Value::Null),
            product("Contacts", json!("Blue lenses")),
        ];

        let hits = filter_products(&products, "BLUE");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "Wig");
        assert_eq!(hits[1].title, "Contacts");
        assert_eq!(filter_products(&products, "").len(), 3);
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::parse(None), StatusFilter::All);
        assert_eq!(StatusFilter::parse(Some("all")), StatusFilter::All);
        assert_eq!(
            StatusFilter::parse(Some("Completed")),
            StatusFilter::Only(OrderStatus::Completed)
        );
        assert_eq!(StatusFilter::parse(Some("bogus")), StatusFilter::All);
    }

    #[test]
    fn test_filter_orders_status_and_search() {
        let rows = vec![
            order_row("0b7e4c0e-2f7c-4b8a-9a4f-5f1e2d3c4b5a", json!("completed"), Some("ada@shop.test")),
            order_row("1c8f5d1f-3a8d-4c9b-8b5a-6a2f3e4d5c6b", Value::Null, None),
            order_row("2d9a6e2a-4b9e-4dac-9c6b-7b3a4f5e6d7c", json!("Pending"), Some("grace@shop.test")),
        ];

        let any = OrderSearch::default();
        assert_eq!(filter_orders(&rows, &any, StatusFilter::All).len(), 3);

        let pending = filter_orders(&rows, &any, StatusFilter::Only(OrderStatus::Pending));
        assert_eq!(pending.len(), 2);

        let by_email = OrderSearch {
            email: "GRACE".to_owned(),
            ..Default::default()
        };
        assert_eq!(filter_orders(&rows, &by_email, StatusFilter::All).len(), 1);

        let by_id = OrderSearch {
            user_id: "1c8f5d1f".to_owned(),
            ..Default::default()
        };
        let hits = filter_orders(&rows, &by_id, StatusFilter::All);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].email.is_none());
    }

    #[test]
    fn test_order_search_terms_narrow_together() {
        let rows = vec![
            order_row("0b7e4c0e-2f7c-4b8a-9a4f-5f1e2d3c4b5a", json!("pending"), Some("ada@shop.test")),
            order_row("0b7e4c0e-9999-4b8a-9a4f-5f1e2d3c4b5a", json!("pending"), Some("grace@shop.test")),
        ];

        let shared_prefix = OrderSearch {
            user_id: "0b7e4c0e".to_owned(),
            ..Default::default()
        };
        assert_eq!(filter_orders(&rows, &shared_prefix, StatusFilter::All).len(), 2);

        let both = OrderSearch {
            user_id: "0b7e4c0e".to_owned(),
            email: "grace".to_owned(),
        };
        let hits = filter_orders(&rows, &both, StatusFilter::All);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].email.as_deref(), Some("grace@shop.test"));

        // A user-id term no longer matches on email.
        let email_in_id_box = OrderSearch {
            user_id: "grace".to_owned(),
            ..Default::default()
        };
        assert!(filter_orders(&rows, &email_in_id_box, StatusFilter::All).is_empty());
    }

    #[test]
    fn test_date_range_is_inclusive_whole_days() {
        let range = DateRange::parse(Some("2024-03-01"), Some("2024-03-02"));
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);

        assert!(range.contains(at("2024-03-01T00:00:00Z")));
        assert!(range.contains(at("2024-03-02T23:59:59.999Z")));
        assert!(!range.contains(at("2024-03-03T00:00:00Z")));
        assert!(!range.contains(at("2024-02-29T23:59:59Z")));
        assert!(DateRange::parse(Some("garbage"), None).contains(at("1999-01-01T00:00:00Z")));
    }

    #[test]
    fn test_cart_filter_sort_and_range() {
        let carts = vec![
            cart("ada@shop.test", Some("2024-03-01T10:00:00Z")),
            cart("grace@shop.test", Some("2024-03-05T10:00:00Z")),
            cart("linus@shop.test", None),
        ];
        let now = DateTime::parse_from_rfc3339("2024-03-10T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let newest = CartFilter::default().apply(&carts, now);
        let emails: Vec<&str> = newest.iter().map(|c| c.user.email.as_str()).collect();
        assert_eq!(emails, vec!["grace@shop.test", "ada@shop.test", "linus@shop.test"]);

        let oldest = CartFilter {
            sort: DateSort::Oldest,
            ..Default::default()
        }
        .apply(&carts, now);
        assert_eq!(oldest[0].user.email, "linus@shop.test");
        assert_eq!(oldest[2].user.email, "grace@shop.test");

        // The undated cart counts as created `now`, outside this range.
        let march_start = CartFilter {
            range: DateRange::parse(Some("2024-03-01"), Some("2024-03-02")),
            ..Default::default()
        }
        .apply(&carts, now);
        assert_eq!(march_start.len(), 1);
        assert_eq!(march_start[0].user.email, "ada@shop.test");

        let search = CartFilter {
            term: "GRACE".to_owned(),
            ..Default::default()
        }
        .apply(&carts, now);
        assert_eq!(search.len(), 1);
    }

    #[test]
    fn test_cart_sort_keeps_fetch_order_for_equal_dates() {
        let carts = vec![
            cart("first@shop.test", Some("2024-03-01T10:00:00Z")),
            cart("second@shop.test", Some("2024-03-01T10:00:00Z")),
            cart("later@shop.test", Some("2024-03-02T10:00:00Z")),
        ];
        let now = DateTime::parse_from_rfc3339("2024-03-10T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let emails = |sort: DateSort| -> Vec<String> {
            CartFilter {
                sort,
                ..Default::default()
            }
            .apply(&carts, now)
            .iter()
            .map(|c| c.user.email.clone())
            .collect()
        };

        assert_eq!(
            emails(DateSort::Newest),
            vec!["later@shop.test", "first@shop.test", "second@shop.test"]
        );
        assert_eq!(
            emails(DateSort::Oldest),
            vec!["first@shop.test", "second@shop.test", "later@shop.test"]
        );
    }
}
