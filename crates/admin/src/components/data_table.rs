//! Data table component types.
//!
//! These types describe the list pages of the console: column headers, the
//! filter bar above the table and the empty state. The current filter
//! values are filled in per request so the bar re-renders what was asked.

use serde::{Deserialize, Serialize};

use storedesk_core::OrderStatus;

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Right-aligned numeric column.
    pub numeric: bool,
}

impl TableColumn {
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            numeric: false,
        }
    }

    /// Create a right-aligned column for amounts and counts.
    #[must_use]
    pub fn numeric(key: &str, label: &str) -> Self {
        Self {
            numeric: true,
            ..Self::new(key, label)
        }
    }
}

/// Filter type for data tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    /// Single-select dropdown.
    Select,
    /// Calendar date input (`YYYY-MM-DD`).
    Date,
    /// Free-text search box.
    Text,
}

/// Option for select filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterOption {
    /// Option value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl FilterOption {
    /// Create a new filter option.
    #[must_use]
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
        }
    }
}

/// Filter definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFilter {
    /// Query parameter key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Filter type.
    pub filter_type: FilterType,
    /// Available options (for selects).
    pub options: Vec<FilterOption>,
    /// Value submitted with the current request.
    pub value: String,
}

impl TableFilter {
    /// Create a select filter; the first option is the default.
    #[must_use]
    pub fn select(key: &str, label: &str, options: Vec<FilterOption>) -> Self {
        let value = options.first().map(|o| o.value.clone()).unwrap_or_default();
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Select,
            options,
            value,
        }
    }

    /// Create a date filter.
    #[must_use]
    pub fn date(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            filter_type: FilterType::Date,
            options: vec![],
            value: String::new(),
        }
    }

    /// Create a free-text filter.
    #[must_use]
    pub fn text(key: &str, label: &str) -> Self {
        Self {
            filter_type: FilterType::Text,
            ..Self::date(key, label)
        }
    }

    #[must_use]
    pub fn is_text(&self) -> bool {
        self.filter_type == FilterType::Text
    }

    #[must_use]
    pub fn is_select(&self) -> bool {
        self.filter_type == FilterType::Select
    }

    /// Whether `option` is the selected value of this filter.
    #[must_use]
    pub fn is_selected(&self, option: &FilterOption) -> bool {
        option.value == self.value
    }
}

/// Configuration for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTableConfig {
    /// Unique table identifier.
    pub table_id: String,
    /// Column definitions.
    pub columns: Vec<TableColumn>,
    /// Filter definitions.
    pub filters: Vec<TableFilter>,
    /// Search placeholder text.
    pub search_placeholder: String,
    /// Current search term.
    pub search_value: String,
    /// Title for empty state.
    pub empty_title: String,
    /// Description for empty state.
    pub empty_description: Option<String>,
}

impl DataTableConfig {
    /// Create a new data table configuration.
    #[must_use]
    pub fn new(table_id: &str) -> Self {
        Self {
            table_id: table_id.to_string(),
            columns: vec![],
            filters: vec![],
            search_placeholder: "Search...".to_string(),
            search_value: String::new(),
            empty_title: "No items found".to_string(),
            empty_description: None,
        }
    }

    /// Add a column.
    #[must_use]
    pub fn column(mut self, column: TableColumn) -> Self {
        self.columns.push(column);
        self
    }

    /// Add a filter.
    #[must_use]
    pub fn filter(mut self, filter: TableFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set search placeholder.
    #[must_use]
    pub fn search_placeholder(mut self, placeholder: &str) -> Self {
        self.search_placeholder = placeholder.to_string();
        self
    }

    /// Set empty state configuration.
    #[must_use]
    pub fn empty_state(mut self, title: &str, description: Option<&str>) -> Self {
        self.empty_title = title.to_string();
        self.empty_description = description.map(ToString::to_string);
        self
    }

    /// Record the submitted search term.
    #[must_use]
    pub fn searched(mut self, term: &str) -> Self {
        self.search_value = term.to_string();
        self
    }

    /// Record the submitted value of filter `key`. Unknown keys are ignored.
    #[must_use]
    pub fn filled(mut self, key: &str, value: &str) -> Self {
        if let Some(filter) = self.filters.iter_mut().find(|f| f.key == key) {
            filter.value = value.to_string();
        }
        self
    }

    /// Whether any filter differs from its default.
    #[must_use]
    pub fn has_active_filters(&self) -> bool {
        !self.search_value.is_empty()
            || self.filters.iter().any(|f| match f.filter_type {
                FilterType::Select => f.options.first().is_some_and(|o| o.value != f.value),
                FilterType::Date | FilterType::Text => !f.value.is_empty(),
            })
    }
}

/// Build the products table configuration.
#[must_use]
pub fn products_table_config() -> DataTableConfig {
    DataTableConfig::new("products")
        .column(TableColumn::new("image", ""))
        .column(TableColumn::new("title", "Title"))
        .column(TableColumn::new("description", "Description"))
        .column(TableColumn::new("category", "Category"))
        .column(TableColumn::numeric("price", "Price"))
        .column(TableColumn::numeric("stock", "Stock"))
        .column(TableColumn::new("featured", "Featured"))
        .column(TableColumn::new("actions", ""))
        .search_placeholder("Search products by title or description...")
        .empty_state("No products found", Some("Try a different search term"))
}

/// Build the orders table configuration.
#[must_use]
pub fn orders_table_config() -> DataTableConfig {
    let mut statuses = vec![FilterOption::new("all", "All")];
    statuses.extend(
        OrderStatus::ALL
            .iter()
            .map(|s| FilterOption::new(s.as_str(), s.label())),
    );

    DataTableConfig::new("orders")
        .column(TableColumn::new("id", "Order"))
        .column(TableColumn::new("customer", "Customer"))
        .column(TableColumn::numeric("total", "Total"))
        .column(TableColumn::new("status", "Status"))
        .column(TableColumn::new("created", "Placed"))
        .column(TableColumn::new("actions", ""))
        .filter(TableFilter::select("status", "Status", statuses))
        .filter(TableFilter::text("email", "Email"))
        .search_placeholder("Search by user ID...")
        .empty_state("No orders found", Some("Try adjusting your search or filters"))
}

/// Build the carts table configuration.
#[must_use]
pub fn carts_table_config() -> DataTableConfig {
    DataTableConfig::new("carts")
        .column(TableColumn::new("customer", "Customer"))
        .column(TableColumn::new("items", "Items"))
        .column(TableColumn::numeric("quantity", "Quantity"))
        .column(TableColumn::numeric("total", "Total"))
        .column(TableColumn::new("created", "Created"))
        .filter(TableFilter::select(
            "sort",
            "Sort",
            vec![
                FilterOption::new("newest", "Newest first"),
                FilterOption::new("oldest", "Oldest first"),
            ],
        ))
        .filter(TableFilter::date("start", "From"))
        .filter(TableFilter::date("end", "To"))
        .search_placeholder("Search carts by email...")
        .empty_state("No active carts", Some("Try adjusting your search or dates"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_status_filter_lists_every_status() {
        let config = orders_table_config();
        let status = config.filters.first().expect("status filter");
        let values: Vec<&str> = status.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["all", "pending", "processing", "completed", "cancelled"]
        );
        assert_eq!(status.value, "all");
    }

    #[test]
    fn test_filled_sets_value_and_marks_active() {
        let config = carts_table_config();
        assert!(!config.has_active_filters());

        let config = config.filled("start", "2024-01-01").filled("missing", "x");
        let start = config.filters.iter().find(|f| f.key == "start").expect("start");
        assert_eq!(start.value, "2024-01-01");
        assert!(config.has_active_filters());
    }

    #[test]
    fn test_orders_email_filter_marks_active() {
        let config = orders_table_config();
        let email = config.filters.iter().find(|f| f.key == "email").expect("email filter");
        assert!(email.is_text());
        assert!(!config.has_active_filters());

        assert!(config.filled("email", "ada@").has_active_filters());
    }

    #[test]
    fn test_searched_marks_active() {
        let config = products_table_config().searched("mask");
        assert_eq!(config.search_value, "mask");
        assert!(config.has_active_filters());
    }

    #[test]
    fn test_is_selected() {
        let config = orders_table_config().filled("status", "completed");
        let status = config.filters.first().expect("status filter");
        let selected: Vec<&str> = status
            .options
            .iter()
            .filter(|o| status.is_selected(o))
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["completed"]);
    }
}
