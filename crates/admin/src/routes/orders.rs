//! Order route handlers.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use storedesk_core::{OrderId, OrderStatus, Price};

use crate::{
    components::data_table::{DataTableConfig, orders_table_config},
    db::{OrderRepository, UserRepository},
    error::AppError,
    filters,
    middleware::{auth::RequireAdminAuth, set_flash, take_flash},
    models::{Order, OrderItem, OrderRow},
    services::{OrderSearch, StatusFilter, filtering::filter_orders},
    state::AppState,
    store::Fetched,
};

use super::{AdminUserView, path_id, render};

/// Order list query parameters.
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    /// User ID search.
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub email: String,
    pub status: Option<String>,
}

/// Status change form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Status choice on the order page.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Orders list page template.
#[derive(Template)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableConfig,
    pub orders: Vec<OrderRow>,
    pub total: usize,
    pub flash: Option<String>,
    pub error: Option<String>,
}

/// Order detail page template.
#[derive(Template)]
#[template(path = "orders/show.html")]
pub struct OrderShowTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub order: Order,
    pub email: String,
    pub items: Vec<OrderItem>,
    pub item_count: i64,
    pub items_total: Price,
    pub statuses: Vec<StatusOption>,
    pub flash: Option<String>,
    pub error: Option<String>,
}

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(index))
        .route("/orders/{id}", get(show))
        .route("/orders/{id}/status", post(update_status))
}

/// Orders list page handler.
///
/// GET /orders?q=&email=&status=all|pending|processing|completed|cancelled
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrdersQuery>,
) -> Html<String> {
    let status = StatusFilter::parse(query.status.as_deref());
    let search = OrderSearch {
        user_id: query.q.clone(),
        email: query.email.clone(),
    };
    let api = state.api_for(&admin);
    let fetched = Fetched::from_result(
        OrderRepository::new(&api).list_with_emails().await,
        "orders",
    );

    let orders: Vec<OrderRow> = filter_orders(&fetched.data, &search, status)
        .into_iter()
        .cloned()
        .collect();

    let template = OrdersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        table: orders_table_config()
            .searched(query.q.trim())
            .filled("email", query.email.trim())
            .filled("status", status.as_str()),
        total: fetched.data.len(),
        orders,
        flash: take_flash(&session).await,
        error: fetched.error,
    };

    render(&template)
}

/// Order detail page handler.
///
/// GET /orders/{id}
///
/// # Errors
///
/// Returns 404 for an unknown order.
#[instrument(skip(admin, state, session))]
pub async fn show(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: OrderId = path_id(&id, "order")?;
    let api = state.api_for(&admin);
    let orders = OrderRepository::new(&api);

    let order = orders.get_by_id(id).await?;
    let items = Fetched::from_result(orders.items_for_order(id).await, "order items");

    let email = match order.user_id {
        Some(user_id) => UserRepository::new(&api)
            .email_for(user_id)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to look up order email");
                None
            }),
        None => None,
    };

    let current = order.status();
    let statuses = OrderStatus::ALL
        .iter()
        .map(|s| StatusOption {
            value: s.as_str(),
            label: s.label(),
            selected: Some(*s) == current,
        })
        .collect();

    let template = OrderShowTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/orders".to_string(),
        email: email.unwrap_or_else(|| "-".to_string()),
        item_count: items.data.iter().map(|i| i.quantity).sum(),
        items_total: items.data.iter().map(OrderItem::line_total).sum(),
        items: items.data,
        statuses,
        order,
        flash: take_flash(&session).await,
        error: items.error,
    };

    Ok(render(&template))
}

/// Change an order's status.
///
/// POST /orders/{id}/status
///
/// # Errors
///
/// Returns 404 for a malformed id and 400 for an unknown status.
#[instrument(skip(admin, state, session))]
pub async fn update_status(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let id: OrderId = path_id(&id, "order")?;
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("unknown status: {}", form.status)))?;

    let api = state.api_for(&admin);
    match OrderRepository::new(&api).update_status(id, status).await {
        Ok(()) => set_flash(&session, &format!("Order marked {}", status.label())).await,
        Err(e) => {
            tracing::error!("Failed to update order status: {e}");
            set_flash(&session, "Failed to update order status").await;
        }
    }

    Ok(Redirect::to(&format!("/orders/{id}")))
}
