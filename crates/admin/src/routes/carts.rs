//! Cart route handlers.
//!
//! Open carts (cart lines not yet attached to an order) grouped by their
//! owner, with email search, a creation-date range and date sorting.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use storedesk_core::CartItemId;

use crate::{
    components::data_table::{DataTableConfig, carts_table_config},
    db::CartRepository,
    error::AppError,
    filters,
    middleware::{auth::RequireAdminAuth, set_flash, take_flash},
    models::CartGroupedByUser,
    services::{CartFilter, DateRange, DateSort},
    state::AppState,
    store::Fetched,
};

use super::{AdminUserView, path_id, render};

/// Cart list query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CartsQuery {
    #[serde(default)]
    pub q: String,
    pub sort: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl CartsQuery {
    fn to_filter(&self) -> CartFilter {
        CartFilter {
            term: self.q.trim().to_string(),
            range: DateRange::parse(self.start.as_deref(), self.end.as_deref()),
            sort: DateSort::parse(self.sort.as_deref()),
        }
    }
}

/// Quantity change form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: i64,
}

/// Carts list page template.
#[derive(Template)]
#[template(path = "carts/index.html")]
pub struct CartsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableConfig,
    pub carts: Vec<CartGroupedByUser>,
    pub total: usize,
    pub flash: Option<String>,
    pub error: Option<String>,
}

/// Build the carts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/carts", get(index))
        .route("/carts/items/{id}/quantity", post(update_quantity))
        .route("/carts/items/{id}/delete", post(remove_item))
}

/// Carts list page handler.
///
/// GET /carts?q=&sort=newest|oldest&start=YYYY-MM-DD&end=YYYY-MM-DD
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CartsQuery>,
) -> Html<String> {
    let filter = query.to_filter();
    let api = state.api_for(&admin);
    let fetched = Fetched::from_result(CartRepository::new(&api).list_grouped().await, "carts");

    let carts: Vec<CartGroupedByUser> = filter
        .apply(&fetched.data, Utc::now())
        .into_iter()
        .cloned()
        .collect();

    let table = carts_table_config()
        .searched(&filter.term)
        .filled("sort", filter.sort.as_str())
        .filled("start", query.start.as_deref().unwrap_or_default())
        .filled("end", query.end.as_deref().unwrap_or_default());

    let template = CartsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/carts".to_string(),
        table,
        total: fetched.data.len(),
        carts,
        flash: take_flash(&session).await,
        error: fetched.error,
    };

    render(&template)
}

/// Change a cart line's quantity.
///
/// POST /carts/items/{id}/quantity
///
/// # Errors
///
/// Returns 404 for a malformed id.
#[instrument(skip(admin, state, session))]
pub async fn update_quantity(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect, AppError> {
    let id: CartItemId = path_id(&id, "cart item")?;
    let api = state.api_for(&admin);

    match CartRepository::new(&api)
        .update_quantity(id, form.quantity)
        .await
    {
        Ok(_) => set_flash(&session, "Quantity updated").await,
        Err(e) => {
            tracing::error!("Failed to update cart quantity: {e}");
            set_flash(&session, "Failed to update quantity").await;
        }
    }

    Ok(Redirect::to("/carts"))
}

/// Remove a cart line.
///
/// POST /carts/items/{id}/delete
///
/// # Errors
///
/// Returns 404 for a malformed id.
#[instrument(skip(admin, state, session))]
pub async fn remove_item(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id: CartItemId = path_id(&id, "cart item")?;
    let api = state.api_for(&admin);

    match CartRepository::new(&api).remove_item(id).await {
        Ok(()) => set_flash(&session, "Item removed from cart").await,
        Err(e) => {
            tracing::error!("Failed to remove cart item: {e}");
            set_flash(&session, "Failed to remove item").await;
        }
    }

    Ok(Redirect::to("/carts"))
}
