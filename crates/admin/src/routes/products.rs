//! Product catalog route handlers.
//!
//! List with search, create, edit and delete. Form submissions are
//! validated before anything is sent to the backend; a rejected form is
//! re-rendered with the submitted values and one message per problem.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use storedesk_core::ProductId;

use crate::{
    components::data_table::{DataTableConfig, products_table_config},
    db::ProductRepository,
    error::AppError,
    filters,
    middleware::{auth::RequireAdminAuth, set_flash, take_flash},
    models::{Product, ProductForm},
    services::filtering::filter_products,
    state::AppState,
    store::Fetched,
};

use super::{AdminUserView, path_id, render};

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Category choice in the product form.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub value: String,
    pub selected: bool,
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub table: DataTableConfig,
    pub products: Vec<Product>,
    pub total: usize,
    pub flash: Option<String>,
    pub error: Option<String>,
}

/// Create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub admin_user: AdminUserView,
    pub current_path: String,
    pub heading: String,
    pub action: String,
    pub submit_label: String,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub errors: Vec<String>,
}

impl ProductFormTemplate {
    fn new(admin_user: AdminUserView, categories: &[String], form: ProductForm) -> Self {
        let categories = category_options(categories, &form.category);
        Self {
            admin_user,
            current_path: "/products".to_string(),
            heading: "New Product".to_string(),
            action: "/products".to_string(),
            submit_label: "Create Product".to_string(),
            form,
            categories,
            errors: vec![],
        }
    }

    fn editing(mut self, id: ProductId) -> Self {
        self.heading = "Edit Product".to_string();
        self.action = format!("/products/{id}");
        self.submit_label = "Save Changes".to_string();
        self
    }

    fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = errors;
        self
    }
}

/// Configured categories, plus the current one when it is not among them.
fn category_options(categories: &[String], current: &str) -> Vec<CategoryOption> {
    let current = current.trim().to_lowercase();
    let mut options: Vec<CategoryOption> = categories
        .iter()
        .map(|c| CategoryOption {
            value: c.clone(),
            selected: *c == current,
        })
        .collect();

    if !current.is_empty() && !categories.contains(&current) {
        options.push(CategoryOption {
            value: current,
            selected: true,
        });
    }
    options
}

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(index).post(create))
        .route("/products/new", get(new_form))
        .route("/products/{id}", post(update))
        .route("/products/{id}/edit", get(edit_form))
        .route("/products/{id}/delete", post(delete))
}

/// Products list page handler.
///
/// GET /products?q=
#[instrument(skip(admin, state, session))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<SearchQuery>,
) -> Html<String> {
    let api = state.api_for(&admin);
    let fetched = Fetched::from_result(ProductRepository::new(&api).list_all().await, "products");

    let products: Vec<Product> = filter_products(&fetched.data, &query.q)
        .into_iter()
        .cloned()
        .collect();

    let template = ProductsIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/products".to_string(),
        table: products_table_config().searched(query.q.trim()),
        total: fetched.data.len(),
        products,
        flash: take_flash(&session).await,
        error: fetched.error,
    };

    render(&template)
}

/// Empty create form.
///
/// GET /products/new
pub async fn new_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Html<String> {
    render(&ProductFormTemplate::new(
        AdminUserView::from(&admin),
        &state.config().product_categories,
        ProductForm::default(),
    ))
}

/// Create a product.
///
/// POST /products
#[instrument(skip(admin, state, session, form), fields(title = %form.title))]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ProductForm>,
) -> Response {
    let categories = &state.config().product_categories;
    let page = ProductFormTemplate::new(AdminUserView::from(&admin), categories, form.clone());

    let draft = match form.validate(categories) {
        Ok(draft) => draft,
        Err(errors) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, render(&page.with_errors(errors)))
                .into_response();
        }
    };

    let api = state.api_for(&admin);
    match ProductRepository::new(&api).create(&draft.into_new()).await {
        Ok(product) => {
            set_flash(&session, &format!("Created \"{}\"", product.title)).await;
            Redirect::to("/products").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create product: {e}");
            let page = page.with_errors(vec!["Failed to create product".to_string()]);
            (StatusCode::BAD_GATEWAY, render(&page)).into_response()
        }
    }
}

/// Edit form, prefilled from the stored product.
///
/// GET /products/{id}/edit
///
/// # Errors
///
/// Returns 404 for an unknown product.
pub async fn edit_form(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: ProductId = path_id(&id, "product")?;
    let api = state.api_for(&admin);
    let product = ProductRepository::new(&api).get_by_id(id).await?;

    Ok(render(
        &ProductFormTemplate::new(
            AdminUserView::from(&admin),
            &state.config().product_categories,
            ProductForm::from_product(&product),
        )
        .editing(id),
    ))
}

/// Update a product.
///
/// POST /products/{id}
///
/// # Errors
///
/// Returns 404 for a malformed id or an unknown product.
#[instrument(skip(admin, state, session, form))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let id: ProductId = path_id(&id, "product")?;
    let api = state.api_for(&admin);
    let repo = ProductRepository::new(&api);
    let stored = repo.get_by_id(id).await?;

    let categories = &state.config().product_categories;
    let page = ProductFormTemplate::new(AdminUserView::from(&admin), categories, form.clone())
        .editing(id);

    let draft = match form.validate_edit(categories, &stored.category) {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(
                (StatusCode::UNPROCESSABLE_ENTITY, render(&page.with_errors(errors)))
                    .into_response(),
            );
        }
    };

    match repo.update(id, &draft.into_update()).await {
        Ok(product) => {
            set_flash(&session, &format!("Updated \"{}\"", product.title)).await;
            Ok(Redirect::to("/products").into_response())
        }
        Err(e) => {
            tracing::error!("Failed to update product: {e}");
            let page = page.with_errors(vec!["Failed to update product".to_string()]);
            Ok((StatusCode::BAD_GATEWAY, render(&page)).into_response())
        }
    }
}

/// Delete a product.
///
/// POST /products/{id}/delete
///
/// # Errors
///
/// Returns 404 for a malformed id.
#[instrument(skip(admin, state, session))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    let id: ProductId = path_id(&id, "product")?;
    let api = state.api_for(&admin);

    match ProductRepository::new(&api).delete(id).await {
        Ok(()) => set_flash(&session, "Product deleted").await,
        Err(e) => {
            tracing::error!("Failed to delete product: {e}");
            set_flash(&session, "Failed to delete product").await;
        }
    }

    Ok(Redirect::to("/products"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_options_marks_selected() {
        let categories = vec!["cosplay".to_string(), "beauty".to_string()];
        let options = category_options(&categories, "Beauty");
        let selected: Vec<&str> = options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["beauty"]);
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn test_category_options_keeps_unlisted_current() {
        let categories = vec!["cosplay".to_string()];
        let options = category_options(&categories, "legacy");
        assert_eq!(options.len(), 2);
        assert!(options.iter().any(|o| o.value == "legacy" && o.selected));

        assert_eq!(category_options(&categories, "").len(), 1);
    }
}
