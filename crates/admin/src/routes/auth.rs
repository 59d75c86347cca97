//! Authentication route handlers for admin.
//!
//! Email/password sign-in through the identity provider. Every sign-in and
//! sign-out goes through the auth gate, which keeps the backend user record
//! in step with the identity.

use askama::Template;
use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;

use crate::filters;
use crate::middleware::{
    OptionalAdminAuth, clear_current_admin, set_current_admin, set_flash, take_flash,
};
use crate::state::AppState;

use super::render;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login page template.
#[derive(Template)]
#[template(path = "auth/login.html")]
struct LoginPageTemplate {
    email: String,
    error: Option<String>,
    notice: Option<String>,
}

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", get(login_page).post(login))
        .route("/auth/logout", post(logout))
}

/// Render the login page, or skip it when already signed in.
///
/// GET /auth/login
async fn login_page(OptionalAdminAuth(admin): OptionalAdminAuth, session: Session) -> Response {
    if admin.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    render(&LoginPageTemplate {
        email: String::new(),
        error: None,
        notice: take_flash(&session).await,
    })
    .into_response()
}

/// Sign in with email and password.
///
/// POST /auth/login
#[tracing::instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let password = SecretString::from(form.password);

    let admin = match state.auth_gate().sign_in(&form.email, &password).await {
        Ok(admin) => admin,
        Err(e) => {
            tracing::warn!(error = %e, "Admin sign-in failed");
            let page = LoginPageTemplate {
                email: form.email,
                error: Some(e.user_message()),
                notice: None,
            };
            return (StatusCode::UNAUTHORIZED, render(&page)).into_response();
        }
    };

    if let Err(e) = set_current_admin(&session, &admin).await {
        tracing::error!("Failed to set session: {}", e);
        let page = LoginPageTemplate {
            email: form.email,
            error: Some("Sign-in failed. Please try again.".to_string()),
            notice: None,
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, render(&page)).into_response();
    }

    Redirect::to("/dashboard").into_response()
}

/// Sign out and clear the session.
///
/// POST /auth/logout
async fn logout(
    OptionalAdminAuth(admin): OptionalAdminAuth,
    State(state): State<AppState>,
    session: Session,
) -> impl IntoResponse {
    state.auth_gate().sign_out(admin.as_ref()).await;

    if let Err(e) = clear_current_admin(&session).await {
        tracing::error!("Failed to clear session: {}", e);
    }
    set_flash(&session, "You have been signed out.").await;

    Redirect::to("/auth/login")
}
