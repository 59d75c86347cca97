//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::backend::{DataApi, DataApiError, IdentityClient, IdentityError};
use crate::config::AdminConfig;
use crate::models::CurrentAdmin;
use crate::services::AuthGate;

/// Errors building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("table API client: {0}")]
    DataApi(#[from] DataApiError),
    #[error("identity client: {0}")]
    Identity(#[from] IdentityError),
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    data_api: DataApi,
    identity: IdentityClient,
}

impl AppState {
    /// Build the backend clients from configuration.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if either HTTP client cannot be built.
    pub fn new(config: AdminConfig) -> Result<Self, StateError> {
        let data_api = DataApi::new(&config.backend)?;
        let identity = IdentityClient::new(&config.backend)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                data_api,
                identity,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Table API client acting as the signed-in admin.
    #[must_use]
    pub fn api_for(&self, admin: &CurrentAdmin) -> DataApi {
        self.inner
            .data_api
            .with_access_token(admin.access_token.expose())
    }

    /// Authentication gate bound to this state's clients.
    #[must_use]
    pub fn auth_gate(&self) -> AuthGate<'_> {
        AuthGate::new(
            &self.inner.identity,
            &self.inner.data_api,
            self.inner.config.require_admin_role,
        )
    }
}
