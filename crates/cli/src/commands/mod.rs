//! CLI command implementations.

pub mod dashboard;
pub mod user;

use secrecy::SecretString;
use thiserror::Error;

use storedesk_admin::backend::{DataApi, DataApiError};
use storedesk_admin::config::{BackendConfig, ConfigError};
use storedesk_admin::db::RepositoryError;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Backend configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Table API client could not be built.
    #[error("Backend client error: {0}")]
    Client(#[from] DataApiError),

    /// Backend request failed.
    #[error("Backend error: {0}")]
    Repository(#[from] RepositoryError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, user")]
    InvalidRole(String),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Window length out of range.
    #[error("Invalid number of days: {0}. Use 1 to 3650")]
    InvalidDays(i64),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    /// No such user.
    #[error("No user with email: {0}")]
    UserNotFound(String),
}

/// Table API client for operator commands.
///
/// Uses `BACKEND_SERVICE_KEY` when set, so commands are not limited by
/// row-level policies; otherwise falls back to the anon key.
pub fn backend_api() -> Result<DataApi, CliError> {
    dotenvy::dotenv().ok();

    let mut config = BackendConfig::from_env()?;
    if let Ok(service_key) = std::env::var("BACKEND_SERVICE_KEY") {
        tracing::info!("Using service key");
        config.anon_key = SecretString::from(service_key);
    }

    tracing::info!(backend = %config.base_url, "Connecting to hosted backend...");
    Ok(DataApi::new(&config)?)
}
