//! Backend user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a user record ahead of their first sign-in
//! sd-cli user create -e admin@example.com -n "Admin Name"
//!
//! # Grant console access when ADMIN_REQUIRE_ADMIN_ROLE is set
//! sd-cli user set-role -e admin@example.com -r admin
//! ```
//!
//! # Environment Variables
//!
//! - `BACKEND_URL` - Hosted backend base URL
//! - `BACKEND_ANON_KEY` - Public API key
//! - `BACKEND_SERVICE_KEY` - Optional service key that bypasses row-level policies

use storedesk_admin::db::UserRepository;
use storedesk_admin::models::UserUpdate;
use storedesk_core::{Email, UserId, UserRole};

use super::{CliError, backend_api};

/// Create a new user record with the `user` role.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create_user(email: &str, name: Option<&str>) -> Result<UserId, CliError> {
    let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;

    let api = backend_api()?;
    let users = UserRepository::new(&api);

    if users.get_by_email(email.as_str()).await?.is_some() {
        return Err(CliError::UserExists(email.to_string()));
    }

    tracing::info!("Creating user: {}", email);
    let user = users.create(&email, name, None).await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    tracing::info!("The user can now sign in; promote them with 'user set-role' for admin access.");

    Ok(user.id)
}

/// Change the role of an existing user.
pub async fn set_role(email: &str, role: &str) -> Result<(), CliError> {
    let role: UserRole = role
        .parse()
        .map_err(|_| CliError::InvalidRole(role.to_owned()))?;
    let email = Email::parse(email).map_err(|_| CliError::InvalidEmail(email.to_owned()))?;

    let api = backend_api()?;
    let users = UserRepository::new(&api);

    let user = users
        .get_by_email(email.as_str())
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.to_string()))?;

    if user.role == role {
        tracing::info!("{} already has role {}", email, role);
        return Ok(());
    }

    let changes = UserUpdate {
        role: Some(role),
        ..UserUpdate::default()
    };
    let user = users.update(user.id, &changes).await?;

    tracing::info!("Role updated! Email: {}, Role: {}", user.email, user.role);
    Ok(())
}
