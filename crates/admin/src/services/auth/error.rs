//! Admin authentication error types.

use thiserror::Error;

use crate::backend::IdentityError;
use crate::db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] storedesk_core::EmailError),

    /// Identity provider rejected the request.
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// Identity has no email, so it cannot be matched to a user record.
    #[error("identity has no email address")]
    MissingEmail,

    /// Signed in, but the backend user is not an admin.
    #[error("account is not an admin")]
    NotAdmin,

    /// Repository/backend error while syncing the user record.
    #[error("backend error: {0}")]
    Repository(#[from] RepositoryError),
}

impl AdminAuthError {
    /// Message safe to show on the login form.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Please enter a valid email address.".to_owned(),
            Self::Identity(IdentityError::InvalidCredentials(message)) => message.clone(),
            Self::NotAdmin => "This account is not allowed to use the admin console.".to_owned(),
            Self::MissingEmail | Self::Identity(_) | Self::Repository(_) => {
                "Sign-in failed. Please try again.".to_owned()
            }
        }
    }
}
