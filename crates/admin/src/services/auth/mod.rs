//! Admin authentication service.
//!
//! Email/password sign-in against the identity provider. Every sign-in is
//! fed through [`AuthGate::on_auth_state_change`], which makes sure the
//! identity has a matching `users` record and builds the session value.

mod error;

pub use error::AdminAuthError;

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};

use storedesk_core::{Email, UserRole};

use crate::backend::{DataApi, IdentityClient, IdentitySession, IdentityUser};
use crate::db::UserRepository;
use crate::models::{AccessToken, CurrentAdmin, User};

/// Change in the identity provider's signed-in state.
#[derive(Debug)]
pub enum AuthEvent {
    SignedIn(IdentitySession),
    SignedOut,
}

/// Admin authentication gate.
///
/// Drives the identity provider and keeps backend user records in step
/// with it.
pub struct AuthGate<'a> {
    identity: &'a IdentityClient,
    api: &'a DataApi,
    require_admin_role: bool,
}

impl<'a> AuthGate<'a> {
    /// Create a new authentication gate.
    ///
    /// With `require_admin_role`, only identities whose user record has the
    /// `admin` role may sign in, and a failed sync rejects the sign-in.
    #[must_use]
    pub const fn new(
        identity: &'a IdentityClient,
        api: &'a DataApi,
        require_admin_role: bool,
    ) -> Self {
        Self {
            identity,
            api,
            require_admin_role,
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AdminAuthError::InvalidEmail` for a malformed address,
    /// `AdminAuthError::Identity` when the provider rejects the credentials,
    /// and `AdminAuthError::NotAdmin` when admin role is required but missing.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentAdmin, AdminAuthError> {
        let email = Email::parse(email)?;
        let session = self
            .identity
            .sign_in_with_password(email.as_str(), password)
            .await?;

        self.on_auth_state_change(AuthEvent::SignedIn(session))
            .await?
            .ok_or(AdminAuthError::MissingEmail)
    }

    /// Sign out, revoking the provider session when there is one.
    ///
    /// Revocation failures are logged; the local sign-out always happens.
    pub async fn sign_out(&self, admin: Option<&CurrentAdmin>) {
        if let Some(admin) = admin {
            if let Err(e) = self.identity.sign_out(admin.access_token.expose()).await {
                tracing::warn!(error = %e, uid = %admin.uid, "Failed to revoke identity session");
            }
        }

        // SignedOut never fails.
        let _ = self.on_auth_state_change(AuthEvent::SignedOut).await;
    }

    /// React to a sign-in or sign-out.
    ///
    /// On sign-in the identity is matched to its `users` record by email,
    /// creating one with the `user` role on first sign-in. A sync failure
    /// is logged and the sign-in proceeds without a record, unless admin
    /// role is required.
    ///
    /// # Errors
    ///
    /// Only when admin role is required: the sync error, or
    /// `AdminAuthError::NotAdmin`.
    pub async fn on_auth_state_change(
        &self,
        event: AuthEvent,
    ) -> Result<Option<CurrentAdmin>, AdminAuthError> {
        let session = match event {
            AuthEvent::SignedOut => {
                tracing::info!("Admin signed out");
                return Ok(None);
            }
            AuthEvent::SignedIn(session) => session,
        };

        let token = session.access_token.expose_secret();
        let mut admin = CurrentAdmin::new(
            session.user.clone(),
            AccessToken::new(token.to_owned()),
            expires_at(Utc::now(), session.expires_in),
        );

        let api = self.api.with_access_token(token);
        match sync_user(&api, &session.user).await {
            Ok(user) => {
                admin.user_id = Some(user.id);
                admin.role = user.role;
            }
            Err(e) => {
                tracing::error!(error = %e, uid = %session.user.uid, "Failed to sync user with backend");
                if self.require_admin_role {
                    return Err(e);
                }
            }
        }

        if self.require_admin_role && admin.role != UserRole::Admin {
            tracing::warn!(uid = %admin.uid, "Rejected sign-in without admin role");
            return Err(AdminAuthError::NotAdmin);
        }

        tracing::info!(uid = %admin.uid, user_id = ?admin.user_id, "Admin signed in");
        Ok(Some(admin))
    }
}

/// Find the identity's user record, creating it on first sign-in.
async fn sync_user(api: &DataApi, identity: &IdentityUser) -> Result<User, AdminAuthError> {
    let email = identity
        .email
        .as_deref()
        .ok_or(AdminAuthError::MissingEmail)?;
    let email = Email::parse(email)?;

    let users = UserRepository::new(api);
    if let Some(user) = users.get_by_email(email.as_str()).await? {
        return Ok(user);
    }

    Ok(users
        .create(
            &email,
            identity.display_name.as_deref(),
            identity.photo_url.as_deref(),
        )
        .await?)
}

/// Expiry instant for a token issued at `now` lasting `expires_in` seconds.
fn expires_at(now: DateTime<Utc>, expires_in: u64) -> DateTime<Utc> {
    let seconds = i64::try_from(expires_in).unwrap_or(i64::MAX);
    now.checked_add_signed(Duration::seconds(seconds.min(365 * 24 * 60 * 60)))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expires_at_is_clamped() {
        let now = Utc::now();
        assert_eq!(expires_at(now, 3600), now + Duration::seconds(3600));
        assert_eq!(expires_at(now, u64::MAX), now + Duration::days(365));
    }
}
