//! Session-related types for admin authentication.
//!
//! Types stored in the session for authentication state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::{UserId, UserRole};

use crate::backend::IdentityUser;

/// Identity-provider access token kept in the session.
///
/// `Debug` is redacted so the token never reaches logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Session-stored admin identity.
///
/// The serializable subset of the identity-provider user, plus the
/// backend `users` record it was synced to (absent when syncing failed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Identity provider user ID.
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// Backend `users.id`, when the sync succeeded.
    pub user_id: Option<UserId>,
    /// Backend role; `User` when unknown.
    pub role: UserRole,
    pub access_token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

impl CurrentAdmin {
    /// Build the session record for a freshly signed-in identity.
    #[must_use]
    pub fn new(
        identity: IdentityUser,
        access_token: AccessToken,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
            email_verified: identity.email_verified,
            display_name: identity.display_name,
            photo_url: identity.photo_url,
            user_id: None,
            role: UserRole::User,
            access_token,
            expires_at,
        }
    }

    /// Name for the navigation bar.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Session keys for admin authentication data.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for a one-shot message shown on the next page render.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn identity() -> IdentityUser {
        IdentityUser {
            uid: "uid-1".to_owned(),
            email: Some("ada@shop.test".to_owned()),
            email_verified: true,
            display_name: None,
            photo_url: None,
        }
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("eyJ.secret.token".to_owned());
        assert!(!format!("{token:?}").contains("secret"));

        let admin = CurrentAdmin::new(identity(), token, Utc::now());
        assert!(!format!("{admin:?}").contains("secret"));
    }

    #[test]
    fn test_session_round_trip_keeps_token() {
        let admin = CurrentAdmin::new(
            identity(),
            AccessToken::new("tok".to_owned()),
            Utc::now(),
        );
        let json = serde_json::to_string(&admin).unwrap();
        let back: CurrentAdmin = serde_json::from_str(&json).unwrap();
        assert_eq!(back.access_token.expose(), "tok");
        assert_eq!(back, admin);
    }

    #[test]
    fn test_name_and_expiry() {
        let now = Utc::now();
        let admin = CurrentAdmin::new(identity(), AccessToken::new("t".to_owned()), now);
        assert_eq!(admin.name(), "ada@shop.test");
        assert!(admin.is_expired(now));
        assert!(!admin.is_expired(now - Duration::seconds(1)));
    }
}
