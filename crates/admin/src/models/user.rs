//! Backend `users` rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storedesk_core::{UserId, UserRole};

use super::null_as_default;

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Display name, falling back to the email address.
    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Insert body for a new user. The ID is generated client-side.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub role: UserRole,
}

/// Partial update of a user; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl UserUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.display_name.is_none()
            && self.photo_url.is_none()
            && self.role.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_tolerates_null_role_and_missing_columns() {
        let user: User = serde_json::from_value(json!({
            "id": "6f1c1f60-4d3e-4c1b-9a51-0d7c4a2e9b11",
            "email": "ada@shop.test",
            "role": null
        }))
        .unwrap();

        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.name(), "ada@shop.test");
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let update = UserUpdate {
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({"role": "admin"}));
        assert!(UserUpdate::default().is_empty());
    }
}
