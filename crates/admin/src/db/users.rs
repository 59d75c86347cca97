//! User repository.

use serde::Deserialize;
use tracing::instrument;

use storedesk_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::backend::{DataApi, IdentityUser};
use crate::models::{NewUser, User, UserUpdate};

const TABLE: &str = "users";

/// Repository for the `users` table.
pub struct UserRepository<'a> {
    api: &'a DataApi,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(api: &'a DataApi) -> Self {
        Self { api }
    }

    /// Look a user up by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails. A missing user
    /// is `Ok(None)`, not an error.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .api
            .from(TABLE)
            .select("*")
            .eq("email", email)
            .maybe_single()
            .await?)
    }

    /// Look a user up by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .api
            .from(TABLE)
            .select("*")
            .eq("id", id)
            .maybe_single()
            .await?)
    }

    /// Create a user with a client-generated ID and the `user` role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the insert is rejected (for
    /// example, a duplicate email).
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        email: &Email,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> Result<User, RepositoryError> {
        let row = NewUser {
            id: UserId::generate(),
            email: email.as_str().to_owned(),
            display_name: display_name.map(ToOwned::to_owned),
            photo_url: photo_url.map(ToOwned::to_owned),
            role: UserRole::User,
        };

        let user: User = self
            .api
            .from(TABLE)
            .insert(&row)?
            .returning()
            .single()
            .await?;

        tracing::info!(user_id = %user.id, "Created user record");
        Ok(user)
    }

    /// Apply a partial update and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidInput` for an empty update and
    /// `RepositoryError::NotFound` if no user has this ID.
    #[instrument(skip(self, changes), fields(user_id = %id))]
    pub async fn update(&self, id: UserId, changes: &UserUpdate) -> Result<User, RepositoryError> {
        if changes.is_empty() {
            return Err(RepositoryError::InvalidInput("no changes given".to_owned()));
        }

        self.api
            .from(TABLE)
            .update(changes)?
            .eq("id", id)
            .returning()
            .single()
            .await
            .map_err(RepositoryError::from_single)
    }

    /// Email address of a user, if the user exists and has one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    pub async fn email_for(&self, user_id: UserId) -> Result<Option<String>, RepositoryError> {
        #[derive(Deserialize)]
        struct EmailOnly {
            #[serde(default)]
            email: Option<String>,
        }

        let row: Option<EmailOnly> = self
            .api
            .from(TABLE)
            .select("email")
            .eq("id", user_id)
            .maybe_single()
            .await?;

        Ok(row.and_then(|r| r.email))
    }

    /// Backend record for the signed-in identity.
    ///
    /// Returns `None` when nobody is signed in, the identity has no email,
    /// or no record matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Api` if the request fails.
    pub async fn current_user(
        &self,
        identity: Option<&IdentityUser>,
    ) -> Result<Option<User>, RepositoryError> {
        let Some(email) = identity.and_then(|i| i.email.as_deref()) else {
            return Ok(None);
        };
        self.get_by_email(email).await
    }
}
