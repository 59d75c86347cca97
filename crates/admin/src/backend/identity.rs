//! Identity provider client.
//!
//! Talks to the GoTrue-style endpoints under `/auth/v1`:
//!
//! - `POST token?grant_type=password` - email/password sign-in
//! - `GET user` - resolve an access token to its user
//! - `POST logout` - revoke the session behind an access token

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

/// Errors that can occur when talking to the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Email/password rejected; carries the provider's message.
    #[error("{0}")]
    InvalidCredentials(String),

    /// Access token missing, expired, or revoked.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an unexpected error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Base URL did not form a valid endpoint URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// The serializable subset of a signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// A signed-in session issued by the provider.
#[derive(Debug, Clone)]
pub struct IdentitySession {
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    /// Seconds until `access_token` expires.
    pub expires_in: u64,
    pub user: IdentityUser,
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_confirmed_at: Option<String>,
    #[serde(default)]
    user_metadata: Option<Map<String, Value>>,
}

impl From<RawUser> for IdentityUser {
    fn from(raw: RawUser) -> Self {
        let metadata = raw.user_metadata.unwrap_or_default();
        let first_string = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| metadata.get(*k).and_then(Value::as_str))
                .map(str::trim)
                .find(|s| !s.is_empty())
                .map(ToOwned::to_owned)
        };

        Self {
            display_name: first_string(&["display_name", "full_name", "name"]),
            photo_url: first_string(&["avatar_url", "picture"]),
            email_verified: raw.email_confirmed_at.is_some(),
            email: raw.email.filter(|e| !e.trim().is_empty()),
            uid: raw.id,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    user: RawUser,
}

/// Error body; older providers send `error`/`error_description`, newer `msg`.
#[derive(Debug, Default, Deserialize)]
struct RawError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RawError {
    fn message(self) -> Option<String> {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
    }
}

// =============================================================================
// Client
// =============================================================================

/// Identity provider client.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    auth_url: Url,
}

impl IdentityClient {
    /// Create a new identity provider client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value, the base
    /// URL cannot be joined, or the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, IdentityError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| IdentityError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(IdentityClientInner {
                client,
                auth_url: config.auth_url()?,
            }),
        })
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` with the provider's
    /// message when the credentials are rejected.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<IdentitySession, IdentityError> {
        let mut url = self.inner.auth_url.join("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let body = serde_json::json!({
            "email": email,
            "password": password.expose_secret(),
        });
        let response = self.inner.client.post(url).json(&body).send().await?;

        let status = response.status().as_u16();
        if status == 400 || status == 401 || status == 422 {
            let message = Self::error_message(response).await;
            return Err(IdentityError::InvalidCredentials(message));
        }

        let raw: RawSession = Self::handle_response(response).await?;
        Ok(IdentitySession {
            access_token: SecretString::from(raw.access_token),
            refresh_token: raw.refresh_token.map(SecretString::from),
            expires_in: raw.expires_in.unwrap_or(3600),
            user: raw.user.into(),
        })
    }

    /// Resolve an access token to its user.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Unauthorized` if the token is not valid.
    pub async fn get_user(&self, access_token: &str) -> Result<IdentityUser, IdentityError> {
        let url = self.inner.auth_url.join("user")?;
        let response = self
            .inner
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let raw: RawUser = Self::handle_response(response).await?;
        Ok(raw.into())
    }

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` if the provider rejects the request.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let url = self.inner.auth_url.join("logout")?;
        let response = self
            .inner
            .client
            .post(url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, IdentityError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| IdentityError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    async fn parse_error(response: reqwest::Response) -> IdentityError {
        let status = response.status().as_u16();
        let message = Self::error_message(response).await;

        if status == 401 || status == 403 {
            return IdentityError::Unauthorized(message);
        }

        IdentityError::Api { status, message }
    }

    async fn error_message(response: reqwest::Response) -> String {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        serde_json::from_str::<RawError>(&text)
            .ok()
            .and_then(RawError::message)
            .unwrap_or_else(|| format!("HTTP {status}"))
    }
}
