//! Clients for the hosted backend.
//!
//! The backend exposes two REST surfaces under one base URL:
//!
//! - `/rest/v1` - a PostgREST-style table API ([`DataApi`])
//! - `/auth/v1` - a GoTrue-style identity provider ([`IdentityClient`])
//!
//! Every request carries the project's public API key in the `apikey`
//! header. Requests made on behalf of a signed-in admin additionally carry
//! the admin's access token as the bearer, so row-level policies apply.

pub mod identity;
mod query;

pub use identity::{IdentityClient, IdentityError, IdentitySession, IdentityUser};
pub use query::{Query, parse_content_range_total};

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::config::BackendConfig;

/// PostgREST error code for "zero (or many) rows where exactly one was requested".
pub const NOT_FOUND_CODE: &str = "PGRST116";

/// Errors that can occur when talking to the hosted table API.
#[derive(Debug, Error)]
pub enum DataApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A single-row request matched no row.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The API key or access token was rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API returned an error response.
    #[error("API error: {status} {code} - {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Failed to serialize a request body.
    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Table name or base URL did not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl DataApiError {
    /// Whether this error is the "no row" signal rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Error body returned by the table API.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    hint: Option<String>,
}

/// Hosted table API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct DataApi {
    inner: Arc<DataApiInner>,
    access_token: Option<Arc<SecretString>>,
}

struct DataApiInner {
    client: reqwest::Client,
    rest_url: Url,
    api_key: SecretString,
}

impl std::fmt::Debug for DataApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataApi")
            .field("rest_url", &self.inner.rest_url.as_str())
            .field("authenticated", &self.access_token.is_some())
            .finish_non_exhaustive()
    }
}

impl DataApi {
    /// Create a new client authenticating with the configured API key.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value, the base
    /// URL cannot be joined, or the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, DataApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.anon_key.expose_secret())
                .map_err(|e| DataApiError::Parse(format!("Invalid API key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(DataApiInner {
                client,
                rest_url: config.rest_url()?,
                api_key: config.anon_key.clone(),
            }),
            access_token: None,
        })
    }

    /// A client that acts as the given signed-in identity.
    #[must_use]
    pub fn with_access_token(&self, token: &str) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            access_token: Some(Arc::new(SecretString::from(token.to_owned()))),
        }
    }

    /// Start a query against a table.
    #[must_use]
    pub fn from(&self, table: &str) -> Query<'_> {
        Query::new(self, table)
    }

    pub(crate) fn client(&self) -> &reqwest::Client {
        &self.inner.client
    }

    pub(crate) fn table_url(&self, table: &str) -> Result<Url, DataApiError> {
        Ok(self.inner.rest_url.join(table)?)
    }

    /// Bearer token: the session's access token, else the API key.
    pub(crate) fn bearer(&self) -> &str {
        self.access_token
            .as_deref()
            .unwrap_or(&self.inner.api_key)
            .expose_secret()
    }

    /// Parse an error response from the table API.
    pub(crate) async fn parse_error(response: reqwest::Response) -> DataApiError {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let body: ApiErrorBody = serde_json::from_str(&text).unwrap_or_default();

        let message = body
            .message
            .clone()
            .or_else(|| body.details.clone())
            .unwrap_or_else(|| if text.is_empty() { format!("HTTP {status}") } else { text });

        if body.code.as_deref() == Some(NOT_FOUND_CODE) {
            return DataApiError::NotFound(message);
        }

        if status == 401 || status == 403 {
            return DataApiError::Unauthorized(message);
        }

        if let Some(hint) = &body.hint {
            tracing::debug!(status, hint = %hint, "Table API hint");
        }

        DataApiError::Api {
            status,
            code: body.code.unwrap_or_default(),
            message,
        }
    }
}
