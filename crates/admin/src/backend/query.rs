//! Query builder for the hosted table API.
//!
//! Mirrors the PostgREST URL grammar: filters are `column=op.value` query
//! parameters, `select` may embed related tables as `alias:table(cols)`,
//! and response shape is negotiated through `Accept` and `Prefer` headers.

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{DataApi, DataApiError};

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

/// A pending request against one table.
#[must_use]
pub struct Query<'a> {
    api: &'a DataApi,
    table: String,
    method: Method,
    params: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    returning: bool,
}

impl<'a> Query<'a> {
    pub(super) fn new(api: &'a DataApi, table: &str) -> Self {
        Self {
            api,
            table: table.to_owned(),
            method: Method::GET,
            params: Vec::new(),
            body: None,
            returning: false,
        }
    }

    fn param(mut self, key: &str, value: String) -> Self {
        self.params.push((key.to_owned(), value));
        self
    }

    /// Columns to return, e.g. `*` or `id,title,product:products(id,title)`.
    pub fn select(self, columns: &str) -> Self {
        self.param("select", columns.to_owned())
    }

    /// `column = value`
    pub fn eq(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.param(column, format!("eq.{value}"))
    }

    /// `column >= value`
    pub fn gte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.param(column, format!("gte.{value}"))
    }

    /// `column <= value`
    pub fn lte(self, column: &str, value: impl std::fmt::Display) -> Self {
        self.param(column, format!("lte.{value}"))
    }

    /// `column IS NULL`
    pub fn is_null(self, column: &str) -> Self {
        self.param(column, "is.null".to_owned())
    }

    /// Sort by a column.
    pub fn order(self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.param("order", format!("{column}.{direction}"))
    }

    /// Return at most `n` rows.
    pub fn limit(self, n: usize) -> Self {
        self.param("limit", n.to_string())
    }

    /// Turn this into an insert of `row`.
    ///
    /// # Errors
    ///
    /// Returns `DataApiError::Serialize` if the row cannot be serialized.
    pub fn insert<T: Serialize + ?Sized>(mut self, row: &T) -> Result<Self, DataApiError> {
        self.method = Method::POST;
        self.body = Some(serde_json::to_value(row)?);
        Ok(self)
    }

    /// Turn this into an update applying `patch` to every matching row.
    ///
    /// # Errors
    ///
    /// Returns `DataApiError::Serialize` if the patch cannot be serialized.
    pub fn update<T: Serialize + ?Sized>(mut self, patch: &T) -> Result<Self, DataApiError> {
        self.method = Method::PATCH;
        self.body = Some(serde_json::to_value(patch)?);
        Ok(self)
    }

    /// Turn this into a delete of every matching row.
    pub fn delete(mut self) -> Self {
        self.method = Method::DELETE;
        self
    }

    /// Ask mutations to return the affected rows.
    pub fn returning(mut self) -> Self {
        self.returning = true;
        self
    }

    /// Fetch all matching rows.
    ///
    /// # Errors
    ///
    /// Returns `DataApiError` if the request fails or rows cannot be parsed.
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, DataApiError> {
        let response = self.build(self.method.clone(), false, false)?.send().await?;
        handle_response(response).await
    }

    /// Fetch exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `DataApiError::NotFound` when no row matches, or any other
    /// `DataApiError` if the request fails.
    pub async fn single<T: DeserializeOwned>(self) -> Result<T, DataApiError> {
        let response = self.build(self.method.clone(), true, false)?.send().await?;
        handle_response(response).await
    }

    /// Fetch one row if it exists.
    ///
    /// # Errors
    ///
    /// Returns `DataApiError` if the request fails for any reason other than
    /// the row being absent.
    pub async fn maybe_single<T: DeserializeOwned>(self) -> Result<Option<T>, DataApiError> {
        match self.single().await {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Exact number of matching rows, without transferring them.
    ///
    /// # Errors
    ///
    /// Returns `DataApiError::Parse` if the response lacks a usable
    /// `Content-Range` total.
    pub async fn count(self) -> Result<u64, DataApiError> {
        let response = self.build(Method::HEAD, false, true)?.send().await?;
        if !response.status().is_success() {
            return Err(DataApi::parse_error(response).await);
        }

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| DataApiError::Parse("missing Content-Range total".to_string()))
    }

    /// Run the request, discarding any response body.
    ///
    /// # Errors
    ///
    /// Returns `DataApiError` if the request fails.
    pub async fn execute(self) -> Result<(), DataApiError> {
        let response = self.build(self.method.clone(), false, false)?.send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(DataApi::parse_error(response).await)
    }

    fn build(
        &self,
        method: Method,
        object: bool,
        count: bool,
    ) -> Result<reqwest::RequestBuilder, DataApiError> {
        let mut url = self.api.table_url(&self.table)?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.params);
        }

        let mut prefer = Vec::new();
        if self.returning {
            prefer.push("return=representation");
        } else if self.body.is_some() || self.method == Method::DELETE {
            prefer.push("return=minimal");
        }
        if count {
            prefer.push("count=exact");
        }

        tracing::debug!(method = %method, table = %self.table, "Table API request");

        let mut request = self
            .api
            .client()
            .request(method, url)
            .bearer_auth(self.api.bearer());
        if object {
            request = request.header(ACCEPT, OBJECT_MEDIA_TYPE);
        }
        if !prefer.is_empty() {
            request = request.header("Prefer", prefer.join(","));
        }
        if let Some(body) = &self.body {
            request = request.json(body);
        }
        Ok(request)
    }
}

/// Handle API response and parse JSON.
async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, DataApiError> {
    if response.status().is_success() {
        return response
            .json()
            .await
            .map_err(|e| DataApiError::Parse(format!("Failed to parse response: {e}")));
    }

    Err(DataApi::parse_error(response).await)
}

/// Total from a `Content-Range` header (`0-24/57` or `*/57`).
///
/// Returns `None` when the total is unknown (`*`) or malformed.
#[must_use]
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.trim().rsplit_once('/')?;
    total.parse().ok()
}
