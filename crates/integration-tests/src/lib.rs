//! Integration tests for Storedesk.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p storedesk-integration-tests
//! ```
//!
//! No external services are needed: [`FakeBackend`] serves the subset of
//! the hosted table API (`/rest/v1`) and identity provider (`/auth/v1`)
//! the console uses, from in-memory tables, on an ephemeral local port.
//! [`spawn_admin`] runs the real admin router against it.
//!
//! # Test Categories
//!
//! - `admin_auth` - sign-in, user sync, sign-out and protected routes
//! - `admin_repositories` - repositories and the dashboard loader
//! - `admin_pages` - product, order and cart pages end to end

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use url::Url;
use uuid::Uuid;

use storedesk_admin::backend::DataApi;
use storedesk_admin::config::AdminConfig;
use storedesk_admin::state::AppState;

/// Public API key the fake backend accepts.
pub const ANON_KEY: &str = "eyJhbGciOiJIUzI1NiJ9.eyJyb2xlIjoiYW5vbiJ9.f4k3-4n0n";

const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";

// =============================================================================
// Fake Backend
// =============================================================================

/// An identity the fake provider will sign in.
#[derive(Debug, Clone)]
struct Account {
    uid: String,
    email: String,
    password: String,
    full_name: Option<String>,
}

#[derive(Debug, Default)]
struct FakeState {
    tables: HashMap<String, Vec<Value>>,
    accounts: Vec<Account>,
    /// Live access token -> account uid.
    tokens: HashMap<String, String>,
    token_lifetime: u64,
    failing: HashSet<String>,
    requests: Vec<String>,
}

/// In-memory stand-in for the hosted backend.
#[derive(Clone)]
pub struct FakeBackend {
    addr: SocketAddr,
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(FakeState {
            token_lifetime: 3600,
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/rest/v1/{table}", any(table_request))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(user))
            .route("/auth/v1/logout", post(logout))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake backend stopped");
        });

        Self { addr, state }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Base URL, with the trailing slash the clients expect.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("Fake backend URL is valid")
    }

    /// Console configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> AdminConfig {
        AdminConfig::for_backend(self.base_url(), SecretString::from(ANON_KEY))
    }

    /// Table API client authenticating with the public key only.
    #[must_use]
    pub fn data_api(&self) -> DataApi {
        DataApi::new(&self.config().backend).expect("Failed to build table API client")
    }

    /// Register an identity that can sign in. Returns its uid.
    pub fn add_account(&self, email: &str, password: &str, full_name: Option<&str>) -> String {
        let uid = Uuid::new_v4().to_string();
        self.lock().accounts.push(Account {
            uid: uid.clone(),
            email: email.to_owned(),
            password: password.to_owned(),
            full_name: full_name.map(ToOwned::to_owned),
        });
        uid
    }

    /// Lifetime in seconds of tokens issued from now on.
    pub fn set_token_lifetime(&self, seconds: u64) {
        self.lock().token_lifetime = seconds;
    }

    /// Make every request against `table` fail with 503.
    pub fn fail_table(&self, table: &str) {
        self.lock().failing.insert(table.to_owned());
    }

    /// Seed a row, filling in `id` and timestamps when absent. Returns the stored row.
    pub fn insert(&self, table: &str, row: Value) -> Value {
        let row = stamp_new_row(row);
        self.lock()
            .tables
            .entry(table.to_owned())
            .or_default()
            .push(row.clone());
        row
    }

    /// Current rows of a table.
    #[must_use]
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock().tables.get(table).cloned().unwrap_or_default()
    }

    /// Number of access tokens that have been issued and not revoked.
    #[must_use]
    pub fn live_tokens(&self) -> usize {
        self.lock().tokens.len()
    }

    /// Requests served so far, as `METHOD table`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }
}

type Shared = Arc<Mutex<FakeState>>;

fn lock(state: &Shared) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn now_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn stamp_new_row(row: Value) -> Value {
    let mut row = match row {
        Value::Object(map) => map,
        other => return other,
    };
    let now = now_string();
    row.entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    row.entry("created_at")
        .or_insert_with(|| Value::String(now.clone()));
    row.entry("updated_at").or_insert_with(|| Value::String(now));
    Value::Object(row)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn has_api_key(headers: &HeaderMap) -> bool {
    headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(ANON_KEY)
}

fn pgrst_error(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "code": code, "message": message, "details": null, "hint": null })))
        .into_response()
}

// =============================================================================
// Table API
// =============================================================================

/// One entry of a `select` list.
#[derive(Debug, PartialEq)]
enum SelectItem {
    All,
    Column(String),
    /// `alias:table(columns)`, joined through `<alias>_id`.
    Embed {
        alias: String,
        table: String,
        columns: String,
    },
}

/// Split on commas that are not inside parentheses.
fn split_top_level(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty()).collect()
}

fn parse_select(raw: &str) -> Vec<SelectItem> {
    split_top_level(raw)
        .into_iter()
        .map(|part| {
            if part == "*" {
                return SelectItem::All;
            }
            let Some((head, rest)) = part.split_once('(') else {
                return SelectItem::Column(part.to_owned());
            };
            let (alias, table) = head.split_once(':').unwrap_or((head, head));
            SelectItem::Embed {
                alias: alias.to_owned(),
                table: table.to_owned(),
                columns: rest.trim_end_matches(')').to_owned(),
            }
        })
        .collect()
}

fn project(row: &Value, items: &[SelectItem], tables: &HashMap<String, Vec<Value>>) -> Value {
    let mut out = Map::new();
    for item in items {
        match item {
            SelectItem::All => {
                if let Some(map) = row.as_object() {
                    out.extend(map.clone());
                }
            }
            SelectItem::Column(column) => {
                out.insert(column.clone(), row.get(column).cloned().unwrap_or(Value::Null));
            }
            SelectItem::Embed {
                alias,
                table,
                columns,
            } => {
                let key = row.get(format!("{alias}_id")).map(value_text);
                let related = key
                    .and_then(|key| {
                        tables
                            .get(table)?
                            .iter()
                            .find(|r| r.get("id").map(value_text).as_deref() == Some(key.as_str()))
                    })
                    .map_or(Value::Null, |r| project(r, &parse_select(columns), tables));
                out.insert(alias.clone(), related);
            }
        }
    }
    Value::Object(out)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_owned(),
        other => other.to_string(),
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    let (a, b) = (value_text(a), value_text(b));
    if let (Ok(x), Ok(y)) = (
        DateTime::parse_from_rfc3339(&a),
        DateTime::parse_from_rfc3339(&b),
    ) {
        return Some(x.cmp(&y));
    }
    if let (Ok(x), Ok(y)) = (a.parse::<f64>(), b.parse::<f64>()) {
        return x.partial_cmp(&y);
    }
    Some(a.cmp(&b))
}

/// Whether `row` passes one `column=op.value` filter. `None` for an unknown operator.
fn passes(row: &Value, column: &str, expr: &str) -> Option<bool> {
    let (op, operand) = expr.split_once('.')?;
    let value = row.get(column).unwrap_or(&Value::Null);
    let operand_value = Value::String(operand.to_owned());
    Some(match op {
        "eq" => !value.is_null() && value_text(value) == operand,
        "is" => operand == "null" && value.is_null(),
        "gte" => {
            !value.is_null() && compare_values(value, &operand_value).is_some_and(|o| o.is_ge())
        }
        "lte" => {
            !value.is_null() && compare_values(value, &operand_value).is_some_and(|o| o.is_le())
        }
        _ => return None,
    })
}

/// Parsed query string of a table request.
#[derive(Debug, Default)]
struct TableQuery {
    select: Option<String>,
    order: Option<(String, bool)>,
    limit: Option<usize>,
    filters: Vec<(String, String)>,
}

impl TableQuery {
    fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "select" => query.select = Some(value.into_owned()),
                "limit" => query.limit = value.parse().ok(),
                "order" => {
                    let (column, direction) =
                        value.split_once('.').unwrap_or((value.as_ref(), "asc"));
                    query.order = Some((column.to_owned(), direction != "desc"));
                }
                _ => query.filters.push((key.into_owned(), value.into_owned())),
            }
        }
        query
    }

    /// Error response for the first filter with an unknown operator.
    fn unsupported(&self) -> Option<Response> {
        let probe = Value::Object(Map::new());
        self.filters
            .iter()
            .find(|(column, expr)| passes(&probe, column, expr).is_none())
            .map(|(column, expr)| {
                pgrst_error(
                    StatusCode::BAD_REQUEST,
                    "PGRST100",
                    &format!("unsupported filter {column}={expr}"),
                )
            })
    }

    fn matches(&self, row: &Value) -> bool {
        self.filters
            .iter()
            .all(|(column, expr)| passes(row, column, expr) == Some(true))
    }
}

async fn table_request(
    State(state): State<Shared>,
    method: Method,
    Path(table): Path<String>,
    RawQuery(raw_query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut guard = lock(&state);
    guard.requests.push(format!("{method} {table}"));

    if !has_api_key(&headers) {
        return pgrst_error(StatusCode::UNAUTHORIZED, "PGRST301", "No API key found in request");
    }
    match bearer(&headers) {
        Some(ANON_KEY) => {}
        Some(token) if guard.tokens.contains_key(token) => {}
        _ => return pgrst_error(StatusCode::UNAUTHORIZED, "PGRST301", "JWT expired"),
    }
    if guard.failing.contains(&table) {
        return pgrst_error(StatusCode::SERVICE_UNAVAILABLE, "PGRST000", "upstream unavailable");
    }

    let query = TableQuery::parse(raw_query.as_deref());
    if let Some(response) = query.unsupported() {
        return response;
    }
    let wants_object = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        == Some(OBJECT_MEDIA_TYPE);
    let prefer = headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let returning = prefer.contains("return=representation");

    let state = &mut *guard;
    let rows = state.tables.entry(table.clone()).or_default();

    let affected: Vec<Value> = match method {
        Method::GET | Method::HEAD => {
            let mut matched: Vec<Value> =
                rows.iter().filter(|r| query.matches(r)).cloned().collect();
            if let Some((column, ascending)) = &query.order {
                matched.sort_by(|a, b| {
                    let ordering = compare_values(
                        a.get(column).unwrap_or(&Value::Null),
                        b.get(column).unwrap_or(&Value::Null),
                    )
                    .unwrap_or(std::cmp::Ordering::Equal);
                    if *ascending { ordering } else { ordering.reverse() }
                });
            }
            if let Some(limit) = query.limit {
                matched.truncate(limit);
            }

            if method == Method::HEAD {
                let mut response = StatusCode::OK.into_response();
                if let Ok(value) = HeaderValue::from_str(&format!("*/{}", matched.len())) {
                    response.headers_mut().insert(header::CONTENT_RANGE, value);
                }
                return response;
            }
            matched
        }
        Method::POST => {
            let new_rows = match serde_json::from_slice::<Value>(&body) {
                Ok(Value::Array(items)) => items,
                Ok(item @ Value::Object(_)) => vec![item],
                _ => return pgrst_error(StatusCode::BAD_REQUEST, "PGRST102", "Invalid body"),
            };
            let mut inserted = Vec::new();
            for row in new_rows {
                let row = stamp_new_row(row);
                let duplicate_email = table == "users"
                    && row.get("email").is_some_and(|email| {
                        rows.iter().any(|r| r.get("email") == Some(email))
                    });
                if duplicate_email {
                    return pgrst_error(
                        StatusCode::CONFLICT,
                        "23505",
                        "duplicate key value violates unique constraint \"users_email_key\"",
                    );
                }
                rows.push(row.clone());
                inserted.push(row);
            }
            inserted
        }
        Method::PATCH => {
            let Ok(Value::Object(patch)) = serde_json::from_slice::<Value>(&body) else {
                return pgrst_error(StatusCode::BAD_REQUEST, "PGRST102", "Invalid body");
            };
            let mut updated = Vec::new();
            for row in rows.iter_mut().filter(|r| query.matches(r)) {
                if let Some(map) = row.as_object_mut() {
                    map.extend(patch.clone());
                    map.insert("updated_at".to_owned(), Value::String(now_string()));
                }
                updated.push(row.clone());
            }
            updated
        }
        Method::DELETE => {
            let (removed, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|r| query.matches(r));
            *rows = kept;
            removed
        }
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    let is_read = method == Method::GET;
    if !is_read && !returning {
        return StatusCode::NO_CONTENT.into_response();
    }

    let items = parse_select(query.select.as_deref().unwrap_or("*"));
    let projected: Vec<Value> = affected
        .iter()
        .map(|row| project(row, &items, &state.tables))
        .collect();
    let status = if method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    if wants_object {
        let [single] = projected.as_slice() else {
            return pgrst_error(
                StatusCode::NOT_ACCEPTABLE,
                "PGRST116",
                &format!(
                    "JSON object requested, multiple (or no) rows returned ({} rows)",
                    projected.len()
                ),
            );
        };
        return (status, Json(single.clone())).into_response();
    }
    (status, Json(Value::Array(projected))).into_response()
}

// =============================================================================
// Identity Provider
// =============================================================================

fn user_json(account: &Account) -> Value {
    json!({
        "id": account.uid,
        "aud": "authenticated",
        "email": account.email,
        "email_confirmed_at": "2024-01-01T00:00:00Z",
        "user_metadata": { "full_name": account.full_name },
    })
}

fn identity_error(status: StatusCode, error: &str, description: &str) -> Response {
    (status, Json(json!({ "error": error, "error_description": description }))).into_response()
}

#[derive(Deserialize)]
struct GrantQuery {
    grant_type: String,
}

#[derive(Deserialize)]
struct PasswordGrant {
    email: String,
    password: String,
}

async fn token(
    State(state): State<Shared>,
    Query(grant): Query<GrantQuery>,
    headers: HeaderMap,
    Json(body): Json<PasswordGrant>,
) -> Response {
    if !has_api_key(&headers) {
        return identity_error(StatusCode::UNAUTHORIZED, "no_api_key", "No API key found");
    }
    if grant.grant_type != "password" {
        return identity_error(StatusCode::BAD_REQUEST, "unsupported_grant_type", "Unsupported grant type");
    }

    let mut state = lock(&state);
    let Some(account) = state
        .accounts
        .iter()
        .find(|a| a.email.eq_ignore_ascii_case(&body.email) && a.password == body.password)
        .cloned()
    else {
        return identity_error(StatusCode::BAD_REQUEST, "invalid_grant", "Invalid login credentials");
    };

    let access_token = format!("access-{}", Uuid::new_v4());
    state.tokens.insert(access_token.clone(), account.uid.clone());
    Json(json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": state.token_lifetime,
        "refresh_token": format!("refresh-{}", Uuid::new_v4()),
        "user": user_json(&account),
    }))
    .into_response()
}

async fn user(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    let account = bearer(&headers)
        .and_then(|t| state.tokens.get(t))
        .and_then(|uid| state.accounts.iter().find(|a| &a.uid == uid));
    match account {
        Some(account) => Json(user_json(account)).into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response(),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    match bearer(&headers).and_then(|t| state.tokens.remove(t)) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response(),
    }
}

// =============================================================================
// Admin Console
// =============================================================================

/// Start the admin console against `backend`. Returns its base URL.
pub async fn spawn_admin(backend: &FakeBackend) -> String {
    spawn_admin_with(backend.config()).await
}

/// Start the admin console with a custom configuration.
pub async fn spawn_admin_with(config: AdminConfig) -> String {
    let state = AppState::new(config).expect("Failed to build admin state");
    let app = storedesk_admin::routes::app(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind admin console");
    let addr = listener.local_addr().expect("Admin console has no address");
    tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("Admin console stopped");
    });

    format!("http://{addr}")
}

/// Browser-like client: keeps cookies, does not follow redirects.
#[must_use]
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// Sign in through the login form and return the response.
pub async fn sign_in(client: &reqwest::Client, admin_url: &str, email: &str, password: &str) -> reqwest::Response {
    client
        .post(format!("{admin_url}/auth/login"))
        .form(&[("email", email), ("password", password)])
        .send()
        .await
        .expect("Failed to submit login form")
}

/// `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_select_with_embeds() {
        let items = parse_select("*,product:products(id,title),user:users(*)");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], SelectItem::All);
        assert_eq!(
            items[1],
            SelectItem::Embed {
                alias: "product".to_owned(),
                table: "products".to_owned(),
                columns: "id,title".to_owned(),
            }
        );
    }

    #[test]
    fn test_filters() {
        let row = json!({"status": "pending", "order_id": null, "created_at": "2024-03-05T10:00:00.000Z"});
        assert_eq!(passes(&row, "status", "eq.pending"), Some(true));
        assert_eq!(passes(&row, "order_id", "is.null"), Some(true));
        assert_eq!(passes(&row, "created_at", "gte.2024-03-01T00:00:00.000Z"), Some(true));
        assert_eq!(passes(&row, "created_at", "lte.2024-03-01T00:00:00.000Z"), Some(false));
        assert_eq!(passes(&row, "status", "like.pend*"), None);
    }
}
