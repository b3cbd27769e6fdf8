use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_CONSUMER_KEY: &str = "mock-consumer-key";
pub const DEFAULT_USERNAME: &str = "pocketuser";

#[derive(Clone, Debug)]
pub struct MockConfig {
    pub consumer_key: String,
    pub username: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            consumer_key: DEFAULT_CONSUMER_KEY.to_string(),
            username: DEFAULT_USERNAME.to_string(),
        }
    }
}

/// An item saved through `/v3/add`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub item_id: String,
    pub url: String,
    pub title: String,
    pub tags: Vec<String>,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestTokenBody {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeBody {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct AddBody {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub tags: String,
}

#[derive(Default)]
struct Store {
    /// Issued request tokens; every code is treated as approved by the user.
    codes: HashSet<String>,
    /// access token -> username
    access_tokens: HashMap<String, String>,
    items: Vec<Item>,
}

/// Shared state behind the router. Cloning shares the same store.
#[derive(Clone)]
pub struct MockState {
    config: Arc<MockConfig>,
    store: Arc<RwLock<Store>>,
}

impl MockState {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config: Arc::new(config),
            store: Arc::new(RwLock::new(Store::default())),
        }
    }

    pub async fn items(&self) -> Vec<Item> {
        self.store.read().await.items.clone()
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self::new(MockConfig::default())
    }
}

/// A Pocket-style failure: status plus `X-Error` / `X-Error-Code` headers.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    code: u16,
    message: &'static str,
}

impl ApiFailure {
    const fn new(status: StatusCode, code: u16, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        tracing::warn!(status = %self.status, code = self.code, "{}", self.message);
        (
            self.status,
            [
                ("X-Error", self.message.to_string()),
                ("X-Error-Code", self.code.to_string()),
            ],
        )
            .into_response()
    }
}

const MALFORMED_BODY: ApiFailure = ApiFailure::new(StatusCode::BAD_REQUEST, 199, "Invalid request body.");
const MISSING_CONSUMER_KEY: ApiFailure =
    ApiFailure::new(StatusCode::BAD_REQUEST, 138, "Missing consumer key.");
const INVALID_CONSUMER_KEY: ApiFailure =
    ApiFailure::new(StatusCode::FORBIDDEN, 152, "Invalid consumer key.");
const MISSING_REDIRECT: ApiFailure =
    ApiFailure::new(StatusCode::BAD_REQUEST, 140, "Missing redirect url.");
const MISSING_CODE: ApiFailure = ApiFailure::new(StatusCode::BAD_REQUEST, 182, "Missing code.");
const REJECTED_CODE: ApiFailure = ApiFailure::new(StatusCode::FORBIDDEN, 158, "User rejected code.");
const INVALID_ACCESS_TOKEN: ApiFailure =
    ApiFailure::new(StatusCode::UNAUTHORIZED, 107, "Invalid access token.");
const MISSING_URL: ApiFailure = ApiFailure::new(StatusCode::BAD_REQUEST, 130, "Missing url.");

pub fn app(config: MockConfig) -> Router {
    app_with_state(MockState::new(config))
}

pub fn app_with_state(state: MockState) -> Router {
    Router::new()
        .route("/v3/oauth/request", post(request_token))
        .route("/v3/oauth/authorize", post(authorize))
        .route("/v3/add", post(add))
        .with_state(state)
}

pub async fn run(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

/// Parse a JSON body whatever the declared content type; Pocket clients send
/// `application-json`, which axum's `Json` extractor would refuse.
fn parse_body<T: for<'de> Deserialize<'de>>(body: &Bytes) -> Result<T, ApiFailure> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "rejecting malformed body");
        MALFORMED_BODY
    })
}

fn check_consumer_key(state: &MockState, consumer_key: &str) -> Result<(), ApiFailure> {
    if consumer_key.is_empty() {
        return Err(MISSING_CONSUMER_KEY);
    }
    if consumer_key != state.config.consumer_key {
        return Err(INVALID_CONSUMER_KEY);
    }
    Ok(())
}

fn form_response(pairs: &[(&str, &str)]) -> Response {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    (
        [(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
        body,
    )
        .into_response()
}

async fn request_token(State(state): State<MockState>, body: Bytes) -> Result<Response, ApiFailure> {
    let input: RequestTokenBody = parse_body(&body)?;
    check_consumer_key(&state, &input.consumer_key)?;
    if input.redirect_uri.is_empty() {
        return Err(MISSING_REDIRECT);
    }

    let code = Uuid::new_v4().to_string();
    state.store.write().await.codes.insert(code.clone());
    tracing::info!(redirect_uri = %input.redirect_uri, "issued request token");
    Ok(form_response(&[("code", code.as_str())]))
}

async fn authorize(State(state): State<MockState>, body: Bytes) -> Result<Response, ApiFailure> {
    let input: AuthorizeBody = parse_body(&body)?;
    check_consumer_key(&state, &input.consumer_key)?;
    if input.code.is_empty() {
        return Err(MISSING_CODE);
    }

    let mut store = state.store.write().await;
    if !store.codes.remove(&input.code) {
        return Err(REJECTED_CODE);
    }
    let access_token = Uuid::new_v4().to_string();
    let username = state.config.username.clone();
    store.access_tokens.insert(access_token.clone(), username.clone());
    tracing::info!(%username, "authorized request token");
    Ok(form_response(&[
        ("access_token", access_token.as_str()),
        ("username", username.as_str()),
    ]))
}

async fn add(
    State(state): State<MockState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiFailure> {
    let input: AddBody = parse_body(&body)?;
    check_consumer_key(&state, &input.consumer_key)?;

    let mut store = state.store.write().await;
    let username = store
        .access_tokens
        .get(&input.access_token)
        .cloned()
        .ok_or(INVALID_ACCESS_TOKEN)?;
    if input.url.is_empty() {
        return Err(MISSING_URL);
    }

    let item = Item {
        item_id: Uuid::new_v4().to_string(),
        url: input.url,
        title: input.title,
        tags: input
            .tags
            .split(',')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        username,
    };
    store.items.push(item.clone());
    tracing::info!(url = %item.url, "added item");
    Ok(Json(serde_json::json!({ "item": item, "status": 1 })))
}
