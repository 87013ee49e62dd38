//! HTTP surface of the blob store
//!
//! - `POST /api/storage` `{key, html, title?}` stores a value
//! - `GET /api/storage?key=` reads a value as JSON
//! - `GET /pages/{key}` serves a value as an HTML page
//!
//! `GET /pages/` without a key is a 400; any other method or path is a 404.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::backend::KvBackend;
use crate::cors::cors;
use crate::error::{StoreError, StoreResult};

const MISSING_FIELDS: &str = "Missing required fields: key and html";
const PAGE_CACHE_CONTROL: &str = "public, max-age=3600";

#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn KvBackend>,
}

impl AppState {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }
}

#[derive(Debug, Deserialize)]
pub struct PutRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PutResponse {
    pub success: bool,
    pub message: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct ValueQuery {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValueResponse {
    pub key: String,
    pub value: String,
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/storage", post(put_value).get(get_value).fallback(not_found))
        .route("/pages/", get(missing_page_key).fallback(not_found))
        .route("/pages/{key}", get(get_page).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
}

async fn put_value(
    State(state): State<AppState>,
    payload: Result<Json<PutRequest>, JsonRejection>,
) -> StoreResult<Json<PutResponse>> {
    let Json(request) = payload?;
    let (key, html) = match (request.key, request.html) {
        (Some(key), Some(html)) if !key.is_empty() && !html.is_empty() => (key, html),
        _ => return Err(StoreError::InvalidRequest(MISSING_FIELDS.to_string())),
    };

    state.backend.put(&key, &html).await?;
    tracing::debug!(
        key = %key,
        bytes = html.len(),
        title = request.title.as_deref().unwrap_or(""),
        backend = state.backend.name(),
        "stored value"
    );

    Ok(Json(PutResponse {
        success: true,
        message: "HTML stored successfully".to_string(),
        key,
    }))
}

async fn get_value(
    State(state): State<AppState>,
    Query(query): Query<ValueQuery>,
) -> StoreResult<Json<ValueResponse>> {
    let key = query
        .key
        .filter(|k| !k.is_empty())
        .ok_or_else(|| StoreError::InvalidRequest("Missing required query parameter: key".to_string()))?;

    match state.backend.get(&key).await? {
        Some(value) => Ok(Json(ValueResponse { key, value })),
        None => Err(StoreError::NotFound(format!("No value stored under {}", key))),
    }
}

async fn get_page(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.backend.get(&key).await {
        Ok(Some(html)) => (
            [
                (CONTENT_TYPE, "text/html;charset=UTF-8"),
                (CACHE_CONTROL, PAGE_CACHE_CONTROL),
            ],
            html,
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Page not found").into_response(),
        Err(e) => e.into_response(),
    }
}

async fn missing_page_key() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, "Invalid UUID")
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
