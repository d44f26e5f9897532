use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{NewsCreate, NewsOut, NewsUpdate};
use crate::state::AppState;
use crate::upstream::Page;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// GET /news?limit=&offset= - newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Vec<NewsOut>> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let page = Page {
        limit: state.api.effective_limit(query.limit),
        offset: query.offset.unwrap_or(0),
    };

    let items = state.store.list(&claims, page).await?;
    Ok(ApiResponse::success(items))
}

/// GET /news/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<NewsOut> {
    let id = parse_id(&id)?;

    match state.store.get(&claims, id).await? {
        Some(item) => Ok(ApiResponse::success(item)),
        None => Err(ApiError::not_found("Not found")),
    }
}

/// POST /news
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<NewsOut> {
    let draft = NewsCreate::from_json(json_body(body)?)?;

    let item = state
        .store
        .create(&claims, &draft)
        .await
        .map_err(ApiError::upstream_passthrough)?;

    tracing::info!("Created news {}", item.id);
    Ok(ApiResponse::created(item))
}

/// PATCH /news/:id - partial update, then re-fetch for the canonical row
pub async fn patch(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<NewsOut> {
    let id = parse_id(&id)?;
    let patch = NewsUpdate::from_json(json_body(body)?)?;

    if !patch.is_empty() {
        state.store.update(&claims, id, &patch).await?;
    }

    // Not atomic with the write: a concurrent delete shows up here
    match state.store.get(&claims, id).await? {
        Some(item) => Ok(ApiResponse::success(item)),
        None => Err(ApiError::not_found("Not found after update")),
    }
}

/// DELETE /news/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id = parse_id(&id)?;

    if state.store.get(&claims, id).await?.is_none() {
        return Err(ApiError::not_found("Not found"));
    }
    state.store.delete(&claims, id).await?;

    tracing::info!("Deleted news {}", id);
    Ok(ApiResponse::<()>::no_content())
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid news id: {}", raw)))
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::invalid_json(e.body_text()))
}
