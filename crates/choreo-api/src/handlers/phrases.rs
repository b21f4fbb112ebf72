//! Phrase notes handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use choreo_models::{Phrase, PhraseUpdate};

use crate::error::{ApiError, ApiResult};
use crate::extract::{lenient_string, JsonBody};
use crate::handlers::user::user_or_default;
use crate::state::AppState;

/// Maximum title length.
const MAX_TITLE_LENGTH: usize = 200;

/// `?userId=&q=` query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    /// Case-insensitive filter over title and notes
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct PhraseListResponse {
    pub phrases: Vec<Phrase>,
}

#[derive(Serialize)]
pub struct PhraseResponse {
    pub phrase: Phrase,
}

/// List phrases in display order.
pub async fn list_phrases(
    State(state): State<AppState>,
    Query(query): Query<PhraseQuery>,
) -> ApiResult<Json<PhraseListResponse>> {
    let user_id = user_or_default(query.user_id.as_deref())?;
    let phrases = state.phrases.list(&user_id, query.q.as_deref()).await?;
    Ok(Json(PhraseListResponse { phrases }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePhraseRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Append a new phrase.
pub async fn create_phrase(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreatePhraseRequest>,
) -> ApiResult<(StatusCode, Json<PhraseResponse>)> {
    let user_id = user_or_default(request.user_id.as_deref())?;
    if let Some(title) = &request.title {
        check_title(title)?;
    }
    let phrase = state.phrases.create(&user_id, request.title).await?;
    Ok((StatusCode::CREATED, Json(PhraseResponse { phrase })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhraseRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub update: PhraseUpdate,
}

/// Edit a phrase's title, notes or clip URL.
pub async fn update_phrase(
    State(state): State<AppState>,
    Path(phrase_id): Path<String>,
    JsonBody(request): JsonBody<UpdatePhraseRequest>,
) -> ApiResult<Json<PhraseResponse>> {
    let user_id = user_or_default(request.user_id.as_deref())?;
    if let Some(title) = &request.update.title {
        check_title(title)?;
    }

    let phrase = state
        .phrases
        .update(&user_id, &phrase_id, request.update)
        .await?
        .ok_or_else(|| ApiError::not_found("Phrase not found"))?;

    Ok(Json(PhraseResponse { phrase }))
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Delete a phrase.
pub async fn delete_phrase(
    State(state): State<AppState>,
    Path(phrase_id): Path<String>,
    Query(query): Query<PhraseQuery>,
) -> ApiResult<Json<OkResponse>> {
    let user_id = user_or_default(query.user_id.as_deref())?;
    if !state.phrases.delete(&user_id, &phrase_id).await? {
        return Err(ApiError::not_found("Phrase not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderPhrasesRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub order: Vec<String>,
}

/// Move phrases into the given id order.
pub async fn reorder_phrases(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ReorderPhrasesRequest>,
) -> ApiResult<Json<PhraseListResponse>> {
    let user_id = user_or_default(request.user_id.as_deref())?;
    let phrases = state.phrases.reorder(&user_id, &request.order).await?;
    Ok(Json(PhraseListResponse { phrases }))
}

fn check_title(title: &str) -> ApiResult<()> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}
