//! Clip listing, notes and deletion.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use choreo_models::ClipRecord;

use crate::error::{ApiError, ApiResult};
use crate::extract::{lenient_string, JsonBody};
use crate::handlers::user::user_or_default;
use crate::state::AppState;

/// Maximum notes length per clip.
const MAX_NOTES_LENGTH: usize = 5000;

/// `?userId=` query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Clip list response.
#[derive(Serialize)]
pub struct ClipListResponse {
    pub clips: Vec<ClipRecord>,
}

/// List a user's clips in upload order.
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<ClipListResponse>> {
    let user_id = user_or_default(query.user_id.as_deref())?;
    let clips = state.clips.list_for_user(&user_id).await?;
    Ok(Json(ClipListResponse { clips }))
}

/// Notes update request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotesRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Single clip response.
#[derive(Serialize)]
pub struct ClipResponse {
    pub clip: ClipRecord,
}

/// Set or clear a clip's notes.
pub async fn update_notes(
    State(state): State<AppState>,
    Path(clip_id): Path<String>,
    JsonBody(request): JsonBody<UpdateNotesRequest>,
) -> ApiResult<Json<ClipResponse>> {
    let user_id = user_or_default(request.user_id.as_deref())?;

    let notes = request.notes.map(|n| n.trim().to_string());
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH) {
        return Err(ApiError::bad_request(format!(
            "Notes must be at most {MAX_NOTES_LENGTH} characters"
        )));
    }

    let clip = state
        .clips
        .set_notes(&user_id, &clip_id, notes)
        .await?
        .ok_or_else(|| ApiError::not_found("Clip not found"))?;

    Ok(Json(ClipResponse { clip }))
}

/// Delete response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteClipResponse {
    pub ok: bool,
    pub removed_from_sequence: usize,
}

/// Delete a clip: its record, its file, and its sequence entries.
pub async fn delete_video(
    State(state): State<AppState>,
    Path(clip_id): Path<String>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<DeleteClipResponse>> {
    let user_id = user_or_default(query.user_id.as_deref())?;

    let clip = state
        .clips
        .remove(&user_id, &clip_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Clip not found"))?;

    let path = state.paths.upload_path(&user_id, &clip.filename)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove clip file {}: {}", path.display(), e),
    }

    // Sequences may hold the id or, from older clients, the filename
    let mut removed = state.sequences.remove_entry(&user_id, clip.id.as_str()).await?;
    removed += state.sequences.remove_entry(&user_id, &clip.filename).await?;

    info!(user_id = %user_id, clip_id = %clip.id, "Clip deleted");

    Ok(Json(DeleteClipResponse {
        ok: true,
        removed_from_sequence: removed,
    }))
}
