//! Sequence persistence.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use choreo_models::{Sequence, Timeline, TimelineClip};

use crate::error::{ApiError, ApiResult};
use crate::extract::{lenient_string, JsonBody};
use crate::handlers::user::{required_user, user_or_default};
use crate::handlers::videos::UserQuery;
use crate::state::AppState;

const MISSING_FIELDS: &str = "userId and sequence required";

/// Save request. `sequence` stays untyped so a non-array yields the
/// same 400 as a missing field instead of a JSON rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSequenceRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub sequence: Option<Value>,
}

/// Save response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSequenceResponse {
    pub ok: bool,
    pub sequence: Sequence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration: Option<f64>,
}

/// Get response.
#[derive(Serialize)]
pub struct SequenceResponse {
    pub sequence: Sequence,
}

/// Replace a user's sequence.
pub async fn save_sequence(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SaveSequenceRequest>,
) -> ApiResult<Json<SaveSequenceResponse>> {
    let user_id = required_user(request.user_id.as_deref(), MISSING_FIELDS)?;
    let sequence = request
        .sequence
        .as_ref()
        .and_then(parse_entries)
        .ok_or_else(|| ApiError::bad_request(MISSING_FIELDS))?;

    state.sequences.save(&user_id, sequence.clone()).await?;

    Ok(Json(SaveSequenceResponse {
        ok: true,
        sequence,
        total_duration: None,
    }))
}

/// Fetch a user's sequence; empty when none was saved.
pub async fn get_sequence(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<SequenceResponse>> {
    let user_id = user_or_default(query.user_id.as_deref())?;
    let sequence = state.sequences.get(&user_id).await?;
    Ok(Json(SequenceResponse { sequence }))
}

/// Timeline save request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTimelineRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub clips: Vec<TimelineClip>,
}

/// Derive the sequence from timeline placements and save it.
pub async fn save_timeline(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<SaveTimelineRequest>,
) -> ApiResult<Json<SaveSequenceResponse>> {
    let user_id = required_user(request.user_id.as_deref(), "userId required")?;

    let timeline =
        Timeline::from_clips(request.clips).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let sequence = Sequence::new(timeline.sequence());

    state.sequences.save(&user_id, sequence.clone()).await?;

    Ok(Json(SaveSequenceResponse {
        ok: true,
        sequence,
        total_duration: Some(timeline.total_duration()),
    }))
}

/// Accept an array of strings (numbers are kept as their text).
fn parse_entries(value: &Value) -> Option<Sequence> {
    let entries = value
        .as_array()?
        .iter()
        .map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Sequence::new(entries))
}
