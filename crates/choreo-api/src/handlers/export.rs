//! Sequence export.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use choreo_models::ExportMode;

use crate::error::{ApiError, ApiResult};
use crate::extract::{lenient_string, JsonBody};
use crate::handlers::user::required_user;
use crate::metrics;
use crate::state::AppState;

/// Export request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
}

/// Export response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    pub ok: bool,
    pub export_url: String,
    pub mode: ExportMode,
    pub clip_count: usize,
}

/// Merge the user's saved sequence into one video under `/exports`.
pub async fn export_sequence(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ExportRequest>,
) -> ApiResult<Json<ExportResponse>> {
    let user_id = required_user(request.user_id.as_deref(), "userId required")?;

    let sequence = state.sequences.get(&user_id).await?;
    if sequence.is_empty() {
        return Err(ApiError::bad_request("No sequence found for user"));
    }

    let clips = state.clips.list_for_user(&user_id).await?;
    let filenames = sequence.resolve_filenames(&clips);

    let mut inputs = Vec::with_capacity(filenames.len());
    for filename in &filenames {
        let missing = || ApiError::bad_request(format!("Missing clip {filename}"));
        // Unsafe names can never refer to a stored clip
        let path = state.paths.upload_path(&user_id, filename).map_err(|_| missing())?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(missing());
        }
        inputs.push(path);
    }

    let start = Instant::now();
    let result = state
        .merger
        .merge(&user_id, &inputs, state.paths.exports_dir())
        .await
        .map_err(|e| {
            error!(user_id = %user_id, error = %e, "Export failed");
            metrics::record_export_failure();
            ApiError::from(e)
        })?;

    let elapsed = start.elapsed().as_secs_f64();
    metrics::record_export(result.mode.as_str(), result.clip_count, elapsed);
    info!(
        user_id = %user_id,
        mode = %result.mode,
        clips = result.clip_count,
        duration_secs = elapsed,
        "Export complete"
    );

    Ok(Json(ExportResponse {
        ok: true,
        export_url: result.export_url(),
        mode: result.mode,
        clip_count: result.clip_count,
    }))
}
