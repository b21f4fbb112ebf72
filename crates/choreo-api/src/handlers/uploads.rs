//! Multipart clip upload.
//!
//! File parts are streamed into a staging directory first because the
//! `userId` text part may arrive after the files. Once the whole body is read,
//! each staged file is moved to `uploads/<userId>/<clipId><ext>` and recorded.

use std::path::PathBuf;

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use choreo_media::get_duration;
use choreo_models::{ClipId, ClipRecord};
use choreo_storage::fs_utils::move_file;

use crate::error::{ApiError, ApiResult};
use crate::handlers::user::user_or_default;
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying video files.
const VIDEOS_FIELD: &str = "videos";
/// Multipart field carrying the owner id.
const USER_ID_FIELD: &str = "userId";

/// Upload response.
#[derive(Serialize)]
pub struct UploadResponse {
    pub uploaded: Vec<ClipRecord>,
}

struct StagedFile {
    path: PathBuf,
    original_name: String,
    size: u64,
}

/// Staged files not yet moved into place; removed on drop.
#[derive(Default)]
struct Staging {
    files: Vec<StagedFile>,
}

impl Drop for Staging {
    fn drop(&mut self) {
        for file in &self.files {
            // Already moved files are gone; that error is expected
            let _ = std::fs::remove_file(&file.path);
        }
    }
}

/// Upload one or more clips.
pub async fn upload_videos(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let staging_dir = state.paths.staging_dir();
    fs::create_dir_all(&staging_dir).await?;

    let mut staging = Staging::default();
    let mut raw_user_id: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(VIDEOS_FIELD) => {
                let original_name = field.file_name().unwrap_or_default().to_string();
                if original_name.is_empty() {
                    // Browsers send an empty part when no file was picked
                    continue;
                }
                if staging.files.len() >= state.config.max_upload_files {
                    return Err(ApiError::bad_request(format!(
                        "Too many files (max {})",
                        state.config.max_upload_files
                    )));
                }

                let path = staging_dir.join(format!("{}.part", Uuid::new_v4().simple()));
                let mut file = fs::File::create(&path).await?;
                staging.files.push(StagedFile {
                    path,
                    original_name,
                    size: 0,
                });

                let mut size = 0u64;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Upload interrupted: {e}")))?
                {
                    file.write_all(&chunk).await?;
                    size += chunk.len() as u64;
                }
                file.flush().await?;

                if let Some(staged) = staging.files.last_mut() {
                    staged.size = size;
                }
            }
            Some(USER_ID_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Invalid userId field: {e}")))?;
                raw_user_id = Some(text);
            }
            other => {
                debug!(field = ?other, "Ignoring multipart field");
            }
        }
    }

    if staging.files.is_empty() {
        return Err(ApiError::bad_request("No files uploaded"));
    }

    let user_id = user_or_default(raw_user_id.as_deref())?;
    let user_dir = state.paths.user_upload_dir(&user_id)?;

    let mut uploaded = Vec::with_capacity(staging.files.len());
    let mut moved = Vec::with_capacity(staging.files.len());
    let mut total_bytes = 0u64;

    let stored: ApiResult<()> = async {
        for staged in &staging.files {
            let record =
                ClipRecord::new(ClipId::new(), &user_id, &staged.original_name, staged.size);
            let dest = user_dir.join(&record.filename);
            move_file(&staged.path, &dest).await?;
            moved.push(dest.clone());

            // Duration is informational; uploads succeed without ffprobe
            let duration = get_duration(&dest).await.ok().filter(|d| *d > 0.0);

            total_bytes += staged.size;
            uploaded.push(record.with_duration(duration));
        }

        state.clips.insert_many(uploaded.clone()).await?;
        Ok(())
    }
    .await;

    if let Err(e) = stored {
        // Unrecorded files must not stay publicly served
        for path in &moved {
            if let Err(err) = fs::remove_file(path).await {
                warn!("Failed to remove unrecorded upload {}: {}", path.display(), err);
            }
        }
        return Err(e);
    }

    metrics::record_upload(uploaded.len(), total_bytes);

    info!(
        user_id = %user_id,
        clips = uploaded.len(),
        bytes = total_bytes,
        "Clips uploaded"
    );

    Ok(Json(UploadResponse { uploaded }))
}
