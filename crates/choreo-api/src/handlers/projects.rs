//! Project handlers.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use choreo_models::Project;

use crate::error::{ApiError, ApiResult};
use crate::extract::{lenient_string, JsonBody};
use crate::handlers::user::user_or_default;
use crate::handlers::videos::UserQuery;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

#[derive(Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

/// List projects, most recently modified first.
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<ProjectListResponse>> {
    let user_id = user_or_default(query.user_id.as_deref())?;
    let projects = state.projects.list(&user_id).await?;
    Ok(Json(ProjectListResponse { projects }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to the length of the user's saved sequence
    #[serde(default)]
    pub clip_count: Option<u32>,
}

/// Save a project.
pub async fn create_project(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let user_id = user_or_default(request.user_id.as_deref())?;

    let clip_count = match request.clip_count {
        Some(count) => count,
        None => state.sequences.get(&user_id).await?.len() as u32,
    };

    let project = Project::new(request.name.as_deref().unwrap_or_default(), clip_count)
        .map_err(ApiError::bad_request)?;

    state.projects.insert(&user_id, project.clone()).await?;
    info!(user_id = %user_id, project_id = %project.id, "Project saved");

    Ok((StatusCode::CREATED, Json(ProjectResponse { project })))
}
