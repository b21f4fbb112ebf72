//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{
    create_phrase, create_project, delete_phrase, delete_video, export_sequence, get_sequence,
    health, list_phrases, list_projects, list_videos, ready, reorder_phrases, save_sequence,
    save_timeline, update_notes, update_phrase, upload_videos,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let clip_routes = Router::new()
        .route("/upload", post(upload_videos))
        .route("/videos", get(list_videos))
        .route("/videos/:clip_id", delete(delete_video))
        .route("/videos/:clip_id/notes", patch(update_notes));

    let sequence_routes = Router::new()
        .route("/sequence", get(get_sequence).post(save_sequence))
        .route("/sequence/timeline", post(save_timeline))
        .route("/export", post(export_sequence));

    let phrase_routes = Router::new()
        .route("/phrases", get(list_phrases).post(create_phrase))
        .route("/phrases/reorder", post(reorder_phrases))
        .route("/phrases/:phrase_id", patch(update_phrase).delete(delete_phrase));

    let project_routes = Router::new().route("/projects", get(list_projects).post(create_project));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(clip_routes)
        .merge(sequence_routes)
        .merge(phrase_routes)
        .merge(project_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    // Uploaded and exported files, with range requests for seeking
    let static_routes = Router::new()
        .nest_service("/uploads", ServeDir::new(state.paths.uploads_dir()))
        .nest_service("/exports", ServeDir::new(state.paths.exports_dir()));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(static_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Multipart's own 2MB default would cap uploads below MAX_BODY_SIZE
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
