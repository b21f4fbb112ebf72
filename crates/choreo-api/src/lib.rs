//! Axum HTTP API for the choreography clip organizer.
//!
//! This crate provides:
//! - Multipart clip upload into per-user folders
//! - Sequence and timeline persistence
//! - Export of a sequence into one video via FFmpeg
//! - Phrase notes and projects
//! - Static serving of uploads and exports
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
