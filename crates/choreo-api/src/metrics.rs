//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "choreo_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "choreo_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "choreo_http_requests_in_flight";

    // Upload metrics
    pub const CLIPS_UPLOADED_TOTAL: &str = "choreo_clips_uploaded_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "choreo_upload_bytes_total";

    // Export metrics
    pub const EXPORTS_TOTAL: &str = "choreo_exports_total";
    pub const EXPORTS_FAILED_TOTAL: &str = "choreo_exports_failed_total";
    pub const EXPORT_DURATION_SECONDS: &str = "choreo_export_duration_seconds";
    pub const EXPORT_CLIPS: &str = "choreo_export_clips";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "choreo_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a completed upload request.
pub fn record_upload(clips: usize, bytes: u64) {
    counter!(names::CLIPS_UPLOADED_TOTAL).increment(clips as u64);
    counter!(names::UPLOAD_BYTES_TOTAL).increment(bytes);
}

/// Record a successful export.
pub fn record_export(mode: &str, clips: usize, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::EXPORTS_TOTAL, &labels).increment(1);
    histogram!(names::EXPORT_DURATION_SECONDS, &labels).record(duration_secs);
    histogram!(names::EXPORT_CLIPS).record(clips as f64);
}

/// Record a failed export.
pub fn record_export_failure() {
    counter!(names::EXPORTS_FAILED_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Collapse ids and file names in a path so label cardinality stays bounded.
fn sanitize_path(path: &str) -> String {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match segments.first() {
        Some(&"uploads") => return "/uploads/:file".to_string(),
        Some(&"exports") => return "/exports/:file".to_string(),
        _ => {}
    }

    let mut out = String::new();
    let mut previous = "";
    for segment in segments {
        out.push('/');
        let is_id = matches!(previous, "videos" | "phrases") && segment != "reorder";
        out.push_str(if is_id { ":id" } else { segment });
        previous = segment;
    }
    out
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
