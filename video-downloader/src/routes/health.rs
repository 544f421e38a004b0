use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

/// Health check endpoint
///
/// Always answers `{"status":"ok"}`; no dependency is probed.
pub async fn handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
