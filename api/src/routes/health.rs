use crate::response::ApiResponse;
use axum::{Json, Router, response::IntoResponse, routing::get};
use serde::Serialize;
use util::config;

/// Builds the `/health` route group.
///
/// This includes a single `GET /health` endpoint for uptime checks and deployment probes.
pub fn health_routes() -> Router {
    Router::new().route("/", get(health_check))
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    project: String,
    env: String,
}

/// GET /health
///
/// Returns a simple success response to indicate the API is running.
///
/// ### Response
/// - `200 OK`
///
/// ```json
/// {
///   "success": true,
///   "data": { "status": "OK", "project": "qti-grader", "env": "development" },
///   "message": "Health check passed"
/// }
/// ```
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success(
        HealthStatus {
            status: "OK",
            project: config::project_name(),
            env: config::env(),
        },
        "Health check passed",
    ))
}
