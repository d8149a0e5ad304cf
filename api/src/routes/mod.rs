//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint
//! - `/workspaces` → Workspace upload, grading view, result updates and ZIP transfer

use crate::routes::{health::health_routes, workspaces::workspace_routes};
use axum::Router;

pub mod common;
pub mod health;
pub mod workspaces;

/// Builds the complete application router for all HTTP endpoints.
///
/// # Route Structure:
/// - `/health` → Health check endpoint.
/// - `/workspaces` → Workspace CRUD, grading and transfer endpoints.
pub fn routes() -> Router {
    Router::new()
        .nest("/health", health_routes())
        .nest("/workspaces", workspace_routes())
}
