//! # Workspaces Routes Module
//!
//! Defines and wires up routes for the `/api/workspaces` endpoint group.
//!
//! ## Structure
//! - `get.rs`: GET handlers (list, metadata, grading view, raw files, export)
//! - `post.rs`: POST handlers (multipart upload, archive import)
//! - `put.rs`: PUT handlers (metadata edit, result updates)
//! - `delete.rs`: DELETE handlers
//!
//! ## Usage
//! Call `workspace_routes()` to get a configured `Router` for `/workspaces` to be mounted in the
//! main app.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use delete::delete_workspace;
use get::{download_workspace_file, export_workspace, get_workspace, get_workspace_view, list_workspaces};
use post::{create_workspace, import_workspace};
use put::{update_results, update_workspace};
use util::config;

pub mod delete;
pub mod get;
pub mod post;
pub mod put;

/// Builds and returns the `/workspaces` route group.
///
/// Routes:
/// - `GET    /workspaces`                          → list workspaces, newest first
/// - `POST   /workspaces`                          → upload a new workspace (multipart)
/// - `POST   /workspaces/import`                   → import an exported ZIP archive (multipart)
/// - `GET    /workspaces/{workspace_id}`           → workspace metadata
/// - `PUT    /workspaces/{workspace_id}`           → rename / re-describe a workspace
/// - `DELETE /workspaces/{workspace_id}`           → delete a workspace and its files
/// - `GET    /workspaces/{workspace_id}/view`      → items, remapped results and scores
/// - `GET    /workspaces/{workspace_id}/files`     → raw file download (`?kind=&name=`)
/// - `PUT    /workspaces/{workspace_id}/results`   → write grading edits into a result file
/// - `GET    /workspaces/{workspace_id}/export`    → ZIP download of the workspace
///
/// Request bodies are capped at `MAX_UPLOAD_MB`.
pub fn workspace_routes() -> Router {
    Router::new()
        .route("/", get(list_workspaces).post(create_workspace))
        .route("/import", post(import_workspace))
        .route(
            "/{workspace_id}",
            get(get_workspace).put(update_workspace).delete(delete_workspace),
        )
        .route("/{workspace_id}/view", get(get_workspace_view))
        .route("/{workspace_id}/files", get(download_workspace_file))
        .route("/{workspace_id}/results", put(update_results))
        .route("/{workspace_id}/export", get(export_workspace))
        .layer(DefaultBodyLimit::max(config::max_upload_bytes()))
}
