use crate::response::ApiResponse;
use crate::routes::common::service_error_response;
use axum::{
    Json,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// DELETE /api/workspaces/{workspace_id}
///
/// Permanently removes a workspace with all of its stored files.
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": null,
///   "message": "Workspace deleted successfully"
/// }
/// ```
/// - `400 Bad Request` for an invalid workspace id
/// - `404 Not Found`
pub async fn delete_workspace(Path(workspace_id): Path<String>) -> Response {
    match services::workspace_service::WorkspaceService::delete(&workspace_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::<()>::success((), "Workspace deleted successfully")),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}
