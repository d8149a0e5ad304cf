use crate::response::ApiResponse;
use crate::routes::common::{format_validation_errors, service_error_response};
use axum::{
    Json,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use qti::scoring_input::ResultUpdateRequest;
use serde::Deserialize;
use services::workspace::UpdateWorkspace;
use services::workspace_service::WorkspaceService;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateWorkspaceRequest {
    #[validate(length(min = 1, max = 200, message = "Workspace name must be 1-200 characters"))]
    pub name: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

/// PUT /api/workspaces/{workspace_id}
///
/// Renames a workspace and replaces its description. A blank or missing description clears it.
///
/// ### Request Body
/// ```json
/// { "name": "Midterm (resit)", "description": "Second sitting" }
/// ```
///
/// ### Responses
/// - `200 OK` with the updated metadata
/// - `400 Bad Request` when the name is blank or a field is too long
/// - `404 Not Found`
pub async fn update_workspace(
    Path(workspace_id): Path<String>,
    Json(req): Json<UpdateWorkspaceRequest>,
) -> Response {
    if let Err(validation_errors) = req.validate() {
        let error_message = format_validation_errors(&validation_errors);
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(error_message)),
        )
            .into_response();
    }

    let params = UpdateWorkspace {
        name: Some(req.name),
        description: req.description,
    };

    match WorkspaceService::update(&workspace_id, params).await {
        Ok(workspace) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                workspace,
                "Workspace updated successfully",
            )),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

/// PUT /api/workspaces/{workspace_id}/results
///
/// Writes grading edits into one result file. Every rubric item in the request must carry its
/// complete criteria vector; the file's `RUBRIC_<n>_MET`, `SCORE` and `COMMENT` outcome
/// variables are updated in place.
///
/// ### Request Body
/// ```json
/// {
///   "resultFile": "alice.xml",
///   "items": [
///     {
///       "identifier": "item-1",
///       "criteria": [{ "index": 1, "met": true }, { "index": 2, "met": true }],
///       "comment": "Well argued"
///     }
///   ],
///   "preserveMet": false
/// }
/// ```
///
/// ### Responses
/// - `200 OK` with the recomputed result view
/// ```json
/// {
///   "success": true,
///   "data": {
///     "fileName": "alice.xml",
///     "itemScores": { "item-1": 5.0, "item-2": 1.0 },
///     "totalScore": 6.0,
///     "...": "..."
///   },
///   "message": "Result updated successfully"
/// }
/// ```
/// - `400 Bad Request` for unknown items, criteria counts that differ from the rubric, or
///   criteria on items without a rubric
/// - `404 Not Found` when the workspace or result file does not exist
pub async fn update_results(
    Path(workspace_id): Path<String>,
    Json(req): Json<ResultUpdateRequest>,
) -> Response {
    match WorkspaceService::apply_result_update(&workspace_id, req).await {
        Ok(view) => (
            StatusCode::OK,
            Json(ApiResponse::success(view, "Result updated successfully")),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}
