use crate::response::ApiResponse;
use crate::routes::common::service_error_response;
use axum::{
    Json,
    extract::{Path, Query},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Local;
use serde::Deserialize;
use services::transfer_service::{TransferService, export_file_name};
use services::workspace::FileKind;
use services::workspace_service::WorkspaceService;
use util::{http::content_disposition, upload::base_name};

/// GET /api/workspaces
///
/// Lists every stored workspace, most recently updated first. Workspaces whose metadata cannot
/// be read are skipped.
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": [
///     {
///       "id": "ws_m3k2z1_a8f0qe",
///       "name": "Midterm",
///       "createdAt": "2025-05-01T10:00:00Z",
///       "updatedAt": "2025-05-02T08:30:00Z",
///       "itemCount": 2,
///       "resultCount": 14
///     }
///   ],
///   "message": "Workspaces retrieved successfully"
/// }
/// ```
pub async fn list_workspaces() -> Response {
    match WorkspaceService::list().await {
        Ok(workspaces) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                workspaces,
                "Workspaces retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

/// GET /api/workspaces/{workspace_id}
///
/// Returns the full metadata of one workspace, including its stored file lists.
///
/// ### Responses
///
/// - `200 OK` with the workspace metadata
/// - `400 Bad Request` for an invalid workspace id
/// - `404 Not Found`
/// ```json
/// {
///   "success": false,
///   "data": null,
///   "message": "workspace ws_missing not found"
/// }
/// ```
pub async fn get_workspace(Path(workspace_id): Path<String>) -> Response {
    match WorkspaceService::get(&workspace_id).await {
        Ok(workspace) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                workspace,
                "Workspace retrieved successfully",
            )),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

/// GET /api/workspaces/{workspace_id}/view
///
/// Loads the workspace for grading: parses the assessment test and its items, remaps every
/// result file onto the assessment items and computes per-item and total scores.
///
/// ### Responses
///
/// - `200 OK`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "workspace": { "id": "ws_m3k2z1_a8f0qe", "name": "Midterm", "...": "..." },
///     "items": [{ "identifier": "item-1", "title": "Essay", "rubric": [ ... ] }],
///     "results": [
///       {
///         "fileName": "alice.xml",
///         "sourcedId": "alice",
///         "itemScores": { "item-1": 3.0 },
///         "totalScore": 3.0,
///         "...": "..."
///       }
///     ],
///     "maxScore": 5.0
///   },
///   "message": "Workspace loaded successfully"
/// }
/// ```
///
/// - `400 Bad Request` when the stored files no longer agree with each other; `data` lists
///   every problem found
/// - `404 Not Found`
pub async fn get_workspace_view(Path(workspace_id): Path<String>) -> Response {
    match WorkspaceService::load_view(&workspace_id).await {
        Ok(view) => (
            StatusCode::OK,
            Json(ApiResponse::success(view, "Workspace loaded successfully")),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    pub kind: String,
    pub name: String,
}

/// GET /api/workspaces/{workspace_id}/files?kind={assessment|results}&name={path}
///
/// Streams one stored file. `name` is relative to the kind directory, e.g.
/// `items/item-1.qti.xml` for `kind=assessment`.
///
/// ### Responses
///
/// - `200 OK` with the raw bytes, a guessed `Content-Type` and an inline `Content-Disposition`
/// - `400 Bad Request` for an unknown kind or a path escaping the workspace
/// - `404 Not Found`
pub async fn download_workspace_file(
    Path(workspace_id): Path<String>,
    Query(query): Query<FileQuery>,
) -> Response {
    let kind = match query.kind.parse::<FileKind>() {
        Ok(kind) => kind,
        Err(e) => return service_error_response(e),
    };

    let file = match WorkspaceService::read_file(&workspace_id, kind, &query.name).await {
        Ok(file) => file,
        Err(e) => return service_error_response(e),
    };

    let file_name = base_name(&file.relative_path);
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(file_name, file_name))
            .unwrap_or_else(|_| HeaderValue::from_static("inline")),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    (StatusCode::OK, headers, file.bytes).into_response()
}

/// GET /api/workspaces/{workspace_id}/export
///
/// Packs the workspace into a ZIP archive that `POST /api/workspaces/import` accepts.
///
/// ### Responses
///
/// - `200 OK` with `Content-Type: application/zip` and a file name of the form
///   `<name>-YYYYMMDD-HHMMSS.zip`
/// - `404 Not Found`
pub async fn export_workspace(Path(workspace_id): Path<String>) -> Response {
    let workspace = match WorkspaceService::get(&workspace_id).await {
        Ok(workspace) => workspace,
        Err(e) => return service_error_response(e),
    };

    let buffer = match TransferService::export_zip(&workspace_id).await {
        Ok(buffer) => buffer,
        Err(e) => return service_error_response(e),
    };

    let file_name = export_file_name(&workspace.name, Local::now().naive_local());

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&file_name, "workspace-export.zip"))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/zip"),
    );

    (StatusCode::OK, headers, buffer).into_response()
}
