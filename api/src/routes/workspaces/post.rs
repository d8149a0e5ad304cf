use crate::response::ApiResponse;
use crate::routes::common::service_error_response;
use axum::{
    Json,
    extract::{Multipart, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::transfer_service::{ImportOutcome, TransferService};
use services::workspace::{NewWorkspace, UploadedFile};
use services::workspace_service::WorkspaceService;

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error(message)),
    )
        .into_response()
}

/// Reads a file part, falling back to the form field name when the client sent no file name.
async fn read_file_field(field: Field<'_>, field_name: &str) -> Result<UploadedFile, Response> {
    let file_name = field
        .file_name()
        .map(str::to_string)
        .unwrap_or_else(|| field_name.to_string());
    match field.bytes().await {
        Ok(bytes) => Ok(UploadedFile::new(file_name, bytes.to_vec())),
        Err(_) => Err(bad_request(format!("Could not read uploaded file {file_name}"))),
    }
}

/// POST /api/workspaces
///
/// Uploads an assessment package together with learner result files. The whole upload is
/// checked for consistency before anything is stored.
///
/// ### Request Body (Multipart Form Data)
/// - `name` (string, required): Display name of the workspace
/// - `description` (string, optional)
/// - `assessmentFiles` (file, repeated, required): `assessment-test.qti.xml`, the item files
///   and their assets. File names may carry relative paths; a folder prefix shared by every
///   file is dropped.
/// - `results` (file, repeated, required): QTI result XML files
///
/// ### Responses
///
/// - `201 Created` with the stored workspace metadata
/// ```json
/// {
///   "success": true,
///   "data": {
///     "id": "ws_m3k2z1_a8f0qe",
///     "name": "Midterm",
///     "itemFiles": ["items/item-1.qti.xml"],
///     "assessmentTestFile": "assessment-test.qti.xml",
///     "resultFiles": ["alice.xml"],
///     "itemCount": 1,
///     "resultCount": 1,
///     "...": "..."
///   },
///   "message": "Workspace created successfully"
/// }
/// ```
///
/// - `400 Bad Request` for missing fields, unsafe paths or an inconsistent upload; `data`
///   lists every consistency problem
/// ```json
/// {
///   "success": false,
///   "data": [
///     "alice.xml has no itemResult with sequenceIndex=2",
///     "assessmentTest identifier does not match item identifier: item-3 != q3"
///   ],
///   "message": "Upload failed validation with 2 problems"
/// }
/// ```
pub async fn create_workspace(mut multipart: Multipart) -> Response {
    let mut params = NewWorkspace::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return bad_request("Invalid multipart body"),
        };
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" => match field.text().await {
                Ok(text) => params.name = text,
                Err(_) => return bad_request("Could not read field: name"),
            },
            "description" => match field.text().await {
                Ok(text) if !text.trim().is_empty() => params.description = Some(text),
                Ok(_) => {}
                Err(_) => return bad_request("Could not read field: description"),
            },
            "assessmentFiles" => match read_file_field(field, &field_name).await {
                Ok(file) => params.assessment_files.push(file),
                Err(response) => return response,
            },
            "results" => match read_file_field(field, &field_name).await {
                Ok(file) => params.result_files.push(file),
                Err(response) => return response,
            },
            _ => {}
        }
    }

    match WorkspaceService::create(params).await {
        Ok(workspace) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                workspace,
                "Workspace created successfully",
            )),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}

/// POST /api/workspaces/import
///
/// Restores a workspace from an archive produced by `GET /api/workspaces/{id}/export`.
///
/// ### Request Body (Multipart Form Data)
/// - `archive` (file, required): the exported ZIP
/// - `mode` (string, optional): `reject` (default) refuses to replace an existing workspace,
///   `overwrite` replaces it
///
/// ### Responses
///
/// - `201 Created`
/// ```json
/// {
///   "success": true,
///   "data": {
///     "manifest": { "version": 1, "workspaceCount": 1, "...": "..." },
///     "workspaceIds": ["ws_m3k2z1_a8f0qe"]
///   },
///   "message": "Workspace imported successfully"
/// }
/// ```
///
/// - `400 Bad Request` for a missing or malformed archive or an unknown mode
/// - `409 Conflict` when the workspace exists and `mode` is not `overwrite`
pub async fn import_workspace(mut multipart: Multipart) -> Response {
    let mut archive: Option<Vec<u8>> = None;
    let mut overwrite = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(_) => return bad_request("Invalid multipart body"),
        };
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "archive" => match field.bytes().await {
                Ok(bytes) => archive = Some(bytes.to_vec()),
                Err(_) => return bad_request("Could not read uploaded archive"),
            },
            "mode" => match field.text().await.as_deref().map(str::trim) {
                Ok("overwrite") => overwrite = true,
                Ok("reject") | Ok("") => overwrite = false,
                Ok(other) => return bad_request(format!("Unknown import mode '{other}'")),
                Err(_) => return bad_request("Could not read field: mode"),
            },
            _ => {}
        }
    }

    let Some(archive) = archive.filter(|bytes| !bytes.is_empty()) else {
        return bad_request("Missing archive upload");
    };

    match TransferService::import_zip(archive, overwrite).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(ApiResponse::<ImportOutcome>::success(
                outcome,
                "Workspace imported successfully",
            )),
        )
            .into_response(),
        Err(e) => service_error_response(e),
    }
}
