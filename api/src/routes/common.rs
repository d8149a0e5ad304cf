//! Helpers shared by every route group.

use crate::response::ApiResponse;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::error::ServiceError;
use tracing::error;
use validator::ValidationErrors;

/// Joins the messages of every failed field rule with `"; "`.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| {
            errs.iter()
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Maps a [`ServiceError`] onto a status code and an `ApiResponse` envelope.
///
/// | error                            | status |
/// |----------------------------------|--------|
/// | `NotFound`                       | 404    |
/// | `Validation` (messages in data)  | 400    |
/// | `BadRequest`, `Qti`, `Zip`       | 400    |
/// | `Conflict`                       | 409    |
/// | `Io`, `Json`                     | 500    |
pub fn service_error_response(err: ServiceError) -> Response {
    match err {
        ServiceError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::error(msg)),
        )
            .into_response(),
        ServiceError::Validation(messages) => {
            let summary = match messages.len() {
                1 => messages[0].clone(),
                n => format!("Upload failed validation with {n} problems"),
            };
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error_with_data(messages, summary)),
            )
                .into_response()
        }
        ServiceError::BadRequest(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(msg)),
        )
            .into_response(),
        ServiceError::Qti(e) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(e.to_string())),
        )
            .into_response(),
        ServiceError::Zip(e) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(format!("Invalid ZIP archive: {e}"))),
        )
            .into_response(),
        ServiceError::Conflict(msg) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<()>::error(msg)),
        )
            .into_response(),
        other => {
            error!("Request failed: {other}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error("Internal server error")),
            )
                .into_response()
        }
    }
}
