use qti::QtiError;
use thiserror::Error;

/// Failures of the workspace services.
///
/// Data-quality problems of uploads come back as [`ServiceError::Validation`] with one message per
/// problem; everything else carries a single message or the underlying error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Qti(#[from] QtiError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_joined_by_newlines() {
        let err = ServiceError::Validation(vec!["first".into(), "second".into()]);
        assert_eq!(err.to_string(), "first\nsecond");
    }

    #[test]
    fn qti_errors_render_transparently() {
        let err = ServiceError::from(QtiError::UnresolvedReference { href: "a.xml".into() });
        assert_eq!(err.to_string(), QtiError::UnresolvedReference { href: "a.xml".into() }.to_string());
    }
}
