use crate::services::{record_service::RecordError, storage_service::UploadError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// The error shape every handler and middleware answers with.
///
/// Renders as `{ "error": message }`, plus `"details"` when one is attached.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            details: None,
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// Shortcut for 401 Unauthorized
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    /// Shortcut for 413 Payload Too Large
    pub fn payload_too_large(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, msg)
    }

    /// 500 with the fixed `internal_error` message and the cause in `details`.
    pub fn internal_error(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal_error".into(),
            details: Some(details.into()),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::new(rejection.status(), rejection.body_text())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(err) => AppError::internal_error(err.to_string()),
            UploadError::Multipart(err) => AppError::new(err.status(), err.body_text()),
            err @ UploadError::FileTooLarge { .. } => AppError::payload_too_large(err.to_string()),
            other => AppError::new(other.status(), other.to_string()),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        if err.is_validation() {
            AppError::bad_request(err.to_string())
        } else {
            AppError::internal_error(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_carries_details() {
        let err = AppError::internal_error("no such table: t");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal_error");
        assert_eq!(err.to_string(), "internal_error: no such table: t");
    }

    #[test]
    fn upload_rejections_keep_their_status() {
        let err = AppError::from(UploadError::InvalidExtension("a.txt".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "only .txt.gz files are allowed");

        let err = AppError::from(UploadError::FileTooLarge {
            name: "a.txt.gz".into(),
            limit: 1,
        });
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);

        let err = AppError::from(UploadError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details.as_deref(), Some("disk full"));
    }

    #[test]
    fn record_errors_split_between_400_and_500() {
        let err = AppError::from(RecordError::MissingTable);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "table required");
        assert!(err.details.is_none());

        let err = AppError::from(RecordError::UnknownTable("nope".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal_error");
        assert!(err.details.unwrap().contains("nope"));
    }

    #[test]
    fn unauthorized_uses_fixed_message() {
        let err = AppError::unauthorized();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Unauthorized");
    }
}
