//! Error types for the OCR Desk server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::document::LoaderError;
use crate::ocr::{EngineConfigError, OcrError};
use crate::session::{SessionError, TransitionError};

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Missing system dependency: {0}")]
    MissingDependency(String),

    #[error("Failed to load OCR model: {0}")]
    ModelLoad(String),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid transition: {0}")]
    Conflict(#[from] TransitionError),

    #[error("Invalid document: {0}")]
    Loader(#[from] LoaderError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] EngineConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<OcrError> for AppError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::MissingDependency(msg) => AppError::MissingDependency(msg),
            OcrError::ModelLoad(msg) => AppError::ModelLoad(msg),
            other => AppError::Extraction(other.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(id) => AppError::NotFound(format!("Session {}", id)),
            SessionError::Transition(e) => AppError::Conflict(e),
            SessionError::Config(e) => AppError::Config(e),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::BadRequest(format!("Failed to read upload: {}", e.body_text()))
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::UnsupportedInput(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_input")
            }
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            AppError::MissingDependency(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "missing_dependency")
            }
            AppError::ModelLoad(_) => (StatusCode::BAD_GATEWAY, "model_load_failed"),
            AppError::Extraction(_) => (StatusCode::BAD_GATEWAY, "extraction_failed"),
            AppError::Conflict(TransitionError::Halted(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "missing_dependency")
            }
            AppError::Conflict(_) => (StatusCode::CONFLICT, "invalid_transition"),
            AppError::Loader(LoaderError::TooManyPages { .. }) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "too_many_pages")
            }
            AppError::Loader(
                LoaderError::Io(_) | LoaderError::Task(_) | LoaderError::Encode(_),
            ) => (StatusCode::INTERNAL_SERVER_ERROR, "loader_error"),
            AppError::Loader(_) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_document"),
            AppError::Config(_) => (StatusCode::BAD_REQUEST, "invalid_config"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_code();

        let message = if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(error = %self, "Request failed");
            match &self {
                AppError::Internal(_) | AppError::Loader(_) => {
                    "An internal error occurred".to_string()
                }
                other => other.to_string(),
            }
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
            self.to_string()
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(format!("{:?}", self))
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Screen;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(status(AppError::UnsupportedInput("x.docx".into())), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(status(AppError::MissingDependency("tesseract".into())), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status(AppError::ModelLoad("parseq".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(AppError::NotFound("s".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(AppError::Conflict(TransitionError::NotAllowed {
                action: "apply_config",
                screen: Screen::Home
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(EngineConfigError::UnknownDetector("yolo".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status(LoaderError::Empty.into()), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_ocr_error_mapping() {
        assert!(matches!(
            AppError::from(OcrError::MissingDependency("x".into())),
            AppError::MissingDependency(_)
        ));
        assert!(matches!(
            AppError::from(OcrError::ModelLoad("x".into())),
            AppError::ModelLoad(_)
        ));
        assert!(matches!(
            AppError::from(OcrError::ApiError("x".into())),
            AppError::Extraction(_)
        ));
    }

    #[test]
    fn test_halted_session_reports_dependency() {
        let err: AppError = SessionError::Transition(TransitionError::Halted("no tesseract".into())).into();
        assert_eq!(status(err), StatusCode::SERVICE_UNAVAILABLE);
    }
}
