use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::notices::Notice;
use crate::session::SessionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let message = err.to_string();
        match err {
            SessionError::UnreadableUpload | SessionError::MissingField(_) => {
                AppError::Validation(message)
            }
            SessionError::UnknownCase(_) => AppError::NotFound(message),
            SessionError::NothingExtracted
            | SessionError::EmptyExpertSolution(_)
            | SessionError::EvaluationFailed => AppError::UnprocessableEntity(message),
            SessionError::InvalidTransition { .. } | SessionError::NotInVariant { .. } => {
                AppError::Conflict(message)
            }
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// A failed wizard step: the error plus every notice the step emitted,
/// including raw model output when a stage could not parse it.
#[derive(Debug)]
pub struct StepError {
    pub error: AppError,
    pub notices: Vec<Notice>,
}

impl StepError {
    pub fn new(error: impl Into<AppError>, notices: Vec<Notice>) -> Self {
        Self {
            error: error.into(),
            notices,
        }
    }
}

impl From<AppError> for StepError {
    fn from(error: AppError) -> Self {
        Self::new(error, Vec::new())
    }
}

impl IntoResponse for StepError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.error.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            },
            "notices": self.notices
        }));

        (status, body).into_response()
    }
}
