//! Service and HTTP error types.

use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use validator::ValidationErrors;

use crate::dto::timer::{ErrorResponse, TimerSnapshot};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Credential is valid but lacks the admin flag.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Control action refused; the record was left as `snapshot` shows.
    #[error("{message}")]
    Rejected {
        /// Human-readable reason.
        message: String,
        /// Current, unchanged timer state.
        snapshot: Box<TimerSnapshot>,
    },
}

impl ServiceError {
    /// Build a rejection carrying the unchanged timer state.
    pub fn rejected(message: impl Into<String>, snapshot: TimerSnapshot) -> Self {
        ServiceError::Rejected {
            message: message.into(),
            snapshot: Box::new(snapshot),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Missing or unknown credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Credential not allowed to perform the action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {message}")]
    Conflict {
        /// Human-readable reason.
        message: String,
        /// Unchanged timer state, when the conflict concerns a timer.
        timer: Option<Box<TimerSnapshot>>,
    },
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Rejected { message, snapshot } => AppError::Conflict {
                message,
                timer: Some(snapshot),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
        };

        let message = self.to_string();
        let timer = match self {
            AppError::Conflict { timer, .. } => timer.map(|snapshot| *snapshot),
            _ => None,
        };

        (status, Json(ErrorResponse { message, timer })).into_response()
    }
}
