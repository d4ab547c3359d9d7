use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("that time slot is already booked, please choose another slot")]
    SlotUnavailable,

    #[error("could not issue a unique booking id")]
    DuplicateBookingId,

    #[error("cannot move booking from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidSelection(msg.into())
    }

    /// Machine-readable code rendered in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidSelection(_) => "InvalidSelection",
            AppError::SlotUnavailable => "SlotUnavailable",
            AppError::DuplicateBookingId => "DuplicateBookingId",
            AppError::IllegalTransition { .. } => "IllegalTransition",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized => "Unauthorized",
            AppError::Database(_) | AppError::Internal(_) => "InternalError",
        }
    }
}

// Extractor failures (bad slot label, unknown plan, malformed date) are
// selection errors to the caller.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidSelection(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidSelection(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidSelection(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidSelection(_) => StatusCode::BAD_REQUEST,
            AppError::SlotUnavailable => StatusCode::BAD_REQUEST,
            AppError::DuplicateBookingId => StatusCode::BAD_REQUEST,
            AppError::IllegalTransition { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                "internal error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = ?e, "unexpected failure");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({ "error": self.code(), "message": message });
        (status, axum::Json(body)).into_response()
    }
}
