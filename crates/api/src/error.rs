use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bestiary_core::error::CoreError;
use serde_json::json;

/// Body returned for every failed intake.
const GENERIC_ERROR_MESSAGE: &str = "An error occurred";

/// Application-level error type for HTTP handlers.
///
/// Every variant renders as HTTP 500 with `{"message": "An error occurred"}`.
/// The detail is logged, never returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `bestiary_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The request body could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Core(err) => tracing::warn!(error = %err, "Rejected request"),
            AppError::BadRequest(msg) => tracing::warn!(error = %msg, "Malformed request body"),
            AppError::Database(err) => tracing::error!(error = %err, "Database error"),
        }

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({ "message": GENERIC_ERROR_MESSAGE })),
        )
            .into_response()
    }
}
