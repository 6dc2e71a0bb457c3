use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Note not found")]
    NotFound,
    #[error("Invalid id")]
    InvalidId,
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Status code and client-facing message. Internal failures are logged
    /// here and replaced by a generic message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(_)
            | AppError::InvalidId
            | AppError::InvalidArgument(_)
            | AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Same mapping as [`AppError`] but rendered as `{"message": ...}`.
#[derive(Debug)]
pub struct MessageError(pub AppError);

impl From<AppError> for MessageError {
    fn from(e: AppError) -> Self {
        MessageError(e)
    }
}

impl From<JsonRejection> for MessageError {
    fn from(rejection: JsonRejection) -> Self {
        MessageError(rejection.into())
    }
}

impl IntoResponse for MessageError {
    fn into_response(self) -> Response {
        let (status, message) = self.0.status_and_message();
        (status, Json(json!({ "message": message }))).into_response()
    }
}
