use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or invalid API key")]
    Unauthorized,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code placed in the `error` field of the body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::InvalidPayload(_) => "invalid-payload",
            AppError::NotFound(_) => "not-found",
            AppError::Database(_) => "internal-error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            AppError::Unauthorized => json!({ "error": self.code() }),
            AppError::InvalidPayload(msg) | AppError::NotFound(msg) => {
                json!({ "error": self.code(), "message": msg })
            }
            AppError::Database(e) => {
                // Storage details stay in the logs.
                error!(error = %e, "Database failure");
                json!({ "error": self.code() })
            }
        };
        (status, Json(body)).into_response()
    }
}
