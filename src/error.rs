use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;
use thiserror::Error;

pub type AppResult<T> = core::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced user, list, item or parent does not exist, or belongs to someone else.
    #[error("{0}")]
    NotFound(String),
    /// Missing or rejected credentials.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    InvalidInput(String),
    /// Structurally illegal change, e.g. moving an item under its own descendant.
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("invalid token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) | AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) | AppError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            json!({"status": "error", "message": self.to_string()})
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
            json!({"status": "fail", "message": self.to_string()})
        };
        (status, Json(body)).into_response()
    }
}

/// Trims `value` and rejects it when nothing is left.
pub(crate) fn require_text<'a>(value: &'a str, field: &str) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed)
}
