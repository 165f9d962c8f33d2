use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::{ApiResponse, ValidationError};

pub type ApiResult<T> = Result<T, ApiError>;

/// ApiError
///
/// Every failure a handler can surface. Each variant owns its HTTP status; the
/// `IntoResponse` impl renders it inside the standard `{success, message, error}`
/// envelope. Server-side failures are logged and masked.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unparseable body, query string or path segment.
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A well-formed request rejected by a business rule (e.g. wrong password).
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Unauthorized(String),

    /// The refresh token is genuine but its lifetime is over.
    #[error("unauthorized, your session was ended earlier")]
    SessionEnded,

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) | Self::Rejected(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) | Self::SessionEnded => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Token(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body: ApiResponse<()> = match &self {
            Self::BadRequest(_) | Self::Validation(_) | Self::Unauthorized(_) => {
                ApiResponse::error(self.to_string())
            }
            Self::Rejected(msg) | Self::NotFound(msg) => ApiResponse::failure(msg.clone()),
            Self::SessionEnded => ApiResponse::failure(self.to_string()),
            Self::Database(e) => {
                tracing::error!(error = ?e, "database error");
                ApiResponse::error("an internal error occurred")
            }
            Self::Token(e) => {
                tracing::error!(error = ?e, "token signing error");
                ApiResponse::error("an internal error occurred")
            }
            Self::Internal(msg) => {
                tracing::error!("internal error: {}", msg);
                ApiResponse::error("an internal error occurred")
            }
        };

        (status, Json(body)).into_response()
    }
}
