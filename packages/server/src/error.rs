use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::MediaError;
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

/// Envelope returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    /// HTTP status code, repeated in the body.
    #[schema(example = 400)]
    pub status_code: u16,
    /// Always `null` for errors.
    #[schema(value_type = Option<Object>)]
    pub data: Option<()>,
    /// Human-readable error description.
    #[schema(example = "All fields are required")]
    pub message: String,
    /// Always `false` for errors.
    pub success: bool,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// The media store could not accept an upload.
    UploadFailed(String),
    Internal(String),
}

impl AppError {
    fn status_and_message(self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::TokenMissing => (StatusCode::UNAUTHORIZED, "Unauthorized request".into()),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".into(),
            ),
            AppError::InvalidCredentials(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::UploadFailed(detail) => {
                tracing::error!("Media upload failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Media upload failed".into(),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        }
    }

    pub fn into_body(self) -> (StatusCode, ErrorBody) {
        let (status, message) = self.status_and_message();
        (
            status,
            ErrorBody {
                status_code: status.as_u16(),
                data: None,
                message,
                success: false,
            },
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                tracing::debug!("Unique constraint violated: {detail}");
                AppError::Conflict("Resource already exists".into())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        AppError::UploadFailed(err.to_string())
    }
}
