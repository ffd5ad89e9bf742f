use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use backup_core::BackupError;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Failed(String),

    #[error("{message}")]
    Process { message: String, output: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<BackupError> for AppError {
    fn from(err: BackupError) -> Self {
        match err {
            BackupError::NotFound(_) => AppError::NotFound(err.to_string()),
            BackupError::AlreadyExists(_) => AppError::Conflict(err.to_string()),
            BackupError::Unauthorized => AppError::Unauthorized(err.to_string()),
            BackupError::Forbidden(_) => AppError::Forbidden(err.to_string()),
            BackupError::ExternalProcess { message, output } => AppError::Process { message, output },
            e if e.is_client_error() => AppError::BadRequest(e.to_string()),
            e => AppError::Failed(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "success": false, "message": m })),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "success": false, "message": m })),
            AppError::Conflict(m) => (StatusCode::CONFLICT, json!({ "success": false, "message": m })),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, json!({ "success": false, "message": m })),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "success": false, "message": m })),
            AppError::Failed(m) => {
                tracing::warn!("Backup operation failed: {m}");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "success": false, "message": m }))
            }
            AppError::Process { message, output } => {
                tracing::warn!(output = %output, "External command failed: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": message, "output": output }),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "success": false, "message": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
