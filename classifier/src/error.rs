//! Error handling

use std::path::PathBuf;

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

/// Request-time errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Client sent something we cannot classify; nothing was predicted
    #[error("{0}")]
    Validation(String),

    #[error("prediction failed: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::Validation(msg) => {
                tracing::debug!("Rejected request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.as_str())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "detail": detail,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

/// Fatal errors while loading the model artifacts
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("{kind} file not found: {}", .path.display())]
    MissingArtifact { kind: &'static str, path: PathBuf },

    #[error("invalid scaler {}: {reason}", .path.display())]
    InvalidScaler { path: PathBuf, reason: String },

    #[error("failed to load model {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },
}
