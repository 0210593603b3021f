use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::compile::{CompileFailure, FailureKind};

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid download handle")]
    InvalidHandle,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Compilation failed: {0}")]
    Compile(#[from] CompileFailure),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::InvalidHandle => (
                StatusCode::BAD_REQUEST,
                "INVALID_HANDLE",
                "Invalid download handle".to_string(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Invalid credentials".to_string(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Generation(msg) => {
                tracing::error!("Generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Compile(failure) => {
                match failure.kind {
                    FailureKind::IoError => {
                        tracing::error!("Compile I/O error: {}", failure.diagnostics)
                    }
                    _ => tracing::warn!(
                        "Compilation failed ({}): {}",
                        failure.kind,
                        failure.diagnostics
                    ),
                }
                (
                    compile_failure_status(failure.kind),
                    failure.kind.as_str(),
                    failure.user_message(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

/// Status mapping for classified compile failures. A missing toolchain is a
/// first-class, explained condition, not an internal error.
fn compile_failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::CompilerNotFound => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        FailureKind::SyntaxOrBuildError => StatusCode::UNPROCESSABLE_ENTITY,
        FailureKind::IoError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
