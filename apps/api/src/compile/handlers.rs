//! Axum route handlers for compilation, preview, and artifact download.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

use super::export::ResolveError;

#[derive(Debug, Deserialize)]
pub struct CompileRequest {
    pub latex_content: String,
}

#[derive(Debug, Serialize)]
pub struct CompilePdfResponse {
    pub success: bool,
    pub pdf: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub pdf_url: String,
}

/// POST /api/compile-pdf
///
/// Compiles LaTeX and returns the PDF as a base64 data URI for iframe
/// embedding. The outcome is always decidable: `success` plus either the
/// data URI or a human-readable error, never a bare 500.
pub async fn handle_compile_pdf(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> Result<Json<CompilePdfResponse>, AppError> {
    if request.latex_content.trim().is_empty() {
        return Err(AppError::Validation(
            "latex_content cannot be empty".to_string(),
        ));
    }

    match state.latex.compile_and_encode(&request.latex_content).await {
        Ok(data_uri) => Ok(Json(CompilePdfResponse {
            success: true,
            pdf: Some(data_uri),
            error: None,
        })),
        Err(failure) => Ok(Json(CompilePdfResponse {
            success: false,
            pdf: None,
            error: Some(failure.user_message()),
        })),
    }
}

/// POST /api/preview
///
/// Compiles LaTeX, exports the artifact past its workspace's lifetime, and
/// returns the URL the frontend can fetch it from.
pub async fn handle_preview(
    State(state): State<AppState>,
    Json(request): Json<CompileRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    if request.latex_content.trim().is_empty() {
        return Err(AppError::Validation(
            "latex_content cannot be empty".to_string(),
        ));
    }

    let handle = state.latex.compile_and_export(&request.latex_content).await?;
    Ok(Json(PreviewResponse {
        pdf_url: format!("/api/download/{handle}"),
    }))
}

/// GET /api/download/:handle
///
/// Serves an exported artifact. Handles are validated before any filesystem
/// access; traversal-looking ones are a client error, swept or unknown ones
/// a 404.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let path = state
        .latex
        .exports()
        .resolve(&handle)
        .map_err(|e| match e {
            ResolveError::InvalidHandle => AppError::InvalidHandle,
            ResolveError::NotFound => AppError::NotFound(format!("Artifact {handle} not found")),
        })?;

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to read exported artifact: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"resume.pdf\"",
            ),
        ],
        bytes,
    ))
}
