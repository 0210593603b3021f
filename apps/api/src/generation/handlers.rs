//! Axum route handlers for the generation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::generator::ResumeProfile;
use crate::state::AppState;
use crate::templates::TemplateInfo;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub role: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience: String,
    #[serde(default = "default_template_id")]
    pub template_id: String,
}

fn default_template_id() -> String {
    "modern".to_string()
}

#[derive(Debug, Serialize)]
pub struct GeneratedResume {
    pub latex_content: String,
}

#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub latex_content: String,
    pub instruction: String,
}

/// GET /api/templates
pub async fn handle_list_templates(State(state): State<AppState>) -> Json<Vec<TemplateInfo>> {
    Json(state.templates.list())
}

/// POST /api/generate
///
/// Fills the selected template with the user's profile via the Content
/// Generator. An unknown template id falls back to the first available
/// template; only an empty store is an error.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GeneratedResume>, AppError> {
    if request.role.trim().is_empty() {
        return Err(AppError::Validation("role cannot be empty".to_string()));
    }
    if request.experience.trim().is_empty() {
        return Err(AppError::Validation(
            "experience cannot be empty".to_string(),
        ));
    }

    let template = state
        .templates
        .lookup_or_first(&request.template_id)
        .ok_or_else(|| AppError::NotFound("No templates available".to_string()))?
        .to_string();

    let profile = ResumeProfile {
        role: request.role,
        skills: request.skills,
        experience: request.experience,
    };

    let latex_content = state
        .generator
        .generate(&template, &profile)
        .await
        .map_err(|e| AppError::Generation(e.to_string()))?;

    Ok(Json(GeneratedResume { latex_content }))
}

/// POST /api/edit
///
/// Applies a natural-language instruction to existing LaTeX via the Content
/// Generator and returns the full modified document.
pub async fn handle_edit(
    State(state): State<AppState>,
    Json(request): Json<EditRequest>,
) -> Result<Json<GeneratedResume>, AppError> {
    if request.latex_content.trim().is_empty() {
        return Err(AppError::Validation(
            "latex_content cannot be empty".to_string(),
        ));
    }
    if request.instruction.trim().is_empty() {
        return Err(AppError::Validation(
            "instruction cannot be empty".to_string(),
        ));
    }

    let latex_content = state
        .generator
        .edit(&request.latex_content, &request.instruction)
        .await
        .map_err(|e| AppError::Generation(e.to_string()))?;

    Ok(Json(GeneratedResume { latex_content }))
}
