//! The Content Generator contract and its production implementation.
//!
//! The contract is strict: either well-formed LaTeX comes back, or a
//! classified [`GenerationError`]. Malformed model output never propagates
//! downstream as valid markup — the compile pipeline sees only text that at
//! least looks like a document.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::generation::prompts::{
    EDIT_PROMPT_TEMPLATE, EDIT_SYSTEM, GENERATION_PROMPT_TEMPLATE, GENERATION_SYSTEM,
};
use crate::llm_client::{LlmClient, LlmError};

/// Structured profile data supplied by the caller for generation.
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeProfile {
    pub role: String,
    pub skills: Vec<String>,
    pub experience: String,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM call failed: {0}")]
    Upstream(#[from] LlmError),

    #[error("LLM returned empty content")]
    Empty,

    #[error("LLM output is not a LaTeX document")]
    NotLatex,
}

/// The content-generation boundary. `generate` fills a template with profile
/// data; `edit` applies a natural-language instruction to existing LaTeX.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        template_latex: &str,
        profile: &ResumeProfile,
    ) -> Result<String, GenerationError>;

    async fn edit(
        &self,
        current_latex: &str,
        instruction: &str,
    ) -> Result<String, GenerationError>;
}

/// Production generator backed by the shared LLM client.
pub struct LlmGenerator {
    llm: LlmClient,
}

impl LlmGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn call_latex(&self, prompt: &str, system: &str) -> Result<String, GenerationError> {
        let response = self.llm.call(prompt, system).await?;
        let text = response.text().ok_or(GenerationError::Empty)?;
        let latex = strip_code_fences(text).trim();
        if latex.is_empty() {
            return Err(GenerationError::Empty);
        }
        validate_latex_document(latex)?;
        debug!("generated LaTeX document ({} bytes)", latex.len());
        Ok(latex.to_string())
    }
}

#[async_trait]
impl ContentGenerator for LlmGenerator {
    async fn generate(
        &self,
        template_latex: &str,
        profile: &ResumeProfile,
    ) -> Result<String, GenerationError> {
        let prompt = GENERATION_PROMPT_TEMPLATE
            .replace("{role}", &profile.role)
            .replace("{skills}", &profile.skills.join(", "))
            .replace("{experience}", &profile.experience)
            .replace("{template_latex}", template_latex);
        self.call_latex(&prompt, GENERATION_SYSTEM).await
    }

    async fn edit(
        &self,
        current_latex: &str,
        instruction: &str,
    ) -> Result<String, GenerationError> {
        let prompt = EDIT_PROMPT_TEMPLATE
            .replace("{current_latex}", current_latex)
            .replace("{instruction}", instruction);
        self.call_latex(&prompt, EDIT_SYSTEM).await
    }
}

/// Strips ```latex ... ```, ```tex ... ```, or bare ``` ... ``` fences that
/// models wrap around code despite instructions.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    for tag in ["```latex", "```tex", "```"] {
        if let Some(stripped) = text.strip_prefix(tag) {
            return stripped
                .trim_start()
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or_else(|| stripped.trim_start());
        }
    }
    text
}

/// A generated document must at least declare a class and open a document
/// body; anything else is classified as malformed upstream output.
fn validate_latex_document(latex: &str) -> Result<(), GenerationError> {
    if latex.contains("\\documentclass") && latex.contains("\\begin{document}") {
        Ok(())
    } else {
        Err(GenerationError::NotLatex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\\documentclass{article}\n\\begin{document}\nHi\n\\end{document}";

    #[test]
    fn test_strip_code_fences_with_latex_tag() {
        let input = format!("```latex\n{DOC}\n```");
        assert_eq!(strip_code_fences(&input), DOC);
    }

    #[test]
    fn test_strip_code_fences_with_tex_tag() {
        let input = format!("```tex\n{DOC}\n```");
        assert_eq!(strip_code_fences(&input), DOC);
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = format!("```\n{DOC}\n```");
        assert_eq!(strip_code_fences(&input), DOC);
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        assert_eq!(strip_code_fences(DOC), DOC);
    }

    #[test]
    fn test_strip_code_fences_unterminated_fence() {
        let input = format!("```latex\n{DOC}");
        assert_eq!(strip_code_fences(&input), DOC);
    }

    #[test]
    fn test_validate_accepts_a_document() {
        assert!(validate_latex_document(DOC).is_ok());
    }

    #[test]
    fn test_validate_rejects_prose() {
        let result = validate_latex_document("Here is your resume! Let me know what you think.");
        assert!(matches!(result, Err(GenerationError::NotLatex)));
    }

    #[test]
    fn test_validate_rejects_fragment_without_preamble() {
        let result = validate_latex_document("\\section{Experience} did things");
        assert!(matches!(result, Err(GenerationError::NotLatex)));
    }
}
