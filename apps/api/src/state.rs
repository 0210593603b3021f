use std::sync::Arc;

use sqlx::PgPool;

use crate::compile::CompileService;
use crate::generation::ContentGenerator;
use crate::templates::TemplateStore;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Everything here is initialized once in `main` and read-only afterwards;
/// handlers get explicit handles instead of reaching for globals.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// The Content Generator boundary. Production: `LlmGenerator`.
    pub generator: Arc<dyn ContentGenerator>,
    pub templates: Arc<TemplateStore>,
    /// Compilation pipeline: resolved compiler handle, workspace root,
    /// export store.
    pub latex: Arc<CompileService>,
}
