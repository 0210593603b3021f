pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::compile::handlers as compile;
use crate::generation::handlers as generation;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Identity
        .route("/api/auth/signup", post(auth::handle_signup))
        .route("/api/auth/login", post(auth::handle_login))
        .route("/api/auth/me", get(auth::handle_me))
        // Templates & generation
        .route("/api/templates", get(generation::handle_list_templates))
        .route("/api/generate", post(generation::handle_generate))
        .route("/api/edit", post(generation::handle_edit))
        // Compilation pipeline
        .route("/api/compile-pdf", post(compile::handle_compile_pdf))
        .route("/api/preview", post(compile::handle_preview))
        .route("/api/download/:handle", get(compile::handle_download))
        .with_state(state)
}
