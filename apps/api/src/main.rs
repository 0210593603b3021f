mod auth;
mod compile;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;
mod templates;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compile::{discovery, CompileService};
use crate::config::Config;
use crate::db::create_pool;
use crate::generation::LlmGenerator;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::templates::TemplateStore;

/// How often the retention sweep runs; the artifact TTL comes from config.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resgen_api={}", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Res-Gen API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client and the Content Generator boundary
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let generator = Arc::new(LlmGenerator::new(llm));

    // Load LaTeX templates once; shared read-only thereafter
    let templates = Arc::new(TemplateStore::load(&config.template_dir));
    if templates.is_empty() {
        warn!("No LaTeX templates loaded; /api/generate will have nothing to fill");
    }

    // Resolve the pdflatex toolchain once; its absence is a classified
    // per-request failure, not a startup error
    let handle = discovery::discover().await;
    let latex = Arc::new(CompileService::new(
        handle,
        &config.latex_dir,
        Duration::from_secs(config.compile_timeout_secs),
    )?);

    // Hourly retention sweep over exported artifacts
    let ttl = Duration::from_secs(config.artifact_ttl_hours * 60 * 60);
    let sweeper = Arc::clone(&latex);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tick.tick().await;
            sweeper.sweep_exports(ttl);
        }
    });

    // Build app state
    let state = AppState {
        db,
        generator,
        templates,
        latex,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
