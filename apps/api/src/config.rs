use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Directory holding the seed LaTeX templates (`*.tex`).
    pub template_dir: PathBuf,
    /// Root of all transient LaTeX state: per-attempt workspaces live under
    /// `<latex_dir>/work`, exported artifacts flat in `<latex_dir>`.
    pub latex_dir: PathBuf,
    /// Hard wall-clock bound for a single pdflatex run.
    pub compile_timeout_secs: u64,
    /// Age after which exported artifacts are reclaimed by the sweep.
    pub artifact_ttl_hours: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            template_dir: std::env::var("TEMPLATE_DIR")
                .unwrap_or_else(|_| "templates".to_string())
                .into(),
            latex_dir: std::env::var("LATEX_DIR")
                .unwrap_or_else(|_| "temp_latex".to_string())
                .into(),
            compile_timeout_secs: std::env::var("COMPILE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("COMPILE_TIMEOUT_SECS must be a number of seconds")?,
            artifact_ttl_hours: std::env::var("ARTIFACT_TTL_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse::<u64>()
                .context("ARTIFACT_TTL_HOURS must be a number of hours")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
