//! ffx-pa - Pronunciation Analysis Service
//!
//! Accepts a recorded utterance plus its target text, scores it with
//! SpeechAce, normalizes the result and adds per-word coaching feedback
//! generated by a language model.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ffx_common::config::{default_config_path, LoggingConfig};
use ffx_pa::config::{CliOverrides, PaTomlConfig, ServiceConfig};
use ffx_pa::services::{
    AnalysisOrchestrator, CompletionProvider, FeedbackGenerator, OpenAiChatClient, SpeechAceClient,
};
use ffx_pa::AppState;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "ffx-pa", version, about = "Francoflex pronunciation analysis service")]
struct Args {
    /// TOML config file (default: <config dir>/francoflex/ffx-pa.toml)
    #[arg(long, env = "FFX_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port (overrides FFX_PA_PORT and TOML)
    #[arg(long)]
    port: Option<u16>,

    /// Bind address (overrides TOML)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // An explicitly named config file must exist; the default one is optional
    let (config_path, required) = match &args.config {
        Some(path) => (Some(path.clone()), true),
        None => (default_config_path("ffx-pa"), false),
    };
    let toml = match &config_path {
        Some(path) => PaTomlConfig::load(path, required)?,
        None => PaTomlConfig::default(),
    };

    init_tracing(&toml.logging)?;

    info!("Starting ffx-pa (Pronunciation Analysis) v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config file: {}{}", path.display(), if path.exists() { "" } else { " (not found, using defaults)" });
    }

    let config = ServiceConfig::resolve(
        toml,
        &CliOverrides {
            bind_address: args.bind,
            port: args.port,
        },
    )?;

    let scoring = SpeechAceClient::new(config.scoring.clone())
        .context("Failed to create SpeechAce client")?;

    let provider: Option<Arc<dyn CompletionProvider>> = match config.feedback.api_key {
        Some(_) => Some(Arc::new(
            OpenAiChatClient::new(config.feedback.clone()).context("Failed to create OpenAI client")?,
        )),
        None => None,
    };
    let feedback = FeedbackGenerator::new(provider, config.feedback.max_concurrency);
    info!(
        model = %config.feedback.model,
        enabled = feedback.is_enabled(),
        "Feedback generator initialized"
    );

    let orchestrator = AnalysisOrchestrator::new(Arc::new(scoring), feedback);
    let app = ffx_pa::build_router(AppState::new(orchestrator));

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize tracing: RUST_LOG wins over the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let registry = tracing_subscriber::registry().with(filter);

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    Ok(())
}
