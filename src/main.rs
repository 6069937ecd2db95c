//! pagemill - article ingestion service
//!
//! Accepts URL submissions over HTTP, processes each article through the
//! fetch → parse → chunk → summarize → render pipeline on a background
//! worker pool, and serves job status for polling dashboards.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pagemill::config::Settings;
use pagemill::pipeline::{HttpFetcher, Orchestrator, PipelineConfig, RenderFormat, Summarizer};
use pagemill::services::{GenerationClient, HttpTtsClient, SpeechSynthesizer};
use pagemill::worker::{spawn_workers, RetryPolicy};
use pagemill::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting pagemill (article ingestion service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    info!("Database: {}", settings.database_path.display());

    let db_pool = pagemill::db::init_database_pool(&settings.database_path).await?;
    info!("Database connection established");

    // Pipeline collaborators, explicitly constructed and injected
    let fetcher = Arc::new(HttpFetcher::new(
        Duration::from_secs(settings.fetch_timeout_secs),
        settings.max_content_length_bytes,
    )?);

    let generator = Arc::new(GenerationClient::new(
        settings.generation_base_url.clone(),
        settings.generation_model.clone(),
        settings.generation_api_key.clone(),
        Duration::from_secs(settings.generation_timeout_secs),
    )?);
    let summarizer = Summarizer::new(generator, settings.summary_input_budget_chars);

    let synthesizer: Option<Arc<dyn SpeechSynthesizer>> = match &settings.tts_endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, "Text-to-speech enabled");
            Some(Arc::new(HttpTtsClient::new(
                endpoint.clone(),
                &settings.audio_dir,
                Duration::from_secs(settings.tts_timeout_secs),
            )?))
        }
        None => {
            info!("Text-to-speech not configured, audio rendering disabled");
            None
        }
    };

    let orchestrator = Arc::new(Orchestrator::new(
        db_pool.clone(),
        fetcher,
        summarizer,
        synthesizer,
        PipelineConfig {
            chunk_size_chars: settings.chunk_size_chars,
            max_chunks: settings.max_chunks,
            render_format: RenderFormat::Text,
            accept_fallback_summary: settings.accept_fallback_summary,
        },
    ));

    let jobs = spawn_workers(orchestrator, settings.workers, RetryPolicy::default(), 256);
    info!(workers = settings.workers, "Pipeline worker pool started");

    let state = AppState::new(db_pool, jobs);
    let app = pagemill::build_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Listening on http://{}", settings.bind_address);
    info!("Health check: http://{}/health", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
