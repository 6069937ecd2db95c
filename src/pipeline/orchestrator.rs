//! Pipeline orchestrator
//!
//! The only component that knows stage order and touches persistence. Drives
//! an article through fetch → parse → chunk → summarize → render, committing
//! the in-progress status *before* each stage's work so a crash mid-stage
//! leaves a durable record of the last attempted stage, and converting every
//! stage failure into the absorbing FAILED state with a recorded cause.
//!
//! `run` never propagates an error to its caller: a thrown error would leave
//! the job stuck in an in-progress status with no recorded cause.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db;
use crate::models::{Article, ArticleStatus};
use crate::pipeline::{chunk_text, parse_html, render, PageFetcher, RenderFormat, Summarizer};
use crate::services::SpeechSynthesizer;

/// Stage-level failure, split by expectation.
///
/// Expected misses (no content, parse miss, rejected fallback) log at warn;
/// unexpected faults (storage breakage mid-run) log at error. Both funnel
/// into the same FAILED transition.
#[derive(Debug)]
pub enum StageError {
    Soft(String),
    Fault(anyhow::Error),
}

impl StageError {
    fn message(&self) -> String {
        match self {
            StageError::Soft(msg) => msg.clone(),
            StageError::Fault(err) => err.to_string(),
        }
    }
}

/// Terminal result of one `run` invocation
#[derive(Debug)]
pub enum RunOutcome {
    /// Pipeline finished; article is COMPLETED
    Completed,
    /// Pipeline stopped; article is FAILED with the recorded message
    Failed { message: String },
    /// Article was already COMPLETED or FAILED; nothing was mutated
    AlreadyTerminal(ArticleStatus),
    /// No such article; logged, not retried
    NotFound,
    /// Store unreachable before any stage ran; safe for the queue to retry
    Unavailable { message: String },
}

impl RunOutcome {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RunOutcome::Unavailable { .. })
    }
}

/// Pipeline tuning taken from the configuration surface
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub chunk_size_chars: usize,
    pub max_chunks: usize,
    pub render_format: RenderFormat,
    /// When false, a degraded (fallback) summary fails the job instead of
    /// completing it.
    pub accept_fallback_summary: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size_chars: 1000,
            max_chunks: 50,
            render_format: RenderFormat::Text,
            accept_fallback_summary: true,
        }
    }
}

/// Drives articles through the pipeline; collaborators are injected, never
/// global.
pub struct Orchestrator {
    db: SqlitePool,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: Summarizer,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        db: SqlitePool,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: Summarizer,
        synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            db,
            fetcher,
            summarizer,
            synthesizer,
            config,
        }
    }

    /// Process one article end-to-end. Idempotent on terminal articles and
    /// infallible: every failure mode maps to a `RunOutcome`.
    pub async fn run(&self, article_id: Uuid) -> RunOutcome {
        let mut article = match db::articles::load_article(&self.db, article_id).await {
            Ok(Some(article)) => article,
            Ok(None) => {
                warn!(article_id = %article_id, "Article not found, nothing to process");
                return RunOutcome::NotFound;
            }
            Err(e) => {
                error!(article_id = %article_id, error = %e, "Could not load article from store");
                return RunOutcome::Unavailable {
                    message: e.to_string(),
                };
            }
        };

        if article.status.is_terminal() {
            debug!(
                article_id = %article_id,
                status = %article.status,
                "Article already terminal, skipping"
            );
            return RunOutcome::AlreadyTerminal(article.status);
        }

        match self.execute_stages(&mut article).await {
            Ok(()) => {
                info!(
                    article_id = %article_id,
                    word_count = article.word_count,
                    chunk_count = article.chunk_count,
                    "Article processed successfully"
                );
                RunOutcome::Completed
            }
            Err(stage_error) => self.fail(article, stage_error).await,
        }
    }

    async fn execute_stages(&self, article: &mut Article) -> Result<(), StageError> {
        // Stage 1: FETCH
        self.advance(article, ArticleStatus::Fetching).await;

        let html = self
            .fetcher
            .fetch(&article.url)
            .await
            .ok_or_else(|| StageError::Soft("Failed to fetch article".to_string()))?;
        article.raw_html = Some(html);

        // Stage 2: PARSE
        self.advance(article, ArticleStatus::Parsing).await;

        let parsed = parse_html(article.raw_html.as_deref().unwrap_or(""))
            .ok_or_else(|| StageError::Soft("Failed to parse article".to_string()))?;
        article.title = Some(parsed.title.clone());
        article.parsed_text = Some(parsed.text);
        article.word_count = Some(parsed.word_count);

        // Stage 3: CHUNK
        self.advance(article, ArticleStatus::Chunking).await;

        let chunks = chunk_text(
            article.parsed_text.as_deref().unwrap_or(""),
            self.config.chunk_size_chars,
            self.config.max_chunks,
        );
        if chunks.is_empty() {
            return Err(StageError::Soft(
                "Chunking produced no segments".to_string(),
            ));
        }
        article.chunk_count = Some(chunks.len() as i64);

        // Stage 4: SUMMARIZE
        self.advance(article, ArticleStatus::Summarizing).await;

        let outcome = self.summarizer.summarize(&chunks, &parsed.title).await;
        if outcome.degraded && !self.config.accept_fallback_summary {
            return Err(StageError::Soft(
                "Summarization failed and fallback summaries are disabled".to_string(),
            ));
        }
        article.summary = Some(outcome.text);

        // Stage 5: RENDER
        self.advance(article, ArticleStatus::Rendering).await;

        // Text/bullet artifacts are derived on demand from the stored
        // summary; only the audio reference persists.
        let summary = article.summary.as_deref().unwrap_or("");
        match render(summary, self.config.render_format) {
            crate::pipeline::RenderedArtifact::Text { content } => {
                debug!(article_id = %article.id, chars = content.len(), "Rendered text summary");
            }
            crate::pipeline::RenderedArtifact::Bullets { content } => {
                debug!(article_id = %article.id, bullets = content.len(), "Rendered bullet summary");
            }
            crate::pipeline::RenderedArtifact::Audio { .. } => {}
        }

        // Audio is optional and independent: synthesis failure never fails
        // the job.
        if let Some(synthesizer) = &self.synthesizer {
            match synthesizer.synthesize(article.id, summary).await {
                Ok(path) => article.audio_path = Some(path.display().to_string()),
                Err(e) => {
                    warn!(
                        article_id = %article.id,
                        error = %e,
                        "Audio synthesis failed (non-fatal), continuing without audio"
                    );
                }
            }
        }

        // Terminal success: this commit is authoritative for pollers, so a
        // commit error here is a fault, not a success.
        let transition = article.transition_to(ArticleStatus::Completed);
        article.completed_at = Some(transition.transitioned_at);
        db::articles::save_article(&self.db, article)
            .await
            .map_err(|e| StageError::Fault(e.context("Final completion commit failed")))?;

        Ok(())
    }

    /// Transition to an in-progress status and persist before stage work
    /// begins. The commit is best-effort: an unreachable store is logged and
    /// the run continues, leaving a stale-status window detectable by
    /// external monitoring.
    async fn advance(&self, article: &mut Article, status: ArticleStatus) {
        let transition = article.transition_to(status);
        debug!(
            article_id = %article.id,
            from = %transition.old_status,
            to = %transition.new_status,
            "Stage transition"
        );

        if let Err(e) = db::articles::save_article(&self.db, article).await {
            warn!(
                article_id = %article.id,
                status = %status,
                error = %e,
                "Could not persist stage transition (continuing)"
            );
        }
    }

    /// Move the article to FAILED with a recorded cause. A failing
    /// failure-commit is logged and swallowed; the caller still gets a
    /// normal `Failed` outcome.
    async fn fail(&self, mut article: Article, stage_error: StageError) -> RunOutcome {
        let message = stage_error.message();

        match &stage_error {
            StageError::Soft(_) => warn!(
                article_id = %article.id,
                status = %article.status,
                message = %message,
                "Pipeline stage failed"
            ),
            StageError::Fault(err) => error!(
                article_id = %article.id,
                status = %article.status,
                error = ?err,
                "Pipeline stage faulted"
            ),
        }

        article.transition_to(ArticleStatus::Failed);
        article.error_message = Some(message.clone());
        // A FAILED article is never a completed one, even when the failure
        // was the completion commit itself.
        article.completed_at = None;

        if let Err(e) = db::articles::save_article(&self.db, &article).await {
            error!(
                article_id = %article.id,
                error = %e,
                "Could not record failure state"
            );
        }

        RunOutcome::Failed { message }
    }

    /// Best-effort FAILED commit for failures detected outside `run`
    /// (e.g. a panicked worker task). Terminal articles are left untouched.
    pub async fn record_failure(&self, article_id: Uuid, message: &str) {
        match db::articles::load_article(&self.db, article_id).await {
            Ok(Some(article)) if !article.status.is_terminal() => {
                let _ = self
                    .fail(article, StageError::Soft(message.to_string()))
                    .await;
            }
            Ok(_) => {}
            Err(e) => {
                error!(
                    article_id = %article_id,
                    error = %e,
                    "Could not load article to record external failure"
                );
            }
        }
    }
}
