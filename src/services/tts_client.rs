//! Text-to-speech client
//!
//! Optional collaborator: the render stage invokes it when configured, and a
//! synthesis failure never fails the job (the article simply completes
//! without an audio artifact).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// TTS client errors
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-to-speech collaborator seam
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for the given text, returning the artifact path.
    async fn synthesize(&self, article_id: Uuid, text: &str) -> Result<PathBuf, TtsError>;
}

/// HTTP TTS client: POSTs the text to a synthesis endpoint and writes the
/// returned audio bytes to `{audio_dir}/article_{id}.mp3`.
pub struct HttpTtsClient {
    http_client: reqwest::Client,
    endpoint: String,
    audio_dir: PathBuf,
}

impl HttpTtsClient {
    pub fn new(endpoint: String, audio_dir: &Path, timeout: Duration) -> Result<Self, TtsError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint,
            audio_dir: audio_dir.to_path_buf(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpTtsClient {
    async fn synthesize(&self, article_id: Uuid, text: &str) -> Result<PathBuf, TtsError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ApiError(status.as_u16(), error_text));
        }

        let audio_bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let output_path = self.audio_dir.join(format!("article_{}.mp3", article_id));
        tokio::fs::write(&output_path, &audio_bytes).await?;

        tracing::info!(
            article_id = %article_id,
            path = %output_path.display(),
            bytes = audio_bytes.len(),
            "Audio artifact written"
        );

        Ok(output_path)
    }
}
