//! Text-generation API client
//!
//! Talks to an OpenAI-compatible chat-completions endpoint (OpenRouter by
//! default) with bearer authentication and a bounded timeout. Callers treat
//! every failure here as recoverable: the summarize stage degrades to a
//! fallback summary instead of failing the pipeline.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = "pagemill/0.1.0 (article ingestion service)";

/// Generation client errors
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("API key not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Text-generation collaborator seam
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce generated text for a prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// HTTP client for an OpenAI-compatible chat-completions API
pub struct GenerationClient {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GenerationClient {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for GenerationClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Querying generation API");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError(status.as_u16(), error_text));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let content = response_json["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .ok_or_else(|| {
                GenerationError::ParseError("no choices[0].message.content in response".to_string())
            })?;

        if content.trim().is_empty() {
            return Err(GenerationError::ParseError(
                "generation returned empty content".to_string(),
            ));
        }

        tracing::info!(
            model = %self.model,
            response_chars = content.len(),
            "Generation request successful"
        );

        Ok(content.to_string())
    }
}
