//! Fetch stage: download raw HTML for a URL
//!
//! Network errors and validation rejections (bad status, non-HTML
//! content-type, oversized body) all surface as "no content"; the
//! orchestrator cannot distinguish the cause beyond the logged message.

use async_trait::async_trait;
use std::time::Duration;

/// Realistic desktop browser identification; some sites reject
/// unidentified clients outright.
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0.0.0 Safari/537.36";

/// Page-fetch collaborator seam
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch raw HTML for a URL; `None` on any failure or rejection.
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// HTTP fetcher with bounded timeout, redirect following and size/type gates
pub struct HttpFetcher {
    http_client: reqwest::Client,
    max_content_length: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_content_length: usize) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            http_client,
            max_content_length,
        })
    }

    /// HTML-family content types accepted by the parser
    fn is_html_content_type(content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        matches!(essence.as_str(), "text/html" | "application/xhtml+xml")
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.http_client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Fetch failed: network error");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Fetch rejected: non-success status");
            return None;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !Self::is_html_content_type(&content_type) {
            tracing::warn!(url = %url, content_type = %content_type, "Fetch rejected: not HTML");
            return None;
        }

        // Header check first (cheap), body length check as the hard cap:
        // servers may omit or understate Content-Length.
        if let Some(declared) = response.content_length() {
            if declared as usize > self.max_content_length {
                tracing::warn!(
                    url = %url,
                    declared_bytes = declared,
                    limit = self.max_content_length,
                    "Fetch rejected: declared content length over limit"
                );
                return None;
            }
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Fetch failed: body read error");
                return None;
            }
        };

        if body.len() > self.max_content_length {
            tracing::warn!(
                url = %url,
                bytes = body.len(),
                limit = self.max_content_length,
                "Fetch rejected: body over size limit"
            );
            return None;
        }

        tracing::debug!(url = %url, bytes = body.len(), "Fetch complete");
        Some(body)
    }
}
