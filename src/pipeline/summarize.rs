//! Summarize stage: produce a bulleted summary via the text-generation
//! collaborator
//!
//! This stage is infallible by design: any generation failure (missing
//! credential, network error, malformed response) degrades into a
//! deterministic fallback summary carrying basic statistics, so a broken
//! summarizer is never indistinguishable from a pipeline crash. Whether a
//! degraded summary still completes the job is the orchestrator's policy
//! decision, not this stage's.

use std::sync::Arc;

use crate::services::TextGenerator;

const TRUNCATION_MARKER: &str = "\n\n[... article text truncated for summarization]";

/// Result of the summarize stage
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub text: String,
    /// True when `text` is the failure fallback rather than genuine output
    pub degraded: bool,
}

/// Summarizer over an injected text-generation collaborator
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    input_budget_chars: usize,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>, input_budget_chars: usize) -> Self {
        Self {
            generator,
            input_budget_chars,
        }
    }

    /// Summarize the chunked article text. Never fails; on any generation
    /// error the outcome is a degraded fallback summary.
    pub async fn summarize(&self, chunks: &[String], title: &str) -> SummaryOutcome {
        let prompt = self.build_prompt(chunks, title);

        match self.generator.generate(&prompt).await {
            Ok(text) => SummaryOutcome {
                text,
                degraded: false,
            },
            Err(e) => {
                tracing::warn!(
                    title = %title,
                    chunk_count = chunks.len(),
                    error = %e,
                    "Summarization degraded to fallback"
                );
                SummaryOutcome {
                    text: fallback_summary(chunks, title, &e.to_string()),
                    degraded: true,
                }
            }
        }
    }

    /// Concatenate chunks into a single prompt, bounded by the input budget.
    fn build_prompt(&self, chunks: &[String], title: &str) -> String {
        let mut body = String::new();
        let mut body_chars = 0usize;
        let mut truncated = false;

        for chunk in chunks {
            // The budget counts characters, not bytes
            let chunk_chars = chunk.chars().count();
            if body_chars + chunk_chars > self.input_budget_chars {
                let remaining = self.input_budget_chars.saturating_sub(body_chars);
                if remaining > 0 {
                    body.extend(chunk.chars().take(remaining));
                }
                truncated = true;
                break;
            }
            body.push_str(chunk);
            body.push_str("\n\n");
            body_chars += chunk_chars + 2;
        }
        if truncated {
            body.push_str(TRUNCATION_MARKER);
        }

        format!(
            "Summarize the following article titled \"{}\" as 5-7 concise bullet \
             points. Start each point with \"\u{2022} \". Cover the article's main \
             claims and conclusions only.\n\nArticle text:\n\n{}",
            title, body
        )
    }
}

/// Deterministic fallback summary stating the failure and basic statistics.
fn fallback_summary(chunks: &[String], title: &str, reason: &str) -> String {
    let total_words: usize = chunks
        .iter()
        .map(|chunk| chunk.split_whitespace().count())
        .sum();

    format!(
        "[Summary unavailable: {}]\n\n\
         Title: {}\n\
         Chunks processed: {}\n\
         Total words: {}",
        reason,
        title,
        chunks.len(),
        total_words
    )
}
