//! Article pipeline state machine
//!
//! An article progresses through the pipeline states in order:
//! PENDING → FETCHING → PARSING → CHUNKING → SUMMARIZING → RENDERING → COMPLETED,
//! with a single absorbing FAILED state reachable from any non-terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Pipeline processing status for an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ArticleStatus {
    /// Submitted, waiting for a worker
    Pending,
    /// Downloading raw HTML
    Fetching,
    /// Extracting title and clean text
    Parsing,
    /// Splitting text into bounded segments
    Chunking,
    /// Generating summary via text-generation service
    Summarizing,
    /// Producing the output representation (and optional audio)
    Rendering,
    /// Pipeline finished successfully
    Completed,
    /// Pipeline stopped with a recorded error
    Failed,
}

impl ArticleStatus {
    /// No further transitions occur from a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ArticleStatus::Completed | ArticleStatus::Failed)
    }

    /// Position in the forward pipeline order. FAILED sorts last so that
    /// any jump to it counts as forward movement.
    pub fn rank(&self) -> u8 {
        match self {
            ArticleStatus::Pending => 0,
            ArticleStatus::Fetching => 1,
            ArticleStatus::Parsing => 2,
            ArticleStatus::Chunking => 3,
            ArticleStatus::Summarizing => 4,
            ArticleStatus::Rendering => 5,
            ArticleStatus::Completed => 6,
            ArticleStatus::Failed => 7,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Pending => "PENDING",
            ArticleStatus::Fetching => "FETCHING",
            ArticleStatus::Parsing => "PARSING",
            ArticleStatus::Chunking => "CHUNKING",
            ArticleStatus::Summarizing => "SUMMARIZING",
            ArticleStatus::Rendering => "RENDERING",
            ArticleStatus::Completed => "COMPLETED",
            ArticleStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ArticleStatus::Pending),
            "FETCHING" => Ok(ArticleStatus::Fetching),
            "PARSING" => Ok(ArticleStatus::Parsing),
            "CHUNKING" => Ok(ArticleStatus::Chunking),
            "SUMMARIZING" => Ok(ArticleStatus::Summarizing),
            "RENDERING" => Ok(ArticleStatus::Rendering),
            "COMPLETED" => Ok(ArticleStatus::Completed),
            "FAILED" => Ok(ArticleStatus::Failed),
            other => Err(format!("unknown article status: {}", other)),
        }
    }
}

/// Record of a single status transition, for logging and tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    pub article_id: Uuid,
    pub old_status: ArticleStatus,
    pub new_status: ArticleStatus,
    pub transitioned_at: DateTime<Utc>,
}

/// Persisted article record, the unit of work for the pipeline.
///
/// Mutated exclusively by the orchestrator once created; content fields are
/// populated monotonically (a later stage never unsets an earlier stage's
/// output, even when the later stage fails).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub user_id: String,
    pub url: String,

    // Content, one field group per stage
    pub title: Option<String>,
    pub raw_html: Option<String>,
    pub parsed_text: Option<String>,
    pub summary: Option<String>,
    pub audio_path: Option<String>,

    // Pipeline tracking
    pub status: ArticleStatus,
    pub error_message: Option<String>,

    pub word_count: Option<i64>,
    pub chunk_count: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Create a new article in PENDING, ready for submission.
    pub fn new(user_id: String, url: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            url,
            title: None,
            raw_html: None,
            parsed_text: None,
            summary: None,
            audio_path: None,
            status: ArticleStatus::Pending,
            error_message: None,
            word_count: None,
            chunk_count: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Transition to a new status, returning the transition record.
    ///
    /// The status only moves forward through the pipeline or jumps to
    /// FAILED; callers uphold that ordering, this records it.
    pub fn transition_to(&mut self, new_status: ArticleStatus) -> StatusTransition {
        let transition = StatusTransition {
            article_id: self.id,
            old_status: self.status,
            new_status,
            transitioned_at: Utc::now(),
        };
        self.status = new_status;
        self.updated_at = transition.transitioned_at;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(ArticleStatus::Completed.is_terminal());
        assert!(ArticleStatus::Failed.is_terminal());
        assert!(!ArticleStatus::Pending.is_terminal());
        assert!(!ArticleStatus::Rendering.is_terminal());
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in [
            ArticleStatus::Pending,
            ArticleStatus::Fetching,
            ArticleStatus::Parsing,
            ArticleStatus::Chunking,
            ArticleStatus::Summarizing,
            ArticleStatus::Rendering,
            ArticleStatus::Completed,
            ArticleStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ArticleStatus>(), Ok(status));
        }
        assert!("BOGUS".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn pipeline_order_is_strictly_increasing() {
        let order = [
            ArticleStatus::Pending,
            ArticleStatus::Fetching,
            ArticleStatus::Parsing,
            ArticleStatus::Chunking,
            ArticleStatus::Summarizing,
            ArticleStatus::Rendering,
            ArticleStatus::Completed,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
        // FAILED counts as forward movement from every non-terminal state
        for status in &order[..order.len() - 1] {
            assert!(status.rank() < ArticleStatus::Failed.rank());
        }
    }

    #[test]
    fn transition_records_old_and_new_status() {
        let mut article = Article::new("anonymous".to_string(), "https://example.com/a".to_string());
        assert_eq!(article.status, ArticleStatus::Pending);

        let transition = article.transition_to(ArticleStatus::Fetching);
        assert_eq!(transition.old_status, ArticleStatus::Pending);
        assert_eq!(transition.new_status, ArticleStatus::Fetching);
        assert_eq!(article.status, ArticleStatus::Fetching);
        assert_eq!(transition.article_id, article.id);
    }

    #[test]
    fn status_serializes_uppercase() {
        let json = serde_json::to_string(&ArticleStatus::Summarizing).unwrap();
        assert_eq!(json, "\"SUMMARIZING\"");
    }
}
