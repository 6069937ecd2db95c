//! Article submission and status API
//!
//! POST /api/v1/articles accepts a URL, creates the PENDING record and
//! enqueues it for background processing (202). GET /api/v1/articles/:id is
//! the polling surface: job-level failures are reported as data (status
//! FAILED plus error_message), never as a 5xx.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Article, ArticleStatus};
use crate::AppState;

fn default_user_id() -> String {
    // Placeholder owner until authentication lands upstream
    "anonymous".to_string()
}

/// POST /api/v1/articles request
#[derive(Debug, Deserialize)]
pub struct SubmitArticleRequest {
    pub url: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

/// Article representation returned by both endpoints
#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub id: Uuid,
    pub url: String,
    pub status: ArticleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl ArticleResponse {
    fn from_article(article: &Article) -> Self {
        Self {
            id: article.id,
            url: article.url.clone(),
            status: article.status,
            title: article.title.clone(),
            summary: article.summary.clone(),
            error_message: article.error_message.clone(),
            created_at: article.created_at,
        }
    }
}

/// POST /api/v1/articles
///
/// Submit a URL for processing. Returns 202 Accepted immediately; the
/// pipeline runs in the background and the client polls the status endpoint.
pub async fn submit_article(
    State(state): State<AppState>,
    Json(request): Json<SubmitArticleRequest>,
) -> ApiResult<(StatusCode, Json<ArticleResponse>)> {
    let url = validate_url(&request.url)?;

    // Exactly one job per (owner, URL): duplicates are rejected, not merged.
    if let Some(existing) =
        crate::db::articles::find_by_owner_and_url(&state.db, &request.user_id, &url)
            .await
            .map_err(ApiError::Other)?
    {
        return Err(ApiError::Conflict(format!(
            "Article already exists with ID: {}",
            existing.id
        )));
    }

    let article = Article::new(request.user_id, url);
    if let Err(err) = crate::db::articles::insert_article(&state.db, &article).await {
        // Lost an insert race: the UNIQUE(user_id, url) constraint fired
        // between the duplicate check and the insert. Report the winner's
        // ID, same as the pre-check above.
        if crate::db::articles::is_unique_violation(&err) {
            if let Some(existing) = crate::db::articles::find_by_owner_and_url(
                &state.db,
                &article.user_id,
                &article.url,
            )
            .await
            .map_err(ApiError::Other)?
            {
                return Err(ApiError::Conflict(format!(
                    "Article already exists with ID: {}",
                    existing.id
                )));
            }
        }
        return Err(ApiError::Other(err));
    }

    tracing::info!(
        article_id = %article.id,
        url = %article.url,
        "Article submitted, enqueueing for processing"
    );

    state.jobs.enqueue(article.id).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ArticleResponse::from_article(&article)),
    ))
}

/// GET /api/v1/articles/:id
pub async fn get_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> ApiResult<Json<ArticleResponse>> {
    let article = crate::db::articles::load_article(&state.db, article_id)
        .await
        .map_err(ApiError::Other)?
        .ok_or_else(|| ApiError::NotFound(format!("Article not found: {}", article_id)))?;

    Ok(Json(ArticleResponse::from_article(&article)))
}

/// Validate and normalize a submitted URL (http/https only).
fn validate_url(raw: &str) -> ApiResult<String> {
    let parsed = reqwest::Url::parse(raw)
        .map_err(|e| ApiError::BadRequest(format!("Invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        other => Err(ApiError::BadRequest(format!(
            "Unsupported URL scheme: {}",
            other
        ))),
    }
}

/// Build article routes
pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/articles", post(submit_article))
        .route("/api/v1/articles/:id", get(get_article))
}
