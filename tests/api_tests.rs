//! Router-level API tests: submission, duplicate rejection, status polling.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use pagemill::pipeline::{
    Orchestrator, PageFetcher, PipelineConfig, RenderFormat, Summarizer,
};
use pagemill::services::{GenerationError, TextGenerator};
use pagemill::worker::{spawn_workers, RetryPolicy};
use pagemill::AppState;

struct FakeFetcher(Option<String>);

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str) -> Option<String> {
        self.0.clone()
    }
}

struct BulletGenerator;

#[async_trait]
impl TextGenerator for BulletGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok("\u{2022} A point".to_string())
    }
}

/// Test app backed by an in-memory database and a single worker whose
/// fetcher returns the given page (or nothing).
async fn create_test_app(fetched_page: Option<String>) -> (axum::Router, sqlx::SqlitePool) {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .expect("in-memory database");
    pagemill::db::init_tables(&pool).await.unwrap();

    let orchestrator = Arc::new(Orchestrator::new(
        pool.clone(),
        Arc::new(FakeFetcher(fetched_page)),
        Summarizer::new(Arc::new(BulletGenerator), 10_000),
        None,
        PipelineConfig {
            chunk_size_chars: 1000,
            max_chunks: 50,
            render_format: RenderFormat::Text,
            accept_fallback_summary: true,
        },
    ));
    let jobs = spawn_workers(orchestrator, 1, RetryPolicy::default(), 16);

    let state = AppState::new(pool.clone(), jobs);
    (pagemill::build_router(state), pool)
}

fn post_article(url: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/articles")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "url": url }).to_string()))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_page() -> String {
    "<html><head><title>Hello</title></head>\
     <body><article><p>Some article words to summarize.</p></article></body></html>"
        .to_string()
}

#[tokio::test]
async fn submission_returns_202_with_pending_status() {
    let (app, _pool) = create_test_app(Some(sample_page())).await;

    let response = app
        .oneshot(post_article("https://example.com/a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = response_json(response).await;
    assert_eq!(body["url"], "https://example.com/a");
    assert_eq!(body["status"], "PENDING");
    assert!(body["id"].as_str().is_some());
    assert!(body["created_at"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_submission_conflicts_with_first_article_id() {
    let (app, _pool) = create_test_app(Some(sample_page())).await;

    let first = app
        .clone()
        .oneshot(post_article("https://example.com/a"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);
    let first_id = response_json(first).await["id"].as_str().unwrap().to_string();

    let second = app
        .oneshot(post_article("https://example.com/a"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let body = response_json(second).await;
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains(&first_id));
}

#[tokio::test]
async fn concurrent_duplicate_submissions_yield_exactly_one_conflict() {
    // Both submissions can pass the duplicate pre-check before either
    // inserts; the losing insert must still come back as 409, never 500.
    for round in 0..5 {
        let (app, _pool) = create_test_app(Some(sample_page())).await;
        let url = format!("https://example.com/race-{}", round);

        let (first, second) = tokio::join!(
            app.clone().oneshot(post_article(&url)),
            app.clone().oneshot(post_article(&url)),
        );

        let mut statuses = [first.unwrap().status(), second.unwrap().status()];
        statuses.sort();
        assert_eq!(
            statuses,
            [StatusCode::ACCEPTED, StatusCode::CONFLICT],
            "round {}",
            round
        );
    }
}

#[tokio::test]
async fn invalid_url_is_rejected_up_front() {
    let (app, _pool) = create_test_app(Some(sample_page())).await;

    let response = app
        .clone()
        .oneshot(post_article("not a url"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_article("ftp://example.com/file"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_article_status_is_404() {
    let (app, _pool) = create_test_app(Some(sample_page())).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/v1/articles/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submitted_article_eventually_completes_via_polling() {
    let (app, _pool) = create_test_app(Some(sample_page())).await;

    let response = app
        .clone()
        .oneshot(post_article("https://example.com/a"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let id = response_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Poll until the background worker finishes
    let mut last_status = String::new();
    for _ in 0..100 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/articles/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        last_status = body["status"].as_str().unwrap().to_string();
        if last_status == "COMPLETED" {
            assert_eq!(body["title"], "Hello");
            assert!(!body["summary"].as_str().unwrap().is_empty());
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("article never completed, last status: {}", last_status);
}

#[tokio::test]
async fn failed_fetch_surfaces_as_failed_status_not_5xx() {
    let (app, _pool) = create_test_app(None).await;

    let response = app
        .clone()
        .oneshot(post_article("https://example.com/unreachable"))
        .await
        .unwrap();
    let id = response_json(response).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    for _ in 0..100 {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v1/articles/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        // Job failure is data, never a server error
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        if body["status"] == "FAILED" {
            assert!(body["error_message"]
                .as_str()
                .unwrap()
                .to_lowercase()
                .contains("fetch"));
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("article never failed");
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let (app, _pool) = create_test_app(Some(sample_page())).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "pagemill");
}
