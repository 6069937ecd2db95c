//! Article table operations
//!
//! UUIDs and timestamps are stored as TEXT (RFC 3339). Each job is owned by
//! exactly one worker at a time, so row updates are plain read-modify-write
//! by primary key; the UNIQUE(user_id, url) constraint backstops the
//! duplicate-submission check done at the API layer.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{Article, ArticleStatus};

/// Insert a newly submitted article. Fails on duplicate (user_id, url).
pub async fn insert_article(pool: &SqlitePool, article: &Article) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO articles (
            id, user_id, url,
            title, raw_html, parsed_text, summary, audio_path,
            status, error_message, word_count, chunk_count,
            created_at, updated_at, completed_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(article.id.to_string())
    .bind(&article.user_id)
    .bind(&article.url)
    .bind(&article.title)
    .bind(&article.raw_html)
    .bind(&article.parsed_text)
    .bind(&article.summary)
    .bind(&article.audio_path)
    .bind(article.status.as_str())
    .bind(&article.error_message)
    .bind(article.word_count)
    .bind(article.chunk_count)
    .bind(article.created_at.to_rfc3339())
    .bind(article.updated_at.to_rfc3339())
    .bind(article.completed_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist the current state of an article (full-row update by id).
///
/// The row is owned by a single worker for the duration of a pipeline run,
/// so overwriting every column from the in-memory record cannot clobber
/// concurrent writes; other jobs live in other rows.
pub async fn save_article(pool: &SqlitePool, article: &Article) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE articles SET
            title = ?,
            raw_html = ?,
            parsed_text = ?,
            summary = ?,
            audio_path = ?,
            status = ?,
            error_message = ?,
            word_count = ?,
            chunk_count = ?,
            updated_at = ?,
            completed_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.title)
    .bind(&article.raw_html)
    .bind(&article.parsed_text)
    .bind(&article.summary)
    .bind(&article.audio_path)
    .bind(article.status.as_str())
    .bind(&article.error_message)
    .bind(article.word_count)
    .bind(article.chunk_count)
    .bind(article.updated_at.to_rfc3339())
    .bind(article.completed_at.map(|t| t.to_rfc3339()))
    .bind(article.id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Article not found for update: {}", article.id);
    }

    Ok(())
}

/// True when an insert failed on the UNIQUE(user_id, url) constraint,
/// i.e. the row already exists.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(sqlx::Error::as_database_error)
        .map(|db_err| matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation))
        .unwrap_or(false)
}

/// Load an article by id
pub async fn load_article(pool: &SqlitePool, id: Uuid) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(article_from_row).transpose()
}

/// Find an article by its owner and URL (duplicate-submission check)
pub async fn find_by_owner_and_url(
    pool: &SqlitePool,
    user_id: &str,
    url: &str,
) -> Result<Option<Article>> {
    let row = sqlx::query("SELECT * FROM articles WHERE user_id = ? AND url = ?")
        .bind(user_id)
        .bind(url)
        .fetch_optional(pool)
        .await?;

    row.map(article_from_row).transpose()
}

fn article_from_row(row: sqlx::sqlite::SqliteRow) -> Result<Article> {
    let id_str: String = row.get("id");
    let status_str: String = row.get("status");

    Ok(Article {
        id: Uuid::parse_str(&id_str)?,
        user_id: row.get("user_id"),
        url: row.get("url"),
        title: row.get("title"),
        raw_html: row.get("raw_html"),
        parsed_text: row.get("parsed_text"),
        summary: row.get("summary"),
        audio_path: row.get("audio_path"),
        status: status_str
            .parse::<ArticleStatus>()
            .map_err(|e| anyhow::anyhow!(e))?,
        error_message: row.get("error_message"),
        word_count: row.get("word_count"),
        chunk_count: row.get("chunk_count"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
        completed_at: row
            .get::<Option<String>, _>("completed_at")
            .map(parse_timestamp)
            .transpose()?,
    })
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(&value)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn insert_and_load_round_trip() {
        let pool = test_pool().await;
        let article = Article::new("anonymous".to_string(), "https://example.com/a".to_string());
        insert_article(&pool, &article).await.unwrap();

        let loaded = load_article(&pool, article.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, article.id);
        assert_eq!(loaded.url, "https://example.com/a");
        assert_eq!(loaded.status, ArticleStatus::Pending);
        assert!(loaded.title.is_none());
        assert!(loaded.completed_at.is_none());
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let pool = test_pool().await;
        let loaded = load_article(&pool, Uuid::new_v4()).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn duplicate_owner_url_is_rejected_by_constraint() {
        let pool = test_pool().await;
        let first = Article::new("alice".to_string(), "https://example.com/a".to_string());
        insert_article(&pool, &first).await.unwrap();

        let duplicate = Article::new("alice".to_string(), "https://example.com/a".to_string());
        assert!(insert_article(&pool, &duplicate).await.is_err());

        // Same URL for a different owner is a distinct job
        let other_owner = Article::new("bob".to_string(), "https://example.com/a".to_string());
        insert_article(&pool, &other_owner).await.unwrap();
    }

    #[tokio::test]
    async fn unique_violation_is_distinguishable_from_other_errors() {
        let pool = test_pool().await;
        let first = Article::new("alice".to_string(), "https://example.com/a".to_string());
        insert_article(&pool, &first).await.unwrap();

        let duplicate = Article::new("alice".to_string(), "https://example.com/a".to_string());
        let err = insert_article(&pool, &duplicate).await.unwrap_err();
        assert!(is_unique_violation(&err));

        // A missing-row update failure is not a unique violation
        let ghost = Article::new("nobody".to_string(), "https://example.com/ghost".to_string());
        let err = save_article(&pool, &ghost).await.unwrap_err();
        assert!(!is_unique_violation(&err));
    }

    #[tokio::test]
    async fn save_updates_fields_and_respects_missing_rows() {
        let pool = test_pool().await;
        let mut article = Article::new("anonymous".to_string(), "https://example.com/b".to_string());
        insert_article(&pool, &article).await.unwrap();

        article.title = Some("Hello".to_string());
        article.word_count = Some(50);
        article.transition_to(ArticleStatus::Parsing);
        save_article(&pool, &article).await.unwrap();

        let loaded = load_article(&pool, article.id).await.unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Hello"));
        assert_eq!(loaded.word_count, Some(50));
        assert_eq!(loaded.status, ArticleStatus::Parsing);

        let ghost = Article::new("nobody".to_string(), "https://example.com/ghost".to_string());
        assert!(save_article(&pool, &ghost).await.is_err());
    }
}
