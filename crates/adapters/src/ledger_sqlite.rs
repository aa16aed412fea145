//! SQLite post ledger implementation

use async_trait::async_trait;
use autoposter_domain::{
    ContentSource, LedgerError, NewPostRecord, Platform, PostLedger, PostRecord,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use time::OffsetDateTime;

/// SQLite-backed post ledger
///
/// One row per `(platform, source_url)`; that primary key is the dedupe
/// boundary across pipeline invocations.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open (creating if needed) the ledger database at the given path
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| LedgerError::Database(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;

        Ok(ledger)
    }

    /// Create an in-memory ledger (for testing)
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| LedgerError::Database(e.to_string()))?;

        let ledger = Self { pool };
        ledger.run_migrations().await?;

        Ok(ledger)
    }

    async fn run_migrations(&self) -> Result<(), LedgerError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                platform TEXT NOT NULL,
                source TEXT NOT NULL,
                source_url TEXT NOT NULL,
                title TEXT,
                linkedin_text TEXT,
                x_text TEXT,
                posted_at TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (platform, source_url)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_posts_pending
            ON posts(platform, posted_at)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }
}

type PostRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn format_ts(ts: OffsetDateTime) -> Result<String, LedgerError> {
    ts.format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn parse_ts(s: &str) -> Result<OffsetDateTime, LedgerError> {
    OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
        .map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn row_to_record(row: PostRow) -> Result<PostRecord, LedgerError> {
    let (
        platform,
        source,
        source_url,
        title,
        linkedin_text,
        x_text,
        posted_at,
        error,
        created_at,
        updated_at,
    ) = row;

    Ok(PostRecord {
        platform: Platform::from_str(&platform).map_err(LedgerError::Serialization)?,
        source: ContentSource::from_str(&source).map_err(LedgerError::Serialization)?,
        source_url,
        title,
        linkedin_text,
        x_text,
        posted_at: posted_at.as_deref().map(parse_ts).transpose()?,
        error,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

#[async_trait]
impl PostLedger for SqliteLedger {
    async fn has_been_posted(
        &self,
        platform: Platform,
        source_url: &str,
    ) -> Result<bool, LedgerError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM posts WHERE platform = ? AND source_url = ? AND posted_at IS NOT NULL",
        )
        .bind(platform.as_str())
        .bind(source_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(count.0 > 0)
    }

    async fn exists_record(
        &self,
        platform: Platform,
        source_url: &str,
    ) -> Result<bool, LedgerError> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM posts WHERE platform = ? AND source_url = ?")
                .bind(platform.as_str())
                .bind(source_url)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(count.0 > 0)
    }

    async fn record_post(&self, record: NewPostRecord) -> Result<(), LedgerError> {
        let now = format_ts(OffsetDateTime::now_utc())?;
        let posted_at = record.success.then(|| now.clone());

        sqlx::query(
            r#"
            INSERT INTO posts
            (platform, source, source_url, title, linkedin_text, x_text, posted_at, error, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(platform, source_url) DO UPDATE SET
                source = excluded.source,
                title = COALESCE(excluded.title, posts.title),
                linkedin_text = COALESCE(excluded.linkedin_text, posts.linkedin_text),
                x_text = COALESCE(excluded.x_text, posts.x_text),
                posted_at = COALESCE(excluded.posted_at, posts.posted_at),
                error = excluded.error,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.platform.as_str())
        .bind(record.source.as_str())
        .bind(&record.source_url)
        .bind(&record.title)
        .bind(&record.linkedin_text)
        .bind(&record.x_text)
        .bind(&posted_at)
        .bind(&record.error)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        Ok(())
    }

    async fn fetch_pending(
        &self,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<PostRecord>, LedgerError> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT platform, source, source_url, title, linkedin_text, x_text,
                   posted_at, error, created_at, updated_at
            FROM posts
            WHERE platform = ? AND posted_at IS NULL
            ORDER BY rowid ASC
            LIMIT ?
            "#,
        )
        .bind(platform.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn mark_success(&self, platform: Platform, source_url: &str) -> Result<(), LedgerError> {
        let now = format_ts(OffsetDateTime::now_utc())?;

        let result = sqlx::query(
            r#"
            UPDATE posts
            SET posted_at = ?, error = NULL, updated_at = ?
            WHERE platform = ? AND source_url = ?
            "#,
        )
        .bind(&now)
        .bind(&now)
        .bind(platform.as_str())
        .bind(source_url)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound {
                platform,
                source_url: source_url.to_string(),
            });
        }

        Ok(())
    }

    async fn mark_error(
        &self,
        platform: Platform,
        source_url: &str,
        error: &str,
    ) -> Result<(), LedgerError> {
        let now = format_ts(OffsetDateTime::now_utc())?;

        let result = sqlx::query(
            r#"
            UPDATE posts
            SET error = ?, updated_at = ?
            WHERE platform = ? AND source_url = ?
            "#,
        )
        .bind(error)
        .bind(&now)
        .bind(platform.as_str())
        .bind(source_url)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound {
                platform,
                source_url: source_url.to_string(),
            });
        }

        Ok(())
    }
}
