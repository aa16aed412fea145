//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{ContentItem, DraftPost, FetchBatch, GeneratedPost, NewPostRecord, Platform, PostRecord};

/// Error type for source fetch operations
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Port for fetching candidate items from a content source
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Fetch items matching any of the given keywords
    async fn fetch(&self, keywords: &[String]) -> Result<FetchBatch, SourceError>;

    /// Source name for logging (e.g., "reddit", "x")
    fn name(&self) -> &'static str;
}

/// Error type for the draft generator
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("LLM API error: {0}")]
    Api(String),
    #[error("Invalid response format: {0}")]
    InvalidFormat(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Timeout")]
    Timeout,
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Port for LLM-based post drafting
///
/// Given a non-empty candidate list, pick the single most valuable item and
/// draft one post text per destination platform.
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn draft(&self, items: &[ContentItem]) -> Result<GeneratedPost, GenerateError>;
}

/// Error type for publisher operations
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("no valid credentials found")]
    NoCredentials,
}

/// Port for publishing a draft to one destination platform
///
/// Publishers make a single attempt; retries happen at the pipeline level via
/// the ledger on the next invocation.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, post: &DraftPost) -> Result<(), PublishError>;

    /// Whether usable credentials are configured
    fn is_enabled(&self) -> bool;

    fn platform(&self) -> Platform;
}

/// Error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {platform}/{source_url}")]
    NotFound { platform: Platform, source_url: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for the durable post ledger
///
/// The uniqueness constraint on `(platform, source_url)` is the sole
/// de-duplication mechanism across pipeline invocations.
#[async_trait]
pub trait PostLedger: Send + Sync {
    /// True iff a record exists with a non-null `posted_at`
    async fn has_been_posted(&self, platform: Platform, source_url: &str)
    -> Result<bool, LedgerError>;

    /// True iff any record exists for the key, regardless of status
    async fn exists_record(&self, platform: Platform, source_url: &str)
    -> Result<bool, LedgerError>;

    /// Upsert keyed by `(platform, source_url)`; sets `posted_at` only on
    /// success and always refreshes `updated_at`
    async fn record_post(&self, record: NewPostRecord) -> Result<(), LedgerError>;

    /// Records with null `posted_at`, oldest insertion first
    async fn fetch_pending(
        &self,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<PostRecord>, LedgerError>;

    /// Set `posted_at`, clear `error`, refresh `updated_at`
    async fn mark_success(&self, platform: Platform, source_url: &str)
    -> Result<(), LedgerError>;

    /// Set `error`, refresh `updated_at`, leave `posted_at` null
    async fn mark_error(
        &self,
        platform: Platform,
        source_url: &str,
        error: &str,
    ) -> Result<(), LedgerError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
