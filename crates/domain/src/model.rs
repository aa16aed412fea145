//! Domain models and value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Where a content item was fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Reddit,
    X,
    /// Built-in sample items used by the test harness
    Sample,
    /// Sentinel for model-authored drafts
    Model,
}

impl ContentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSource::Reddit => "reddit",
            ContentSource::X => "x",
            ContentSource::Sample => "sample",
            ContentSource::Model => "model",
        }
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reddit" => Ok(ContentSource::Reddit),
            "x" => Ok(ContentSource::X),
            "sample" => Ok(ContentSource::Sample),
            "model" => Ok(ContentSource::Model),
            other => Err(format!("Unknown content source: {}", other)),
        }
    }
}

/// A candidate item fetched from a source platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Platform the item came from
    pub source: ContentSource,
    /// Title (Reddit submission title or tweet text)
    pub title: String,
    /// URL to the original content
    pub url: String,
    /// When the item was created on the source platform
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Engagement score (Reddit score, or likes + retweets on X)
    pub score: i64,
}

/// Result of one source fetch
#[derive(Debug, Clone, Default)]
pub struct FetchBatch {
    /// Items that matched the keyword filter
    pub items: Vec<ContentItem>,
    /// Whether the provider signalled rate limiting
    pub rate_limited: bool,
}

impl FetchBatch {
    pub fn rate_limited() -> Self {
        Self {
            items: vec![],
            rate_limited: true,
        }
    }
}

/// The single post drafted per pipeline run, with one text per platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub source: ContentSource,
    pub title: String,
    pub url: String,
    pub linkedin_text: String,
    pub x_text: String,
}

/// Destination platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linkedin,
    X,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Linkedin, Platform::X];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linkedin => "linkedin",
            Platform::X => "x",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linkedin" => Ok(Platform::Linkedin),
            "x" => Ok(Platform::X),
            other => Err(format!("Unknown platform: {}", other)),
        }
    }
}

/// Optional article attachment carried alongside a LinkedIn draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    pub url: String,
    pub title: String,
}

/// What a publisher actually receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftPost {
    pub text: String,
    /// Article link attachment, if the platform supports one
    pub link: Option<ArticleLink>,
}

/// Ledger row tracking one publish target per `(platform, source_url)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub platform: Platform,
    pub source: ContentSource,
    pub source_url: String,
    pub title: Option<String>,
    pub linkedin_text: Option<String>,
    pub x_text: Option<String>,
    /// Set iff the most recent publish attempt for this key succeeded
    #[serde(with = "time::serde::rfc3339::option")]
    pub posted_at: Option<OffsetDateTime>,
    pub error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PostRecord {
    /// A record with no successful publish yet is eligible for retry
    pub fn is_pending(&self) -> bool {
        self.posted_at.is_none()
    }

    /// The stored draft text for this record's platform
    pub fn platform_text(&self) -> Option<&str> {
        match self.platform {
            Platform::Linkedin => self.linkedin_text.as_deref(),
            Platform::X => self.x_text.as_deref(),
        }
    }
}

/// Upsert payload for the ledger; the store stamps the timestamps
#[derive(Debug, Clone)]
pub struct NewPostRecord {
    pub platform: Platform,
    pub source: ContentSource,
    pub source_url: String,
    pub title: Option<String>,
    pub linkedin_text: Option<String>,
    pub x_text: Option<String>,
    pub success: bool,
    pub error: Option<String>,
}

/// Outcome for one platform in the publish stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Publisher invoked and succeeded
    Published,
    /// Publisher invoked and failed; error recorded in the ledger
    Failed { error: String },
    /// Already successfully posted in a previous run; publisher not invoked
    AlreadyPosted,
    /// Credentials absent; queued as a pending ledger entry
    QueuedPending,
    /// Dry run; nothing touched
    DryRun,
}

/// Summary of one pipeline invocation
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Per-platform retry sweep counts: (platform, attempted, succeeded)
    pub retried: Vec<(Platform, usize, usize)>,
    /// Items accumulated in the fetch stage
    pub fetched: usize,
    /// Whether the generator produced a post (fallback included)
    pub generated: bool,
    /// Per-platform publish outcome for the generated post
    pub published: Vec<(Platform, PublishOutcome)>,
}
