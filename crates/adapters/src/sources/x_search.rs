//! X recent-search item source

use async_trait::async_trait;
use autoposter_domain::query::{
    MIN_KEYWORDS, build_search_query, dedupe_preserve_order, fallback_keywords,
    trim_keywords_for_limit,
};
use autoposter_domain::{ContentItem, ContentSource, FetchBatch, ItemSource, SourceError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;

/// Most recent tweets kept per fetch
const MAX_ITEMS: usize = 3;

/// X search source using app-only bearer authentication
///
/// Query attempts degrade in order: the fitted keyword list, the first half
/// of it, then the fallback keyword set. A 429 on any attempt ends the fetch
/// with a rate-limited batch so the pipeline can fall back to Reddit.
pub struct XSearchSource {
    client: Client,
    bearer_token: SecretString,
    max_results: u32,
    base_url: String,
}

impl XSearchSource {
    pub fn new(bearer_token: SecretString, max_results: u32) -> Self {
        Self::with_base_url(bearer_token, max_results, "https://api.twitter.com".to_string())
    }

    pub fn with_base_url(bearer_token: SecretString, max_results: u32, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            bearer_token,
            max_results,
            base_url,
        }
    }

    /// The degrading sequence of keyword lists to try
    fn query_attempts(&self, keywords: &[String]) -> Vec<Vec<String>> {
        let deduped = dedupe_preserve_order(keywords);
        let trimmed = trim_keywords_for_limit(&deduped);

        let mut attempts = Vec::new();
        if !trimmed.is_empty() {
            attempts.push(trimmed.clone());
            // Halve the list for the second attempt, never below the floor
            let half = (trimmed.len() / 2).max(MIN_KEYWORDS);
            if half < trimmed.len() {
                attempts.push(trimmed[..half].to_vec());
            }
        }
        attempts.push(fallback_keywords());
        attempts
    }

    /// One search request; `Ok(None)` means try the next attempt
    async fn search(&self, keywords: &[String]) -> Result<Option<SearchOutcome>, SourceError> {
        let query = build_search_query(keywords);
        let url = format!("{}/2/tweets/search/recent", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query.as_str()),
                ("max_results", &self.max_results.to_string()),
                ("tweet.fields", "created_at,public_metrics"),
            ])
            .header(
                "Authorization",
                format!("Bearer {}", self.bearer_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();

        if status == 429 {
            tracing::warn!("X search rate limited");
            return Ok(Some(SearchOutcome::RateLimited));
        }

        if status == 401 || status == 403 {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Auth(format!(
                "X search returned {}: {}",
                status, body
            )));
        }

        if status == 400 {
            // Query rejected, a shorter attempt may still work
            tracing::debug!(query = %query, "X rejected query, trying next attempt");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "X search failed, trying next attempt");
            return Ok(None);
        }

        let search_response: SearchResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Api(e.to_string()))?;

        let items = search_response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|tweet| {
                let created_at = tweet
                    .created_at
                    .as_ref()
                    .and_then(|s| {
                        OffsetDateTime::parse(s, &time::format_description::well_known::Rfc3339)
                            .ok()
                    })
                    .unwrap_or_else(OffsetDateTime::now_utc);
                let metrics = tweet.public_metrics.unwrap_or_default();

                ContentItem {
                    source: ContentSource::X,
                    title: tweet.text,
                    url: format!("https://twitter.com/i/web/status/{}", tweet.id),
                    created_at,
                    score: metrics.like_count + metrics.retweet_count,
                }
            })
            .collect::<Vec<_>>();

        Ok(Some(SearchOutcome::Items(items)))
    }
}

enum SearchOutcome {
    Items(Vec<ContentItem>),
    RateLimited,
}

#[derive(Deserialize)]
struct SearchResponse {
    data: Option<Vec<Tweet>>,
}

#[derive(Deserialize)]
struct Tweet {
    id: String,
    text: String,
    created_at: Option<String>,
    public_metrics: Option<PublicMetrics>,
}

#[derive(Deserialize, Default)]
struct PublicMetrics {
    #[serde(default)]
    like_count: i64,
    #[serde(default)]
    retweet_count: i64,
}

#[async_trait]
impl ItemSource for XSearchSource {
    async fn fetch(&self, keywords: &[String]) -> Result<FetchBatch, SourceError> {
        for attempt in self.query_attempts(keywords) {
            match self.search(&attempt).await? {
                Some(SearchOutcome::RateLimited) => return Ok(FetchBatch::rate_limited()),
                Some(SearchOutcome::Items(mut items)) => {
                    if items.is_empty() {
                        continue;
                    }
                    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                    items.truncate(MAX_ITEMS);
                    tracing::info!(count = items.len(), "Fetched X search results");
                    return Ok(FetchBatch {
                        items,
                        rate_limited: false,
                    });
                }
                None => continue,
            }
        }

        tracing::info!("All X search attempts exhausted without results");
        Ok(FetchBatch::default())
    }

    fn name(&self) -> &'static str {
        "x"
    }
}
