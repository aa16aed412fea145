//! Reddit item source using the OAuth client-credentials flow

use async_trait::async_trait;
use autoposter_domain::{ContentItem, ContentSource, FetchBatch, ItemSource, SourceError};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;

/// Reddit source scanning hot listings across a set of subreddits
pub struct RedditSource {
    client: Client,
    client_id: String,
    client_secret: SecretString,
    user_agent: String,
    subreddits: Vec<String>,
    limit_per_subreddit: u32,
    token_base_url: String,
    api_base_url: String,
}

impl RedditSource {
    pub fn new(
        client_id: String,
        client_secret: SecretString,
        user_agent: String,
        subreddits: Vec<String>,
        limit_per_subreddit: u32,
    ) -> Self {
        Self::with_base_urls(
            client_id,
            client_secret,
            user_agent,
            subreddits,
            limit_per_subreddit,
            "https://www.reddit.com".to_string(),
            "https://oauth.reddit.com".to_string(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_base_urls(
        client_id: String,
        client_secret: SecretString,
        user_agent: String,
        subreddits: Vec<String>,
        limit_per_subreddit: u32,
        token_base_url: String,
        api_base_url: String,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            client_id,
            client_secret,
            user_agent,
            subreddits,
            limit_per_subreddit,
            token_base_url,
            api_base_url,
        }
    }

    /// Obtain an application-only access token
    async fn get_access_token(&self) -> Result<String, SourceError> {
        let url = format!("{}/api/v1/access_token", self.token_base_url);
        let credentials = STANDARD.encode(format!(
            "{}:{}",
            self.client_id,
            self.client_secret.expose_secret()
        ));

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Basic {}", credentials))
            .header("User-Agent", &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if response.status() == 401 {
            return Err(SourceError::Auth("Invalid Reddit credentials".to_string()));
        }

        if response.status() == 429 {
            return Err(SourceError::RateLimited);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!("Failed to get token: {}", body)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Api(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Fetch the hot listing for one subreddit, keeping keyword matches
    async fn fetch_subreddit(
        &self,
        token: &str,
        subreddit: &str,
        keywords: &[String],
    ) -> Result<Vec<ContentItem>, SourceError> {
        let url = format!(
            "{}/r/{}/hot?limit={}",
            self.api_base_url, subreddit, self.limit_per_subreddit
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if response.status() == 429 {
            return Err(SourceError::RateLimited);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Api(format!(
                "Failed to fetch r/{}: {}",
                subreddit, body
            )));
        }

        let listing: Listing = response
            .json()
            .await
            .map_err(|e| SourceError::Api(e.to_string()))?;

        let items = listing
            .data
            .children
            .into_iter()
            .filter(|child| matches_keywords(&child.data.title, &child.data.selftext, keywords))
            .map(|child| {
                let post = child.data;
                let created_at = OffsetDateTime::from_unix_timestamp(post.created_utc as i64)
                    .unwrap_or_else(|_| OffsetDateTime::now_utc());
                // Link posts carry the outbound article URL; self posts fall
                // back to the permalink
                let url = if post.url.trim().is_empty() {
                    format!("https://www.reddit.com{}", post.permalink)
                } else {
                    post.url
                };
                ContentItem {
                    source: ContentSource::Reddit,
                    title: post.title,
                    url,
                    created_at,
                    score: post.score,
                }
            })
            .collect();

        Ok(items)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: Submission,
}

#[derive(Deserialize)]
struct Submission {
    title: String,
    permalink: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    created_utc: f64,
    #[serde(default)]
    selftext: String,
}

/// Keyword filter over title plus selftext, case-insensitive substring match
fn matches_keywords(title: &str, selftext: &str, keywords: &[String]) -> bool {
    let haystack = format!("{} {}", title, selftext).to_lowercase();
    keywords
        .iter()
        .any(|kw| !kw.is_empty() && haystack.contains(&kw.to_lowercase()))
}

#[async_trait]
impl ItemSource for RedditSource {
    async fn fetch(&self, keywords: &[String]) -> Result<FetchBatch, SourceError> {
        tracing::info!(subreddits = self.subreddits.len(), "Fetching from Reddit");

        let token = self.get_access_token().await?;

        let mut matched = Vec::new();
        for subreddit in &self.subreddits {
            // One bad subreddit must not sink the whole scan
            match self.fetch_subreddit(&token, subreddit, keywords).await {
                Ok(items) => matched.extend(items),
                Err(e) => {
                    tracing::warn!(subreddit = %subreddit, error = %e, "Subreddit fetch failed, skipping");
                }
            }
        }

        matched.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        tracing::info!(count = matched.len(), "Fetched matching Reddit items");

        Ok(FetchBatch {
            items: matched,
            rate_limited: false,
        })
    }

    fn name(&self) -> &'static str {
        "reddit"
    }
}
