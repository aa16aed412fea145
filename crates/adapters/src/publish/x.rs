//! X v2 write API publisher

use async_trait::async_trait;
use autoposter_domain::{DraftPost, Platform, PublishError, Publisher};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::oauth1::{OAuth1Credentials, authorization_header};

/// User-context credentials for posting, in preference order
pub enum XWriteCredentials {
    /// Full OAuth 1.0a credential set (consumer + access token pairs)
    OAuth1(OAuth1Credentials),
    /// OAuth 2.0 user access token (from the PKCE flow)
    OAuth2Bearer(SecretString),
}

/// X publisher creating standalone posts
pub struct XPublisher {
    client: Client,
    credentials: Option<XWriteCredentials>,
    base_url: String,
}

impl XPublisher {
    pub fn new(credentials: Option<XWriteCredentials>) -> Self {
        Self::with_base_url(credentials, "https://api.twitter.com".to_string())
    }

    pub fn with_base_url(credentials: Option<XWriteCredentials>, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            credentials,
            base_url,
        }
    }

    /// Create a disabled publisher (missing credentials)
    pub fn disabled() -> Self {
        Self::with_base_url(None, String::new())
    }
}

#[derive(Serialize)]
struct CreateTweetRequest {
    text: String,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    data: TweetData,
}

#[derive(Deserialize)]
struct TweetData {
    id: String,
}

#[async_trait]
impl Publisher for XPublisher {
    async fn publish(&self, post: &DraftPost) -> Result<(), PublishError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(PublishError::NoCredentials)?;

        let url = format!("{}/2/tweets", self.base_url);
        let request = CreateTweetRequest {
            text: post.text.clone(),
        };

        let authorization = match credentials {
            XWriteCredentials::OAuth1(creds) => authorization_header(creds, "POST", &url, &[]),
            XWriteCredentials::OAuth2Bearer(token) => {
                format!("Bearer {}", token.expose_secret())
            }
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", authorization)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        if response.status() == 401 || response.status() == 403 {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Auth(format!(
                "X returned {}: {}",
                status, body
            )));
        }

        if response.status() == 429 {
            return Err(PublishError::RateLimited);
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(format!(
                "Failed to create post: {}",
                body
            )));
        }

        let tweet: CreateTweetResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        tracing::info!(id = %tweet.data.id, "Published X post");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    fn platform(&self) -> Platform {
        Platform::X
    }
}
