//! LinkedIn UGC post publisher

use async_trait::async_trait;
use autoposter_domain::{DraftPost, Platform, PublishError, Publisher};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::OnceCell;

const MAX_ERROR_BODY: usize = 500;

/// LinkedIn publisher using the v2 UGC posts endpoint
///
/// The author URN resolves in order: explicit configuration, the `sub` claim
/// of an OpenID Connect id_token, `/v2/me`, then `/v2/userinfo`. The result
/// is cached for the process lifetime.
pub struct LinkedInPublisher {
    client: Client,
    access_token: SecretString,
    id_token: Option<String>,
    author_urn: Option<String>,
    visibility: String,
    base_url: String,
    resolved_urn: OnceCell<String>,
    enabled: bool,
}

impl LinkedInPublisher {
    pub fn new(
        access_token: SecretString,
        id_token: Option<String>,
        author_urn: Option<String>,
        visibility: String,
    ) -> Self {
        Self::with_base_url(
            access_token,
            id_token,
            author_urn,
            visibility,
            "https://api.linkedin.com".to_string(),
            true,
        )
    }

    pub fn with_base_url(
        access_token: SecretString,
        id_token: Option<String>,
        author_urn: Option<String>,
        visibility: String,
        base_url: String,
        enabled: bool,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            access_token,
            id_token,
            author_urn,
            visibility,
            base_url,
            resolved_urn: OnceCell::new(),
            enabled,
        }
    }

    /// Create a disabled publisher (missing credentials)
    pub fn disabled() -> Self {
        Self::with_base_url(
            SecretString::new("".into()),
            None,
            None,
            "PUBLIC".to_string(),
            String::new(),
            false,
        )
    }

    async fn author_urn(&self) -> Result<&str, PublishError> {
        self.resolved_urn
            .get_or_try_init(|| self.resolve_author_urn())
            .await
            .map(String::as_str)
    }

    async fn resolve_author_urn(&self) -> Result<String, PublishError> {
        if let Some(urn) = &self.author_urn {
            return Ok(urn.clone());
        }

        if let Some(id_token) = &self.id_token {
            if let Some(sub) = decode_id_token_sub(id_token) {
                return Ok(format!("urn:li:person:{}", sub));
            }
            tracing::warn!("Could not decode id_token, falling back to profile lookup");
        }

        match self.fetch_profile_id("/v2/me").await {
            Ok(id) => return Ok(format!("urn:li:person:{}", id)),
            Err(e) => {
                tracing::warn!(error = %e, "Profile lookup via /v2/me failed, trying userinfo");
            }
        }

        let sub = self.fetch_userinfo_sub().await?;
        Ok(format!("urn:li:person:{}", sub))
    }

    async fn fetch_profile_id(&self, endpoint: &str) -> Result<String, PublishError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        if response.status() == 401 {
            return Err(PublishError::Auth("Invalid LinkedIn token".to_string()));
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(truncate_body(&format!(
                "Profile lookup failed: {}",
                body
            ))));
        }

        let profile: ProfileResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        Ok(profile.id)
    }

    async fn fetch_userinfo_sub(&self) -> Result<String, PublishError> {
        let url = format!("{}/v2/userinfo", self.base_url);

        let response = self
            .client
            .get(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        if response.status() == 401 {
            return Err(PublishError::Auth("Invalid LinkedIn token".to_string()));
        }

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(truncate_body(&format!(
                "Userinfo lookup failed: {}",
                body
            ))));
        }

        let userinfo: UserinfoResponse = response
            .json()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        Ok(userinfo.sub)
    }
}

/// Extract the `sub` claim from an unverified JWT payload
fn decode_id_token_sub(id_token: &str) -> Option<String> {
    let payload = id_token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims
        .get("sub")
        .and_then(|v| v.as_str())
        .map(String::from)
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY {
        body.chars().take(MAX_ERROR_BODY).collect()
    } else {
        body.to_string()
    }
}

#[derive(Deserialize)]
struct ProfileResponse {
    id: String,
}

#[derive(Deserialize)]
struct UserinfoResponse {
    sub: String,
}

#[async_trait]
impl Publisher for LinkedInPublisher {
    async fn publish(&self, post: &DraftPost) -> Result<(), PublishError> {
        if !self.enabled {
            return Err(PublishError::NoCredentials);
        }

        let author = self.author_urn().await?;

        let media = post.link.as_ref().map(|link| {
            json!([{
                "status": "READY",
                "originalUrl": link.url,
                "title": { "text": link.title }
            }])
        });

        let body = json!({
            "author": author,
            "lifecycleState": "PUBLISHED",
            "specificContent": {
                "com.linkedin.ugc.ShareContent": {
                    "shareCommentary": { "text": post.text },
                    "shareMediaCategory": if media.is_some() { "ARTICLE" } else { "NONE" },
                    "media": media.unwrap_or_else(|| json!([])),
                }
            },
            "visibility": {
                "com.linkedin.ugc.MemberNetworkVisibility": self.visibility
            }
        });

        let url = format!("{}/v2/ugcPosts", self.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.access_token.expose_secret()),
            )
            .header("X-Restli-Protocol-Version", "2.0.0")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| PublishError::Api(e.to_string()))?;

        if response.status() == 401 {
            return Err(PublishError::Auth("Invalid LinkedIn token".to_string()));
        }

        if response.status() == 429 {
            return Err(PublishError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Api(truncate_body(&format!(
                "LinkedIn returned {}: {}",
                status, body
            ))));
        }

        tracing::info!("Published LinkedIn post");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn platform(&self) -> Platform {
        Platform::Linkedin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoposter_domain::ArticleLink;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn draft_with_link() -> DraftPost {
        DraftPost {
            text: "Interesting article".to_string(),
            link: Some(ArticleLink {
                url: "https://example.com/article".to_string(),
                title: "The Article".to_string(),
            }),
        }
    }

    /// header.payload.signature with payload {"sub":"abc123"}
    fn fake_id_token() -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"abc123","iss":"https://www.linkedin.com"}"#);
        format!("{}.{}.sig", header, payload)
    }

    #[test]
    fn test_decode_id_token_sub() {
        assert_eq!(decode_id_token_sub(&fake_id_token()).as_deref(), Some("abc123"));
        assert_eq!(decode_id_token_sub("garbage"), None);
        assert_eq!(decode_id_token_sub("a.!!!.c"), None);
    }

    #[tokio::test]
    async fn test_publish_with_explicit_urn_and_article() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header("X-Restli-Protocol-Version", "2.0.0"))
            .and(body_partial_json(serde_json::json!({
                "author": "urn:li:person:explicit",
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": {
                        "shareCommentary": { "text": "Interesting article" },
                        "shareMediaCategory": "ARTICLE"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let publisher = LinkedInPublisher::with_base_url(
            SecretString::new("test-token".into()),
            None,
            Some("urn:li:person:explicit".to_string()),
            "PUBLIC".to_string(),
            mock_server.uri(),
            true,
        );

        publisher.publish(&draft_with_link()).await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_resolves_urn_from_id_token() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(body_partial_json(serde_json::json!({
                "author": "urn:li:person:abc123"
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let publisher = LinkedInPublisher::with_base_url(
            SecretString::new("test-token".into()),
            Some(fake_id_token()),
            None,
            "PUBLIC".to_string(),
            mock_server.uri(),
            true,
        );

        publisher.publish(&draft_with_link()).await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_falls_back_to_profile_endpoints() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v2/me"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v2/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "fromuserinfo"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(body_partial_json(serde_json::json!({
                "author": "urn:li:person:fromuserinfo"
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let publisher = LinkedInPublisher::with_base_url(
            SecretString::new("test-token".into()),
            None,
            None,
            "PUBLIC".to_string(),
            mock_server.uri(),
            true,
        );

        publisher.publish(&draft_with_link()).await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_without_link_uses_none_category() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .and(body_partial_json(serde_json::json!({
                "specificContent": {
                    "com.linkedin.ugc.ShareContent": {
                        "shareMediaCategory": "NONE"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&mock_server)
            .await;

        let publisher = LinkedInPublisher::with_base_url(
            SecretString::new("test-token".into()),
            None,
            Some("urn:li:person:explicit".to_string()),
            "PUBLIC".to_string(),
            mock_server.uri(),
            true,
        );

        publisher
            .publish(&DraftPost {
                text: "Plain text".to_string(),
                link: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_publish_auth_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let publisher = LinkedInPublisher::with_base_url(
            SecretString::new("bad-token".into()),
            None,
            Some("urn:li:person:explicit".to_string()),
            "PUBLIC".to_string(),
            mock_server.uri(),
            true,
        );

        let result = publisher.publish(&draft_with_link()).await;
        assert!(matches!(result, Err(PublishError::Auth(_))));
    }

    #[tokio::test]
    async fn test_error_body_is_truncated() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/ugcPosts"))
            .respond_with(ResponseTemplate::new(422).set_body_string("x".repeat(2000)))
            .mount(&mock_server)
            .await;

        let publisher = LinkedInPublisher::with_base_url(
            SecretString::new("test-token".into()),
            None,
            Some("urn:li:person:explicit".to_string()),
            "PUBLIC".to_string(),
            mock_server.uri(),
            true,
        );

        let result = publisher.publish(&draft_with_link()).await;
        match result {
            Err(PublishError::Api(msg)) => assert!(msg.chars().count() <= MAX_ERROR_BODY),
            other => panic!("Expected Api error, got {:?}", other.is_ok()),
        }
    }

    #[tokio::test]
    async fn test_disabled_publisher() {
        let publisher = LinkedInPublisher::disabled();
        assert!(!publisher.is_enabled());

        let result = publisher.publish(&draft_with_link()).await;
        assert!(matches!(result, Err(PublishError::NoCredentials)));
    }
}
