//! Google Gemini API adapter

use async_trait::async_trait;
use autoposter_domain::{ContentItem, DraftGenerator, GenerateError, GeneratedPost};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{GenConfig, build_generation_prompt, parse_generation_response};

/// Gemini draft generator
pub struct GeminiGenerator {
    client: Client,
    api_key: SecretString,
    base_url: String,
    config: GenConfig,
}

impl GeminiGenerator {
    pub fn new(api_key: SecretString, config: GenConfig) -> Self {
        Self::with_base_url(
            api_key,
            "https://generativelanguage.googleapis.com".to_string(),
            config,
        )
    }

    pub fn with_base_url(api_key: SecretString, base_url: String, config: GenConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url,
            config,
        }
    }

    async fn call_api(&self, prompt: &str) -> Result<String, GenerateError> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: Some(GenerationConfig {
                temperature: Some(self.config.temperature),
                max_output_tokens: Some(self.config.max_output_tokens),
            }),
            system_instruction: Some(SystemInstruction {
                parts: vec![Part {
                    text: "You are a social media editor. Output only valid JSON.".to_string(),
                }],
            }),
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.config.model,
            self.api_key.expose_secret()
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerateError::Timeout
                } else {
                    GenerateError::Api(e.to_string())
                }
            })?;

        if response.status() == 429 {
            return Err(GenerateError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::InvalidFormat(e.to_string()))?;

        let text = api_response
            .candidates
            .into_iter()
            .flat_map(|c| c.content.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(GenerateError::InvalidFormat("Empty response".to_string()));
        }

        Ok(text)
    }
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "generationConfig")]
    generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "maxOutputTokens")]
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<Part>,
}

#[async_trait]
impl DraftGenerator for GeminiGenerator {
    async fn draft(&self, items: &[ContentItem]) -> Result<GeneratedPost, GenerateError> {
        let prompt = build_generation_prompt(items);
        let response_text = self.call_api(&prompt).await?;
        parse_generation_response(&response_text).map_err(GenerateError::InvalidFormat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoposter_domain::ContentSource;
    use time::OffsetDateTime;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL_PATH: &str = "/v1beta/models/gemini-1.5-flash:generateContent";

    fn sample_items() -> Vec<ContentItem> {
        vec![ContentItem {
            source: ContentSource::Reddit,
            title: "OpenAI ships a smaller model".to_string(),
            url: "https://www.reddit.com/r/technology/42".to_string(),
            created_at: OffsetDateTime::now_utc(),
            score: 77,
        }]
    }

    fn generator(server: &MockServer) -> GeminiGenerator {
        GeminiGenerator::with_base_url(
            SecretString::new("test-key".into()),
            server.uri(),
            GenConfig {
                model: "gemini-1.5-flash".to_string(),
                ..GenConfig::default()
            },
        )
    }

    fn mock_success_response() -> serde_json::Value {
        serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [
                            {
                                "text": r#"{"source":"model","title":"OpenAI ships a smaller model","url":"https://www.reddit.com/r/technology/42","linkedin":"Smaller models, bigger reach.\n\nSource: https://www.reddit.com/r/technology/42\n\n#AI","x":"Smaller model, same punch #AI https://www.reddit.com/r/technology/42"}"#
                            }
                        ]
                    }
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_draft_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(mock_success_response()))
            .mount(&mock_server)
            .await;

        let post = generator(&mock_server).draft(&sample_items()).await.unwrap();

        assert_eq!(post.source, ContentSource::Model);
        assert_eq!(post.url, "https://www.reddit.com/r/technology/42");
        assert!(post.x_text.ends_with("https://www.reddit.com/r/technology/42"));
    }

    #[tokio::test]
    async fn test_draft_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let result = generator(&mock_server).draft(&sample_items()).await;

        assert!(matches!(result, Err(GenerateError::RateLimited)));
    }

    #[tokio::test]
    async fn test_draft_malformed_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [
                    {
                        "content": {
                            "parts": [{"text": "not json at all"}]
                        }
                    }
                ]
            })))
            .mount(&mock_server)
            .await;

        let result = generator(&mock_server).draft(&sample_items()).await;

        assert!(matches!(result, Err(GenerateError::InvalidFormat(_))));
    }

    #[tokio::test]
    async fn test_draft_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MODEL_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal error"))
            .mount(&mock_server)
            .await;

        let result = generator(&mock_server).draft(&sample_items()).await;

        assert!(matches!(result, Err(GenerateError::Api(_))));
    }
}
