//! Draft generator adapters

pub mod gemini;
pub mod openai;
pub mod stub;

pub use gemini::GeminiGenerator;
pub use openai::OpenAiGenerator;
pub use stub::StubGenerator;

use autoposter_domain::{ContentItem, ContentSource, GeneratedPost};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Common LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenConfig {
    /// Model name/ID
    pub model: String,
    /// Temperature (0.0-1.0)
    pub temperature: f64,
    /// Maximum output tokens
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.4,
            max_output_tokens: 700,
            timeout_secs: 45,
        }
    }
}

/// Build the drafting prompt over the candidate items
pub fn build_generation_prompt(items: &[ContentItem]) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a social media editor for a tech audience. From the candidate items below, \
         pick the single most interesting one and draft posts about it.\n\n",
    );

    prompt.push_str("## Candidate Items\n");
    for (i, item) in items.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. [{}] {}\n   URL: {}\n   Score: {}\n",
            i + 1,
            item.source,
            item.title,
            item.url,
            item.score
        ));
    }
    prompt.push('\n');

    prompt.push_str(
        r#"## Output Format
Respond with ONLY a JSON object matching this exact schema:
{
  "source": "always the string \"model\"",
  "title": "the chosen item's title",
  "url": "the chosen item's URL, copied exactly",
  "linkedin": "LinkedIn post: 4-7 sentences, professional tone, then a line 'Source: <url>', then 4-7 hashtags",
  "x": "X post: under 280 characters including the URL, trailing hashtags, ending with the URL"
}

Rules:
- Pick exactly one item
- Copy the URL verbatim, never invent one
- All five fields are required strings
- Output JSON only, no commentary
"#,
    );

    prompt
}

#[derive(Deserialize)]
struct GenerationResponse {
    source: String,
    title: String,
    url: String,
    linkedin: String,
    x: String,
}

/// Parse and validate the drafting response JSON
pub fn parse_generation_response(response: &str) -> Result<GeneratedPost, String> {
    let json_str = extract_json(response);

    let parsed: GenerationResponse =
        serde_json::from_str(json_str).map_err(|e| format!("Failed to parse JSON: {}", e))?;

    for (field, value) in [
        ("title", &parsed.title),
        ("url", &parsed.url),
        ("linkedin", &parsed.linkedin),
        ("x", &parsed.x),
    ] {
        if value.trim().is_empty() {
            return Err(format!("Field '{}' is empty", field));
        }
    }

    // Unknown source strings collapse to the model sentinel
    let source = ContentSource::from_str(parsed.source.trim()).unwrap_or(ContentSource::Model);

    Ok(GeneratedPost {
        source,
        title: parsed.title.trim().to_string(),
        url: parsed.url.trim().to_string(),
        linkedin_text: parsed.linkedin.trim().to_string(),
        x_text: parsed.x.trim().to_string(),
    })
}

/// Extract JSON from response (handles markdown code blocks)
fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(start) = trimmed.find("```json") {
        if let Some(end) = trimmed[start + 7..].find("```") {
            return trimmed[start + 7..start + 7 + end].trim();
        }
    }

    if let Some(start) = trimmed.find("```") {
        if let Some(end) = trimmed[start + 3..].find("```") {
            let content = trimmed[start + 3..start + 3 + end].trim();
            if let Some(newline) = content.find('\n') {
                let first_line = &content[..newline];
                if !first_line.starts_with('{') {
                    return content[newline + 1..].trim();
                }
            }
            return content;
        }
    }

    trimmed
}
