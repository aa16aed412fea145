//! Stub draft generator for testing and offline mode

use async_trait::async_trait;
use autoposter_domain::{ContentItem, ContentSource, DraftGenerator, GenerateError, GeneratedPost};

/// Stub generator drafting a trivial post from the first item
pub struct StubGenerator {
    fail_with: Option<String>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self { fail_with: None }
    }

    /// A stub that always fails, for exercising the fallback path
    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            fail_with: Some(error.into()),
        }
    }
}

impl Default for StubGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftGenerator for StubGenerator {
    async fn draft(&self, items: &[ContentItem]) -> Result<GeneratedPost, GenerateError> {
        if let Some(error) = &self.fail_with {
            return Err(GenerateError::Api(error.clone()));
        }

        let first = items
            .first()
            .ok_or_else(|| GenerateError::InvalidFormat("No items provided".to_string()))?;

        Ok(GeneratedPost {
            source: ContentSource::Model,
            title: first.title.clone(),
            url: first.url.clone(),
            linkedin_text: format!("{}\n\nSource: {}\n\n#Tech", first.title, first.url),
            x_text: format!("{} {}", first.title, first.url),
        })
    }
}
