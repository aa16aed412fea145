//! Draft generation use case
//!
//! Wraps the `DraftGenerator` port with the deterministic fallback: any
//! provider failure or schema violation degrades to a templated post built
//! from the first candidate item, so generation never blocks the pipeline.

use crate::{
    model::{ContentItem, GeneratedPost},
    ports::{DraftGenerator, GenerateError},
};

const FALLBACK_X_CORE_MAX: usize = 220;

/// Use case for drafting the single post of a pipeline run
pub struct GenerateUseCase<G> {
    generator: G,
}

impl<G: DraftGenerator> GenerateUseCase<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Draft a post from the candidate items. Returns `None` only for an
    /// empty item list; every generator failure falls back to the template.
    pub async fn generate(&self, items: &[ContentItem]) -> Option<GeneratedPost> {
        if items.is_empty() {
            return None;
        }

        match self.generator.draft(items).await {
            Ok(post) => {
                tracing::info!(title = %post.title, url = %post.url, "Model drafted post");
                Some(post)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed, using fallback template");
                Some(fallback_post(&items[0]))
            }
        }
    }
}

/// Deterministic fallback: synthesize both post texts from one item
pub fn fallback_post(item: &ContentItem) -> GeneratedPost {
    let title = item.title.trim();
    let url = item.url.trim();

    let linkedin_text = format!(
        "{}\n\nWhy it matters: Practical impact for engineers and teams.\nSource: {}\n\n#AI #Tech #Software #DevOps #Cloud",
        title, url
    );

    let mut x_core = format!("{} — why it matters for builders.", title);
    if x_core.chars().count() > FALLBACK_X_CORE_MAX {
        x_core = x_core.chars().take(FALLBACK_X_CORE_MAX - 3).collect();
        x_core.push_str("...");
    }
    let x_text = format!("{} #AI #Tech {}", x_core, url);

    GeneratedPost {
        source: item.source,
        title: title.to_string(),
        url: url.to_string(),
        linkedin_text,
        x_text,
    }
}
