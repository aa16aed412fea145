//! autoposter domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `query`: X search query fitting
//! - `usecases`: Application use cases / business logic

pub mod model;
pub mod ports;
pub mod query;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use usecases::{GenerateUseCase, Pipeline, PipelineConfig, fallback_post};

/// Keep at most `max_items` items, dropping later duplicates by URL and
/// preserving input order (items are expected to be pre-sorted by
/// score/recency).
pub fn pick_top_items(items: &[ContentItem], max_items: usize) -> Vec<ContentItem> {
    let mut seen = std::collections::HashSet::new();
    let mut picked = Vec::new();
    for item in items {
        if item.url.is_empty() || !seen.insert(item.url.clone()) {
            continue;
        }
        picked.push(item.clone());
        if picked.len() >= max_items {
            break;
        }
    }
    picked
}

/// Fit `text` plus a trailing URL into `max_len` characters, reserving one
/// space before the URL and ellipsizing the core text when needed.
pub fn truncate_for_x(text: &str, url: &str, max_len: usize) -> String {
    let reserve = url.chars().count() + 1;
    let core_max = max_len.saturating_sub(reserve);
    let core = text.trim();
    let core: String = if core.chars().count() > core_max {
        let keep = core_max.saturating_sub(3);
        let truncated: String = core.chars().take(keep).collect();
        format!("{}...", truncated)
    } else {
        core.to_string()
    };
    format!("{} {}", core, url).trim().to_string()
}
