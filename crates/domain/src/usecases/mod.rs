//! Application use cases

pub mod generate;
pub mod pipeline;

pub use generate::{GenerateUseCase, fallback_post};
pub use pipeline::{Pipeline, PipelineConfig};
