//! Prompt construction: deterministic rendering plus optional enrichment.

pub mod builder;
pub mod enricher;

pub use builder::{EMPTY_SCENE_PLACEHOLDER, build_prompt};
pub use enricher::PromptEnricher;
