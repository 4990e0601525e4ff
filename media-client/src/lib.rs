//! Shared media client library for the gen-storyboard workspace
//!
//! Provides a unified interface for hosted generation providers:
//! - Vertex/Imagen (image generation)
//! - OpenRouter (text generation, multi-model access)
//! - Cerebras (text generation, fast Llama inference)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{Config, ModelPreset, ProviderConfig};
pub use error::{MediaError, Result};
pub use provider::{
    DimensionFormat, ImageDimensions, ImageProvider, ImageRequest, ImageResponse, TextProvider,
    TextRequest, TextResponse, TokenUsage,
};
pub use providers::{
    MockImageProvider, MockTextProvider, ProviderKind, get_image_provider, get_text_provider,
};
