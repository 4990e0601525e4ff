//! Provider implementations

pub mod mock;
mod openai_compatible;
mod vertex;

pub use mock::{MockImageProvider, MockTextProvider};
pub use openai_compatible::OpenAICompatibleProvider;
pub use vertex::VertexImageProvider;

use crate::config::{ModelPreset, ProviderConfig};
use crate::error::{MediaError, Result};
use crate::provider::{ImageProvider, TextProvider};

/// Supported provider types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Vertex,
    OpenRouter,
    Cerebras,
}

impl ProviderKind {
    /// Parse provider kind from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "vertex" | "imagen" => Ok(Self::Vertex),
            "openrouter" => Ok(Self::OpenRouter),
            "cerebras" => Ok(Self::Cerebras),
            _ => Err(MediaError::ConfigError(format!("Unknown provider: {}", s))),
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Vertex => "GEMINI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::Cerebras => "CEREBRAS_API_KEY",
        }
    }
}

/// Create a text provider instance from a preset and optional config
pub fn get_text_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn TextProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;

    match kind {
        ProviderKind::OpenRouter => {
            let api_key = get_api_key(provider_config, kind.env_var(), "OpenRouter")?;
            Ok(Box::new(OpenAICompatibleProvider::openrouter(
                &preset.model,
                api_key,
            )?))
        }
        ProviderKind::Cerebras => {
            let api_key = get_api_key(provider_config, kind.env_var(), "Cerebras")?;
            Ok(Box::new(OpenAICompatibleProvider::cerebras(
                &preset.model,
                api_key,
            )?))
        }
        ProviderKind::Vertex => Err(MediaError::ConfigError(format!(
            "Provider '{}' does not support text generation",
            preset.provider
        ))),
    }
}

/// Create an image provider instance from a preset and optional config
pub fn get_image_provider(
    preset: &ModelPreset,
    provider_config: Option<&ProviderConfig>,
) -> Result<Box<dyn ImageProvider>> {
    let kind = ProviderKind::from_str(&preset.provider)?;

    match kind {
        ProviderKind::Vertex => {
            let api_key = get_api_key(provider_config, kind.env_var(), "Vertex")?;
            if let Some(base_url) = provider_config.and_then(|c| c.base_url.as_deref()) {
                Ok(Box::new(VertexImageProvider::with_base_url(
                    &preset.model,
                    base_url,
                    api_key,
                )?))
            } else {
                Ok(Box::new(VertexImageProvider::new(&preset.model, api_key)?))
            }
        }
        ProviderKind::OpenRouter | ProviderKind::Cerebras => {
            Err(MediaError::ConfigError(format!(
                "Provider '{}' does not support image generation",
                preset.provider
            )))
        }
    }
}

/// Get API key from config or environment variable
fn get_api_key(
    config: Option<&ProviderConfig>,
    env_var: &str,
    provider_name: &str,
) -> Result<String> {
    // Check config first
    if let Some(key) = config.and_then(|c| c.api_key.clone()) {
        return Ok(key);
    }

    // Fall back to environment variable
    std::env::var(env_var).map_err(|_| MediaError::MissingApiKey {
        provider: provider_name.to_string(),
        env_var: env_var.to_string(),
    })
}
