use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a text-generation provider
#[derive(Debug, Clone)]
pub struct TextRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Response from a text-generation provider
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait for text-generation providers
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Execute a completion request
    async fn complete(&self, request: TextRequest) -> Result<TextResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Check if the provider is available (API key set, etc.)
    fn is_available(&self) -> Result<()>;
}

/// How a provider expresses output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionFormat {
    /// Explicit pixel size, e.g. "1024x1024"
    Size,
    /// Ratio string, e.g. "9:16"
    AspectRatio,
}

/// Output dimensions for an image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageDimensions {
    Size { width: u32, height: u32 },
    AspectRatio(String),
}

impl ImageDimensions {
    /// Default square size used when a provider wants explicit pixels.
    pub fn default_size() -> Self {
        Self::Size {
            width: 1024,
            height: 1024,
        }
    }

    /// Default portrait ratio used when a provider wants a ratio.
    pub fn default_aspect_ratio() -> Self {
        Self::AspectRatio("9:16".to_string())
    }
}

/// Request to send to an image-generation provider
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub dimensions: ImageDimensions,
    /// Seed for reproducible output. Providers that watermark may ignore
    /// it unless the watermark is disabled.
    pub seed: Option<u64>,
    pub disable_watermark: bool,
}

/// Response from an image-generation provider
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// Base64-encoded image bytes
    pub image_base64: String,
    /// Non-fatal provider warnings
    pub warnings: Vec<String>,
}

/// Trait for image-generation providers
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate a single image from a prompt
    async fn generate(&self, request: ImageRequest) -> Result<ImageResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;

    /// Which dimension format this provider expects
    fn dimension_format(&self) -> DimensionFormat;

    /// Check if the provider is available (API key set, etc.)
    fn is_available(&self) -> Result<()>;
}
