//! Mock providers for testing
//!
//! Configurable mocks for both provider traits that can simulate failures,
//! eventual success, and record the prompts they were called with.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{MediaError, Result};
use crate::provider::{
    DimensionFormat, ImageProvider, ImageRequest, ImageResponse, TextProvider, TextRequest,
    TextResponse,
};

/// A mock text provider for testing enrichment fallback behavior
pub struct MockTextProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<MediaError>>,
    /// Response content to return on success
    success_response: String,
    /// Prompts received, in call order
    prompts: Mutex<Vec<String>>,
}

impl MockTextProvider {
    /// Create a provider that always succeeds with the given response
    pub fn always_succeeds(response: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            success_response: response.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: MediaError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            success_response: String::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Get the number of times complete() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    async fn complete(&self, request: TextRequest) -> Result<TextResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt);

        if call_num < self.fail_count.load(Ordering::SeqCst) {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(TextResponse {
            content: self.success_response.clone(),
            model: "mock-model".to_string(),
            usage: None,
        })
    }

    fn name(&self) -> &'static str {
        "mock-text"
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// A mock image provider for testing orchestration behavior
pub struct MockImageProvider {
    /// Number of times to fail before succeeding (0 = always succeed)
    fail_count: AtomicUsize,
    /// Current call count
    call_count: AtomicUsize,
    /// Error to return on failure (None = always succeed)
    fail_with: Mutex<Option<MediaError>>,
    /// Fail any request whose prompt contains this marker
    fail_on_prompt: Mutex<Option<String>>,
    /// Base64 payload to return on success
    success_image: String,
    /// Prompts received, in call order
    prompts: Mutex<Vec<String>>,
}

impl MockImageProvider {
    /// Create a provider that always succeeds with the given base64 payload
    pub fn always_succeeds(image_base64: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(0),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(None),
            fail_on_prompt: Mutex::new(None),
            success_image: image_base64.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that always fails with the given error
    pub fn always_fails(error: MediaError) -> Self {
        Self {
            fail_count: AtomicUsize::new(usize::MAX),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            fail_on_prompt: Mutex::new(None),
            success_image: String::new(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that fails `n` times with the given error, then succeeds
    pub fn fails_then_succeeds(n: usize, error: MediaError, image_base64: &str) -> Self {
        Self {
            fail_count: AtomicUsize::new(n),
            call_count: AtomicUsize::new(0),
            fail_with: Mutex::new(Some(error)),
            fail_on_prompt: Mutex::new(None),
            success_image: image_base64.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail requests whose prompt contains the given marker, succeed otherwise
    pub fn failing_on_prompt(self, marker: &str) -> Self {
        *self.fail_on_prompt.lock().unwrap() = Some(marker.to_string());
        self
    }

    /// Get the number of times generate() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Get all prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageProvider for MockImageProvider {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResponse> {
        let call_num = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());

        if let Some(marker) = self.fail_on_prompt.lock().unwrap().as_ref()
            && request.prompt.contains(marker)
        {
            return Err(MediaError::ApiError {
                message: format!("mock failure for prompt containing '{}'", marker),
                status_code: Some(500),
            });
        }

        if call_num < self.fail_count.load(Ordering::SeqCst) {
            let error = self.fail_with.lock().unwrap();
            if let Some(err) = error.as_ref() {
                return Err(clone_error(err));
            }
        }

        Ok(ImageResponse {
            image_base64: self.success_image.clone(),
            warnings: Vec::new(),
        })
    }

    fn name(&self) -> &'static str {
        "mock-image"
    }

    fn dimension_format(&self) -> DimensionFormat {
        DimensionFormat::AspectRatio
    }

    fn is_available(&self) -> Result<()> {
        Ok(())
    }
}

/// Clone a MediaError (needed because MediaError doesn't implement Clone)
fn clone_error(err: &MediaError) -> MediaError {
    match err {
        MediaError::ServerOverloaded { message } => MediaError::ServerOverloaded {
            message: message.clone(),
        },
        MediaError::MissingApiKey { provider, env_var } => MediaError::MissingApiKey {
            provider: provider.clone(),
            env_var: env_var.clone(),
        },
        MediaError::RateLimited { retry_after } => MediaError::RateLimited {
            retry_after: *retry_after,
        },
        MediaError::ApiError {
            message,
            status_code,
        } => MediaError::ApiError {
            message: message.clone(),
            status_code: *status_code,
        },
        MediaError::Timeout { seconds } => MediaError::Timeout { seconds: *seconds },
        MediaError::EmptyResponse => MediaError::EmptyResponse,
        MediaError::ProviderUnavailable(s) => MediaError::ProviderUnavailable(s.clone()),
        MediaError::ConfigError(s) => MediaError::ConfigError(s.clone()),
        MediaError::InvalidPreset(s) => MediaError::InvalidPreset(s.clone()),
        // Io and Toml errors can't be cloned; degrade to a generic error
        MediaError::Io(_) => MediaError::ConfigError("IO error (mock)".to_string()),
        MediaError::TomlParse(_) => MediaError::ConfigError("TOML parse error (mock)".to_string()),
        MediaError::TomlSerialize(_) => {
            MediaError::ConfigError("TOML serialize error (mock)".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ImageDimensions;

    fn image_request(prompt: &str) -> ImageRequest {
        ImageRequest {
            prompt: prompt.to_string(),
            dimensions: ImageDimensions::default_aspect_ratio(),
            seed: None,
            disable_watermark: true,
        }
    }

    #[tokio::test]
    async fn test_image_always_succeeds() {
        let provider = MockImageProvider::always_succeeds("aGVsbG8=");
        let result = provider.generate(image_request("a street")).await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap().image_base64, "aGVsbG8=");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.prompts(), vec!["a street".to_string()]);
    }

    #[tokio::test]
    async fn test_image_fails_then_succeeds() {
        let provider = MockImageProvider::fails_then_succeeds(
            2,
            MediaError::ServerOverloaded {
                message: "overloaded".to_string(),
            },
            "aGVsbG8=",
        );

        assert!(provider.generate(image_request("x")).await.is_err());
        assert!(provider.generate(image_request("x")).await.is_err());
        assert!(provider.generate(image_request("x")).await.is_ok());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_image_failing_on_prompt() {
        let provider = MockImageProvider::always_succeeds("aGVsbG8=").failing_on_prompt("storm");
        assert!(provider.generate(image_request("calm sea")).await.is_ok());
        assert!(provider.generate(image_request("a storm rolls in")).await.is_err());
    }

    #[tokio::test]
    async fn test_text_always_fails() {
        let provider = MockTextProvider::always_fails(MediaError::ApiError {
            message: "boom".to_string(),
            status_code: Some(500),
        });
        let request = TextRequest {
            prompt: "test".to_string(),
            system_prompt: None,
            max_tokens: None,
            temperature: None,
        };

        for _ in 0..3 {
            assert!(provider.complete(request.clone()).await.is_err());
        }
        assert_eq!(provider.call_count(), 3);
    }
}
