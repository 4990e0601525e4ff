//! Imagen image provider (Google Generative Language API)
//!
//! Calls the `:predict` endpoint with an instances/parameters payload and
//! returns the first base64-encoded prediction.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{MediaError, Result};
use crate::provider::{
    DimensionFormat, ImageDimensions, ImageProvider, ImageRequest, ImageResponse,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Image provider backed by Google's Imagen models.
pub struct VertexImageProvider {
    model: String,
    base_url: String,
    api_key: String,
    client: Client,
}

impl VertexImageProvider {
    /// Create a new provider for the given Imagen model.
    pub fn new(model: &str, api_key: String) -> Result<Self> {
        Self::with_base_url(model, DEFAULT_BASE_URL, api_key)
    }

    /// Create a provider against a custom base URL (used in tests and for
    /// self-hosted proxies).
    pub fn with_base_url(model: &str, base_url: &str, api_key: String) -> Result<Self> {
        Ok(Self {
            model: model.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        })
    }
}

// Predict API request/response types

#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<Instance>,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Instance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters {
    sample_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    aspect_ratio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    // Imagen only honors an explicit seed when the watermark is disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    add_watermark: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    #[serde(rename = "raiFilteredReason")]
    rai_filtered_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[async_trait]
impl ImageProvider for VertexImageProvider {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResponse> {
        let aspect_ratio = match &request.dimensions {
            ImageDimensions::AspectRatio(ratio) => Some(ratio.clone()),
            // Imagen takes ratios, not pixel sizes; map explicit sizes to
            // the nearest supported square ratio.
            ImageDimensions::Size { .. } => Some("1:1".to_string()),
        };

        let predict_request = PredictRequest {
            instances: vec![Instance {
                prompt: request.prompt.clone(),
            }],
            parameters: Parameters {
                sample_count: 1,
                aspect_ratio,
                seed: request.seed,
                add_watermark: request.disable_watermark.then_some(false),
            },
        };

        let url = format!("{}/models/{}:predict", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&predict_request)
            .send()
            .await
            .map_err(|e| MediaError::ApiError {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };

            if status.as_u16() == 429 {
                return Err(MediaError::RateLimited { retry_after: None });
            }
            if status.as_u16() == 503 {
                return Err(MediaError::ServerOverloaded { message });
            }

            return Err(MediaError::ApiError {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let predict_response: PredictResponse =
            response.json().await.map_err(|e| MediaError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        let mut warnings = Vec::new();
        let mut image_base64 = None;

        for prediction in predict_response.predictions {
            if let Some(reason) = prediction.rai_filtered_reason {
                warnings.push(reason);
            }
            if image_base64.is_none() {
                image_base64 = prediction.bytes_base64_encoded;
            }
        }

        let image_base64 = image_base64.ok_or(MediaError::EmptyResponse)?;

        Ok(ImageResponse {
            image_base64,
            warnings,
        })
    }

    fn name(&self) -> &'static str {
        "Vertex"
    }

    fn dimension_format(&self) -> DimensionFormat {
        DimensionFormat::AspectRatio
    }

    fn is_available(&self) -> Result<()> {
        // API key was provided in constructor
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_request_shape() {
        let request = PredictRequest {
            instances: vec![Instance {
                prompt: "a quiet street".to_string(),
            }],
            parameters: Parameters {
                sample_count: 1,
                aspect_ratio: Some("9:16".to_string()),
                seed: Some(42),
                add_watermark: Some(false),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"aspectRatio\":\"9:16\""));
        assert!(json.contains("\"addWatermark\":false"));
        assert!(json.contains("\"seed\":42"));
    }

    #[test]
    fn test_parse_predict_response() {
        let body = r#"{
            "predictions": [
                {"bytesBase64Encoded": "aGVsbG8=", "mimeType": "image/png"}
            ]
        }"#;
        let parsed: PredictResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.predictions.len(), 1);
        assert_eq!(
            parsed.predictions[0].bytes_base64_encoded.as_deref(),
            Some("aGVsbG8=")
        );
    }
}
