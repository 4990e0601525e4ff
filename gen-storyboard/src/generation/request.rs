//! Generation run boundary types.
//!
//! The request/response shapes mirror the JSON wire format (camelCase)
//! so a run description can be read from or written to disk unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::story::StoryConfig;

/// Aspect ratios accepted at the boundary.
pub const SUPPORTED_ASPECT_RATIOS: &[&str] = &["1:1", "9:16", "16:9"];

#[derive(Debug, Error)]
pub enum RequestError {
    /// Generic rejection; detail is logged, not surfaced.
    #[error("Invalid request parameters")]
    InvalidParameters,

    #[error("segment index {index} out of range (have {total} segments)")]
    SegmentOutOfRange { index: usize, total: usize },
}

/// A full generation run description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub segments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_config: Option<StoryConfig>,
    /// Use segment texts verbatim as prompts, bypassing the builder.
    #[serde(default)]
    pub use_raw_prompts: bool,
    /// Set when this request regenerates a single existing segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_segment_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}

impl GenerateRequest {
    /// Reject malformed runs before any work starts. Specific failure
    /// detail goes to the log; callers see the generic error.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.segments.is_empty() {
            log::error!("Rejecting request: empty segment list");
            return Err(RequestError::InvalidParameters);
        }

        if let Some(ratio) = &self.aspect_ratio
            && !SUPPORTED_ASPECT_RATIOS.contains(&ratio.as_str())
        {
            log::error!("Rejecting request: unsupported aspect ratio {ratio:?}");
            return Err(RequestError::InvalidParameters);
        }

        if let Some(index) = self.original_segment_index
            && index >= self.segments.len()
        {
            return Err(RequestError::SegmentOutOfRange {
                index,
                total: self.segments.len(),
            });
        }

        Ok(())
    }
}

/// Outcome for one segment. Exactly one of `image`/`error` is set once
/// the segment completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub segment_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub prompt: String,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub results: Vec<GenerationResult>,
    pub total_segments: usize,
    pub success_count: usize,
    pub provider: String,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(segments: &[&str]) -> GenerateRequest {
        GenerateRequest {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            story_config: None,
            use_raw_prompts: false,
            original_segment_index: None,
            aspect_ratio: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request(&["one", "two"]).validate().is_ok());
    }

    #[test]
    fn test_empty_segments_rejected() {
        let err = request(&[]).validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid request parameters");
    }

    #[test]
    fn test_bad_aspect_ratio_rejected() {
        let mut req = request(&["one"]);
        req.aspect_ratio = Some("4:3".to_string());
        assert!(matches!(
            req.validate(),
            Err(RequestError::InvalidParameters)
        ));

        req.aspect_ratio = Some("9:16".to_string());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_edit_index_out_of_range() {
        let mut req = request(&["one", "two"]);
        req.original_segment_index = Some(2);
        assert!(matches!(
            req.validate(),
            Err(RequestError::SegmentOutOfRange { index: 2, total: 2 })
        ));

        req.original_segment_index = Some(1);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_camel_case_wire_shape() {
        let json = r#"{
            "segments": ["a scene"],
            "useRawPrompts": true,
            "originalSegmentIndex": 0,
            "aspectRatio": "9:16"
        }"#;
        let req: GenerateRequest = serde_json::from_str(json).unwrap();
        assert!(req.use_raw_prompts);
        assert_eq!(req.original_segment_index, Some(0));

        let result = GenerationResult {
            segment_index: 3,
            image: None,
            error: Some("Failed to generate image for this segment".to_string()),
            prompt: "p".to_string(),
        };
        let out = serde_json::to_string(&result).unwrap();
        assert!(out.contains("\"segmentIndex\":3"));
        assert!(!out.contains("image"));
    }
}
