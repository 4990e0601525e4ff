//! Story configuration: schema, parsing, validation, age resolution.

pub mod types;

pub use types::{
    AgeProgression, CameraBaseline, IdentityCore, Milestone, MilestoneRange, StoryConfig,
    StyleThroughline, resolve_age,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoryConfigError {
    #[error("failed to parse story config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid story config: {0}")]
    Invalid(String),

    #[error("failed to read story config: {0}")]
    Io(#[from] std::io::Error),
}

impl StoryConfig {
    /// Parse and validate a story config from JSON.
    pub fn from_json(json: &str) -> Result<Self, StoryConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a story config file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, StoryConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Structural checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), StoryConfigError> {
        if self.identity_core.name.trim().is_empty() {
            return Err(StoryConfigError::Invalid(
                "identity_core.name must not be empty".to_string(),
            ));
        }

        if let Some(lens) = self.camera_baseline.lens_mm
            && lens <= 0.0
        {
            return Err(StoryConfigError::Invalid(format!(
                "camera_baseline.lens_mm must be positive, got {lens}"
            )));
        }

        if let Some(progression) = &self.identity_core.age_progression {
            for (key, _) in &progression.milestones {
                if MilestoneRange::parse(key).is_none() {
                    return Err(StoryConfigError::Invalid(format!(
                        "malformed milestone range {key:?}: expected \"N+\" or \"N-M\""
                    )));
                }
            }
        }

        Ok(())
    }
}
