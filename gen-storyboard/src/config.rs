//! gen-story configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::generation::GENERATION_TIMEOUT_SECS;
use crate::text::DEFAULT_TARGET_WORDS;

const DEFAULT_ASPECT_RATIO: &str = "9:16";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenStoryConfig {
    /// Target words per segment
    #[serde(default = "default_target_words")]
    pub target_words: usize,

    /// Aspect ratio for generated images
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,

    /// Per-segment generation timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Rewrite prompts through a text model before generation
    #[serde(default)]
    pub enrich: bool,

    /// Image preset name from the media config. None uses that config's
    /// default.
    #[serde(default)]
    pub image_preset: Option<String>,

    /// Text preset name used for enrichment
    #[serde(default)]
    pub text_preset: Option<String>,
}

fn default_target_words() -> usize {
    DEFAULT_TARGET_WORDS
}

fn default_aspect_ratio() -> String {
    DEFAULT_ASPECT_RATIO.to_string()
}

fn default_timeout_secs() -> u64 {
    GENERATION_TIMEOUT_SECS
}

impl Default for GenStoryConfig {
    fn default() -> Self {
        Self {
            target_words: default_target_words(),
            aspect_ratio: default_aspect_ratio(),
            timeout_secs: default_timeout_secs(),
            enrich: false,
            image_preset: None,
            text_preset: None,
        }
    }
}

impl GenStoryConfig {
    /// Get the config file path: ~/.config/cli-programs/gen-story.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("gen-story.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: GenStoryConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GenStoryConfig::default();
        assert_eq!(config.target_words, 25);
        assert_eq!(config.aspect_ratio, "9:16");
        assert_eq!(config.timeout_secs, 55);
        assert!(!config.enrich);
        assert!(config.image_preset.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = GenStoryConfig::config_path();
        assert!(path.is_ok());
        assert!(path.unwrap().ends_with("cli-programs/gen-story.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
target_words = 40
aspect_ratio = "16:9"
enrich = true
image_preset = "vertex"
"#;
        let config: GenStoryConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.target_words, 40);
        assert_eq!(config.aspect_ratio, "16:9");
        assert!(config.enrich);
        assert_eq!(config.image_preset, Some("vertex".to_string()));
        assert_eq!(config.timeout_secs, 55);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: GenStoryConfig = toml::from_str("").unwrap();
        assert_eq!(config.target_words, 25);
        assert_eq!(config.aspect_ratio, "9:16");
    }
}
