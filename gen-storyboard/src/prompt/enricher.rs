//! Optional prompt enrichment through a text-generation model.
//!
//! Enrichment is best-effort: any transport or provider failure falls
//! back to the deterministic builder output, so a missing or flaky text
//! model can never fail a generation run.

use media_client::{TextProvider, TextRequest};

use super::builder::build_prompt;
use crate::story::StoryConfig;

const ENRICHMENT_SYSTEM_PROMPT: &str = "You rewrite scene descriptions into vivid, \
concrete image-generation prompts. Keep the character and style details from the \
context block, stay faithful to the scene text, and respond with the prompt only, \
no preamble or commentary.";

const ENRICHMENT_MAX_TOKENS: u32 = 400;

/// Rewrites deterministic prompts through a hosted text model.
pub struct PromptEnricher {
    provider: Box<dyn TextProvider>,
}

impl PromptEnricher {
    pub fn new(provider: Box<dyn TextProvider>) -> Self {
        Self { provider }
    }

    /// Produce an enriched prompt for one segment.
    ///
    /// Falls back to [`build_prompt`] output on any provider error or an
    /// empty response. The call has no timeout of its own; the caller's
    /// budget bounds it.
    pub async fn enrich(
        &self,
        config: Option<&StoryConfig>,
        segment_text: &str,
        segment_index: usize,
    ) -> String {
        let fallback = build_prompt(config, segment_text, segment_index);

        let request = TextRequest {
            prompt: build_enrichment_input(config, segment_text),
            system_prompt: Some(ENRICHMENT_SYSTEM_PROMPT.to_string()),
            max_tokens: Some(ENRICHMENT_MAX_TOKENS),
            temperature: Some(0.7),
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                let enriched = response.content.trim();
                if enriched.is_empty() {
                    log::warn!(
                        "Empty enrichment response for segment {segment_index}, using deterministic prompt"
                    );
                    fallback
                } else {
                    enriched.to_string()
                }
            }
            Err(e) => {
                log::warn!(
                    "Enrichment failed for segment {segment_index}, using deterministic prompt: {e}"
                );
                fallback
            }
        }
    }
}

/// Context block (one line per present field, fixed order) plus the raw
/// scene text.
fn build_enrichment_input(config: Option<&StoryConfig>, segment_text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(config) = config {
        let identity = &config.identity_core;
        let style = &config.style_throughline;
        let camera = &config.camera_baseline;

        push_line(&mut lines, "Character", Some(&identity.name));
        push_line(&mut lines, "Origin", identity.origin.as_deref());
        push_line(&mut lines, "Domains", identity.domains.as_deref());
        push_line(&mut lines, "Values", identity.values.as_deref());
        push_line(&mut lines, "Hair", identity.hair_general.as_deref());
        push_line(&mut lines, "Demeanor", identity.demeanor.as_deref());
        push_line(&mut lines, "Art style", style.art_style.as_deref());
        push_line(&mut lines, "Mood", style.mood.as_deref());
        push_line(&mut lines, "Color palette", style.color_palette_base.as_deref());
        push_line(&mut lines, "Perspective", camera.perspective.as_deref());
        if let Some(mm) = camera.lens_mm {
            lines.push(format!("Lens: {mm}mm"));
        }
        push_line(&mut lines, "Composition", camera.composition.as_deref());
        push_line(&mut lines, "Depth of field", camera.depth_of_field.as_deref());
        push_line(&mut lines, "Constraints", config.global_constraints.as_deref());
    }

    lines.push(format!("Scene: {}", segment_text.trim()));
    lines.join("\n")
}

fn push_line(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value
        && !value.trim().is_empty()
    {
        lines.push(format!("{label}: {}", value.trim()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::{CameraBaseline, IdentityCore, StoryConfig, StyleThroughline};
    use media_client::{MediaError, MockTextProvider};

    fn config() -> StoryConfig {
        StoryConfig {
            identity_core: IdentityCore {
                name: "Mira".to_string(),
                base_age: None,
                age_progression: None,
                origin: Some("a coastal village".to_string()),
                domains: None,
                values: None,
                hair_general: None,
                demeanor: None,
            },
            style_throughline: StyleThroughline {
                art_style: Some("gouache illustration".to_string()),
                mood: None,
                color_palette_base: None,
            },
            camera_baseline: CameraBaseline {
                perspective: None,
                lens_mm: Some(35.0),
                composition: None,
                depth_of_field: None,
            },
            global_constraints: None,
        }
    }

    #[test]
    fn test_context_block_field_order() {
        let input = build_enrichment_input(Some(&config()), "She waited by the pier.");
        let lines: Vec<&str> = input.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Character: Mira",
                "Origin: a coastal village",
                "Art style: gouache illustration",
                "Lens: 35mm",
                "Scene: She waited by the pier.",
            ]
        );
    }

    #[test]
    fn test_context_block_without_config() {
        let input = build_enrichment_input(None, "  Just the scene.  ");
        assert_eq!(input, "Scene: Just the scene.");
    }

    fn provider_error() -> MediaError {
        MediaError::ApiError {
            message: "boom".to_string(),
            status_code: Some(500),
        }
    }

    #[tokio::test]
    async fn test_enrich_returns_model_output() {
        let enricher = PromptEnricher::new(Box::new(MockTextProvider::always_succeeds(
            "Mira stands at the pier under a slate sky.",
        )));
        let prompt = enricher.enrich(Some(&config()), "She waited.", 0).await;
        assert_eq!(prompt, "Mira stands at the pier under a slate sky.");
    }

    #[tokio::test]
    async fn test_enrich_trims_model_output() {
        let enricher =
            PromptEnricher::new(Box::new(MockTextProvider::always_succeeds("  padded  \n")));
        let prompt = enricher.enrich(None, "She waited.", 0).await;
        assert_eq!(prompt, "padded");
    }

    #[tokio::test]
    async fn test_enrich_falls_back_on_failure() {
        let enricher = PromptEnricher::new(Box::new(MockTextProvider::always_fails(
            provider_error(),
        )));
        let prompt = enricher.enrich(Some(&config()), "She waited.", 3).await;
        assert_eq!(prompt, build_prompt(Some(&config()), "She waited.", 3));
    }

    #[tokio::test]
    async fn test_enrich_falls_back_on_empty_response() {
        let enricher = PromptEnricher::new(Box::new(MockTextProvider::always_succeeds("   ")));
        let prompt = enricher.enrich(Some(&config()), "She waited.", 1).await;
        assert_eq!(prompt, build_prompt(Some(&config()), "She waited.", 1));
    }

    #[tokio::test]
    async fn test_enrich_falls_back_without_config() {
        let enricher = PromptEnricher::new(Box::new(MockTextProvider::always_fails(
            provider_error(),
        )));
        let prompt = enricher.enrich(None, "A quiet street.", 0).await;
        assert_eq!(prompt, "A quiet street.");
    }
}
