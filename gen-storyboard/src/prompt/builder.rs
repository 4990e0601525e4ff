//! Deterministic prompt rendering from a story config and segment text.
//!
//! Every config field is independently defaulted to a fixed constant, so
//! rendering never fails and identical inputs produce byte-identical
//! prompts.

use crate::story::StoryConfig;

/// Placeholder used when a segment's text is empty after trimming.
pub const EMPTY_SCENE_PLACEHOLDER: &str = "no scene description";

pub const DEFAULT_NAME: &str = "unknown character";
pub const DEFAULT_ORIGIN: &str = "unknown origins";
pub const DEFAULT_DOMAINS: &str = "everyday life";
pub const DEFAULT_VALUES: &str = "quiet determination";
pub const DEFAULT_HAIR: &str = "natural hair";
pub const DEFAULT_DEMEANOR: &str = "composed";
pub const DEFAULT_ART_STYLE: &str = "cinematic realism";
pub const DEFAULT_MOOD: &str = "contemplative";
pub const DEFAULT_PALETTE: &str = "warm, earthy color palette";
pub const DEFAULT_PERSPECTIVE: &str = "medium shot";
pub const DEFAULT_LENS: &str = "standard lens";
pub const DEFAULT_COMPOSITION: &str = "balanced composition";
pub const DEFAULT_DEPTH_OF_FIELD: &str = "shallow depth of field";

/// Render an image-generation prompt for one segment.
///
/// Without a config the trimmed segment text is the prompt (placeholder
/// when empty). With a config, a fixed template combines the identity,
/// style, and camera fields around the scene text. Age progression is a
/// separate lookup for callers and never alters the rendered prompt.
pub fn build_prompt(
    config: Option<&StoryConfig>,
    segment_text: &str,
    _segment_index: usize,
) -> String {
    let scene = non_empty(segment_text).unwrap_or(EMPTY_SCENE_PLACEHOLDER);

    let Some(config) = config else {
        return scene.to_string();
    };

    let identity = &config.identity_core;
    let style = &config.style_throughline;
    let camera = &config.camera_baseline;

    let name = non_empty(&identity.name).unwrap_or(DEFAULT_NAME);
    let origin = field(identity.origin.as_deref(), DEFAULT_ORIGIN);
    let domains = field(identity.domains.as_deref(), DEFAULT_DOMAINS);
    let values = field(identity.values.as_deref(), DEFAULT_VALUES);
    let hair = field(identity.hair_general.as_deref(), DEFAULT_HAIR);
    let demeanor = field(identity.demeanor.as_deref(), DEFAULT_DEMEANOR);
    let art_style = field(style.art_style.as_deref(), DEFAULT_ART_STYLE);
    let mood = field(style.mood.as_deref(), DEFAULT_MOOD);
    let palette = field(style.color_palette_base.as_deref(), DEFAULT_PALETTE);
    let perspective = field(camera.perspective.as_deref(), DEFAULT_PERSPECTIVE);
    let lens = camera
        .lens_mm
        .map(|mm| format!("{mm}mm lens"))
        .unwrap_or_else(|| DEFAULT_LENS.to_string());
    let composition = field(camera.composition.as_deref(), DEFAULT_COMPOSITION);
    let depth_of_field = field(camera.depth_of_field.as_deref(), DEFAULT_DEPTH_OF_FIELD);

    let mut prompt = format!(
        "{art_style} rendering, {perspective} of {name}, a figure of {origin}, \
         with {hair}, {demeanor} in demeanor, immersed in {domains}. \
         Mood is {mood}, and the color palette is {palette}. \
         Captured with a {lens}, {composition}, {depth_of_field}. \
         Character values: {values}. Scene segment: {scene}"
    );

    if let Some(constraints) = config
        .global_constraints
        .as_deref()
        .and_then(non_empty)
    {
        prompt.push_str(". Global constraints: ");
        prompt.push_str(constraints);
    }

    prompt
}

fn field<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.and_then(non_empty).unwrap_or(default)
}

fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
