//! gen-story - Turn long-form text into an illustrated storyboard.

mod config;
mod generation;
mod prompt;
mod story;
mod text;

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::{Parser, Subcommand};
use config::GenStoryConfig;
use generation::{
    GenerateRequest, GenerateResponse, OrchestratorOptions, SegmentOrchestrator,
};
use indicatif::{ProgressBar, ProgressStyle};
use media_client::{Config as MediaConfig, get_image_provider, get_text_provider};
use prompt::PromptEnricher;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use story::StoryConfig;
use text::segment_text;

#[derive(Parser, Debug)]
#[command(name = "gen-story")]
#[command(about = "Turn long-form text into an illustrated storyboard", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the input text file
    text_file: Option<PathBuf>,

    /// Output directory (default: <text-name>-storyboard)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to a story config JSON file
    #[arg(long)]
    story_config: Option<PathBuf>,

    /// Target words per segment
    #[arg(long)]
    target_words: Option<usize>,

    /// Aspect ratio for generated images (1:1, 9:16, 16:9)
    #[arg(long)]
    aspect_ratio: Option<String>,

    /// Use segment texts verbatim as prompts
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Rewrite prompts through a text model before generation
    #[arg(long, default_value_t = false)]
    enrich: bool,

    /// Seed for reproducible images (default: derived from clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Regenerate a single segment by index
    #[arg(long)]
    segment: Option<usize>,

    /// Literal prompt for --segment (bypasses prompt construction)
    #[arg(long)]
    prompt: Option<String>,

    /// Image preset name from the media config
    #[arg(long)]
    preset: Option<String>,

    /// Text preset name used for enrichment
    #[arg(long)]
    text_preset: Option<String>,

    /// Per-segment timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Split a text into segments and print them without generating
    Segments {
        /// Path to the input text file
        text_file: PathBuf,

        /// Target words per segment
        #[arg(long)]
        target_words: Option<usize>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set default target words per segment
    SetTargetWords {
        /// Words per segment (>= 1)
        value: usize,
    },
    /// Set default aspect ratio
    SetAspectRatio {
        /// Ratio string (1:1, 9:16, 16:9)
        value: String,
    },
    /// Enable or disable prompt enrichment by default
    SetEnrich {
        /// true or false
        value: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match &args.command {
        Some(Commands::Config { action }) => {
            return handle_config_command(action);
        }
        Some(Commands::Segments {
            text_file,
            target_words,
        }) => {
            return handle_segments_command(text_file, *target_words);
        }
        None => {}
    }

    let text_path = args.text_file.clone().ok_or_else(|| {
        anyhow::anyhow!("Text file path is required. Run 'gen-story --help' for usage.")
    })?;

    if !text_path.exists() {
        anyhow::bail!("Text file not found: {}", text_path.display());
    }

    let config = GenStoryConfig::load().context("Failed to load configuration")?;

    let target_words = args.target_words.unwrap_or(config.target_words);
    let aspect_ratio = args
        .aspect_ratio
        .clone()
        .unwrap_or_else(|| config.aspect_ratio.clone());
    let timeout_secs = args.timeout.unwrap_or(config.timeout_secs);
    let enrich = args.enrich || config.enrich;

    // A malformed story config stops the run before any generation.
    let story_config = match &args.story_config {
        Some(path) => Some(
            StoryConfig::from_file(path)
                .with_context(|| format!("Failed to load story config: {}", path.display()))?,
        ),
        None => None,
    };

    let raw_text = std::fs::read_to_string(&text_path)
        .with_context(|| format!("Failed to read text file: {}", text_path.display()))?;

    let segments = segment_text(&raw_text, target_words);
    if segments.is_empty() {
        anyhow::bail!("No segments could be extracted from the text");
    }

    eprintln!(
        "Segmented into {} segments (target {} words)",
        segments.len(),
        target_words
    );

    if args.debug {
        for seg in &segments {
            let age = story_config
                .as_ref()
                .and_then(|c| story::resolve_age(&c.identity_core, seg.index));
            match age {
                Some(age) => eprintln!(
                    "  [{}] {} words, character age {}",
                    seg.index, seg.word_count, age
                ),
                None => eprintln!("  [{}] {} words", seg.index, seg.word_count),
            }
        }
    }

    let segment_texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();

    // Validate the run description before touching any provider.
    let request = GenerateRequest {
        segments: segment_texts.clone(),
        story_config: story_config.clone(),
        use_raw_prompts: args.raw,
        original_segment_index: args.segment,
        aspect_ratio: Some(aspect_ratio.clone()),
    };
    request.validate().context("Invalid generation request")?;

    // Resolve providers from the shared media config.
    let media_config = MediaConfig::load().context("Failed to load media configuration")?;

    let image_preset_name = args
        .preset
        .clone()
        .or_else(|| config.image_preset.clone())
        .unwrap_or_else(|| media_config.default_image_preset.clone());
    let image_preset = media_config.get_preset(&image_preset_name)?;
    let provider = get_image_provider(
        image_preset,
        media_config.get_provider_config(&image_preset.provider),
    )?;
    provider.is_available()?;
    let provider: Arc<dyn media_client::ImageProvider> = Arc::from(provider);
    let provider_name = provider.name();

    let enricher = if enrich && !args.raw {
        let text_preset_name = args
            .text_preset
            .clone()
            .or_else(|| config.text_preset.clone())
            .unwrap_or_else(|| media_config.default_text_preset.clone());
        let text_preset = media_config.get_preset(&text_preset_name)?;
        let text_provider = get_text_provider(
            text_preset,
            media_config.get_provider_config(&text_preset.provider),
        )?;
        text_provider.is_available()?;
        Some(PromptEnricher::new(text_provider))
    } else {
        None
    };

    let seed = args.seed.unwrap_or_else(clock_seed);
    let options = OrchestratorOptions {
        timeout: Duration::from_secs(timeout_secs),
        aspect_ratio: Some(aspect_ratio),
        seed: Some(seed),
    };

    let output_dir = args.output.clone().unwrap_or_else(|| {
        let stem = text_path.file_stem().unwrap_or_default();
        text_path.with_file_name(format!("{}-storyboard", stem.to_string_lossy()))
    });
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    if args.debug {
        eprintln!("Provider: {provider_name}");
        eprintln!("Seed: {seed}");
        eprintln!("Output: {}", output_dir.display());
    }

    // Single-segment regeneration: the edit path, always with the
    // literal supplied text as the prompt.
    if let Some(index) = args.segment {
        let prompt_text = args
            .prompt
            .clone()
            .unwrap_or_else(|| segment_texts[index].clone());

        eprintln!("Regenerating segment {index}...");
        let mut orchestrator =
            SegmentOrchestrator::new(Arc::clone(&provider), segment_texts, options);
        let result = orchestrator.edit(index, &prompt_text).await?;

        if let Some(image) = &result.image {
            let path = write_image(&output_dir, index, image)?;
            eprintln!("Wrote {}", path.display());
        } else {
            anyhow::bail!("{}", result.error.as_deref().unwrap_or("Generation failed"));
        }
        return Ok(());
    }

    let mut orchestrator =
        SegmentOrchestrator::new(Arc::clone(&provider), segment_texts, options)
            .with_raw_prompts(args.raw);
    if let Some(story_config) = story_config {
        orchestrator = orchestrator.with_story_config(story_config);
    }
    if let Some(enricher) = enricher {
        orchestrator = orchestrator.with_enricher(enricher);
    }

    let pb = ProgressBar::new(segments.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let results = orchestrator
        .run(|progress| {
            pb.set_position(progress.completed as u64);
            if progress.failed > 0 {
                pb.set_message(format!("{} failed", progress.failed));
            }
        })
        .await;

    pb.finish_with_message("Generation complete");

    let success_count = orchestrator.success_count();
    let total = results.len();

    for result in &results {
        if let Some(image) = &result.image {
            write_image(&output_dir, result.segment_index, image)?;
        } else if let Some(error) = &result.error {
            eprintln!("Segment {}: {}", result.segment_index, error);
        }
    }

    let response = GenerateResponse {
        results,
        total_segments: total,
        success_count,
        provider: provider_name.to_string(),
        generated_at: chrono::Utc::now(),
    };
    let run_path = output_dir.join("run.json");
    std::fs::write(&run_path, serde_json::to_string_pretty(&response)?)
        .with_context(|| format!("Failed to write {}", run_path.display()))?;

    eprintln!("\nCompleted image generation [success={success_count}/{total}]");
    eprintln!("Output: {}", output_dir.display());

    Ok(())
}

/// Decode and write one segment image, returning its path.
fn write_image(output_dir: &std::path::Path, index: usize, image_base64: &str) -> Result<PathBuf> {
    let bytes = BASE64
        .decode(image_base64)
        .with_context(|| format!("Invalid image data for segment {index}"))?;
    let path = output_dir.join(format!("segment-{index:03}.png"));
    std::fs::write(&path, bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Seed derived from the clock when none is supplied.
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(seed_from)
        .unwrap_or(0)
}

fn seed_from(elapsed: Duration) -> u64 {
    elapsed.as_nanos() as u64
}

fn handle_segments_command(text_file: &PathBuf, target_words: Option<usize>) -> Result<()> {
    if !text_file.exists() {
        anyhow::bail!("Text file not found: {}", text_file.display());
    }

    let config = GenStoryConfig::load()?;
    let target = target_words.unwrap_or(config.target_words);

    let raw_text = std::fs::read_to_string(text_file)
        .with_context(|| format!("Failed to read text file: {}", text_file.display()))?;

    let segments = segment_text(&raw_text, target);
    if segments.is_empty() {
        anyhow::bail!("No segments could be extracted from the text");
    }

    for seg in &segments {
        println!("[{}] ({} words) {}", seg.index, seg.word_count, seg.text);
    }
    eprintln!("\n{} segments (target {} words)", segments.len(), target);

    Ok(())
}

fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = GenStoryConfig::load()?;
            println!("Configuration file: {:?}", GenStoryConfig::config_path()?);
            println!();
            println!("target_words = {}", config.target_words);
            println!("aspect_ratio = \"{}\"", config.aspect_ratio);
            println!("timeout_secs = {}", config.timeout_secs);
            println!("enrich = {}", config.enrich);
            if let Some(preset) = &config.image_preset {
                println!("image_preset = \"{preset}\"");
            } else {
                println!("image_preset = (media config default)");
            }
            if let Some(preset) = &config.text_preset {
                println!("text_preset = \"{preset}\"");
            } else {
                println!("text_preset = (media config default)");
            }
        }
        ConfigAction::SetTargetWords { value } => {
            let mut config = GenStoryConfig::load()?;
            config.target_words = (*value).max(1);
            config.save()?;
            println!("Default target words set to: {}", config.target_words);
        }
        ConfigAction::SetAspectRatio { value } => {
            if !generation::SUPPORTED_ASPECT_RATIOS.contains(&value.as_str()) {
                anyhow::bail!(
                    "Unsupported aspect ratio '{}'. Supported: {}",
                    value,
                    generation::SUPPORTED_ASPECT_RATIOS.join(", ")
                );
            }
            let mut config = GenStoryConfig::load()?;
            config.aspect_ratio = value.clone();
            config.save()?;
            println!("Default aspect ratio set to: {}", config.aspect_ratio);
        }
        ConfigAction::SetEnrich { value } => {
            let mut config = GenStoryConfig::load()?;
            config.enrich = *value;
            config.save()?;
            println!("Default enrich set to: {}", config.enrich);
        }
    }
    Ok(())
}
