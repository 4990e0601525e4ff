//! Per-segment generation orchestration.
//!
//! Every segment runs as an independent task; completions arrive as
//! events over a channel and are recorded at the segment's own index, so
//! out-of-order completion never reorders results. A failure or timeout
//! in one segment does not touch its siblings.

use std::sync::Arc;
use std::time::Duration;

use media_client::{
    DimensionFormat, ImageDimensions, ImageProvider, ImageRequest, ImageResponse, MediaError,
};
use tokio::sync::mpsc;

use super::request::{GenerationResult, RequestError};
use crate::prompt::{EMPTY_SCENE_PLACEHOLDER, PromptEnricher, build_prompt};
use crate::story::StoryConfig;

/// Per-segment wall-clock budget, kept under typical hosting execution
/// limits.
pub const GENERATION_TIMEOUT_SECS: u64 = 55;

/// The only error text ever surfaced for a failed segment. Full detail
/// goes to the log.
pub const SEGMENT_FAILURE_MESSAGE: &str = "Failed to generate image for this segment";

/// Lifecycle of one segment. Finished segments re-enter `Generating`
/// when edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentState {
    Pending,
    Generating,
    Succeeded,
    Failed,
}

/// Knobs for a generation run.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub timeout: Duration,
    /// Ratio passed to providers that take one; None uses the provider
    /// default.
    pub aspect_ratio: Option<String>,
    pub seed: Option<u64>,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(GENERATION_TIMEOUT_SECS),
            aspect_ratio: None,
            seed: None,
        }
    }
}

/// Progress snapshot handed to the run callback after each completion.
#[derive(Debug, Clone)]
pub struct RunProgress {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// One segment task finished.
struct CompletionEvent {
    index: usize,
    prompt: String,
    outcome: Result<ImageResponse, MediaError>,
}

/// Drives prompt construction and image generation across a segment
/// batch, tracking per-segment state.
pub struct SegmentOrchestrator {
    provider: Arc<dyn ImageProvider>,
    enricher: Option<Arc<PromptEnricher>>,
    config: Option<Arc<StoryConfig>>,
    options: OrchestratorOptions,
    use_raw_prompts: bool,
    segments: Vec<String>,
    states: Vec<SegmentState>,
    results: Vec<Option<GenerationResult>>,
}

impl SegmentOrchestrator {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        segments: Vec<String>,
        options: OrchestratorOptions,
    ) -> Self {
        let count = segments.len();
        Self {
            provider,
            enricher: None,
            config: None,
            options,
            use_raw_prompts: false,
            segments,
            states: vec![SegmentState::Pending; count],
            results: vec![None; count],
        }
    }

    /// Attach a story config used by the prompt builder and enricher.
    pub fn with_story_config(mut self, config: StoryConfig) -> Self {
        self.config = Some(Arc::new(config));
        self
    }

    /// Route prompts through a text-model enricher instead of the
    /// deterministic builder alone.
    pub fn with_enricher(mut self, enricher: PromptEnricher) -> Self {
        self.enricher = Some(Arc::new(enricher));
        self
    }

    /// Use segment texts verbatim as prompts, bypassing builder and
    /// enricher.
    pub fn with_raw_prompts(mut self, raw: bool) -> Self {
        self.use_raw_prompts = raw;
        self
    }

    /// Run every pending segment to completion.
    ///
    /// All segment tasks are dispatched up front; the callback fires
    /// after each completion, in completion order. The returned results
    /// are ordered by segment index regardless of completion order.
    pub async fn run<F>(&mut self, mut on_progress: F) -> Vec<GenerationResult>
    where
        F: FnMut(RunProgress),
    {
        let (tx, mut rx) = mpsc::channel::<CompletionEvent>(32);

        for index in 0..self.segments.len() {
            self.states[index] = SegmentState::Generating;

            let tx = tx.clone();
            let provider = Arc::clone(&self.provider);
            let enricher = self.enricher.clone();
            let config = self.config.clone();
            let options = self.options.clone();
            let text = self.segments[index].clone();
            let use_raw = self.use_raw_prompts;

            tokio::spawn(async move {
                // Prompt construction always completes (or falls back)
                // before the image call is issued.
                let prompt = if use_raw {
                    raw_prompt(&text)
                } else if let Some(enricher) = &enricher {
                    enricher.enrich(config.as_deref(), &text, index).await
                } else {
                    build_prompt(config.as_deref(), &text, index)
                };

                let outcome = generate_with_timeout(provider.as_ref(), &prompt, &options).await;
                let _ = tx
                    .send(CompletionEvent {
                        index,
                        prompt,
                        outcome,
                    })
                    .await;
            });
        }

        // The channel closes once every spawned task has reported.
        drop(tx);

        while let Some(event) = rx.recv().await {
            self.record(event);
            on_progress(self.progress());
        }

        self.collected_results()
    }

    /// Regenerate one segment from a user-supplied prompt.
    ///
    /// The literal text becomes the prompt; builder and enricher are
    /// never consulted. Only this segment's state and result change.
    pub async fn edit(
        &mut self,
        index: usize,
        prompt_text: &str,
    ) -> Result<GenerationResult, RequestError> {
        if index >= self.segments.len() {
            return Err(RequestError::SegmentOutOfRange {
                index,
                total: self.segments.len(),
            });
        }

        self.segments[index] = prompt_text.to_string();
        self.states[index] = SegmentState::Generating;

        let prompt = raw_prompt(prompt_text);
        let outcome = generate_with_timeout(self.provider.as_ref(), &prompt, &self.options).await;
        Ok(self
            .record(CompletionEvent {
                index,
                prompt,
                outcome,
            })
            .clone())
    }

    /// Record a completion at its own index, masking provider errors.
    fn record(&mut self, event: CompletionEvent) -> &GenerationResult {
        let CompletionEvent {
            index,
            prompt,
            outcome,
        } = event;

        let result = match outcome {
            Ok(response) => {
                for warning in &response.warnings {
                    log::warn!("Provider warning for segment {index}: {warning}");
                }
                self.states[index] = SegmentState::Succeeded;
                GenerationResult {
                    segment_index: index,
                    image: Some(response.image_base64),
                    error: None,
                    prompt,
                }
            }
            Err(e) => {
                log::error!(
                    "Image generation failed for segment {index} [provider={}]: {e}",
                    self.provider.name()
                );
                self.states[index] = SegmentState::Failed;
                GenerationResult {
                    segment_index: index,
                    image: None,
                    error: Some(SEGMENT_FAILURE_MESSAGE.to_string()),
                    prompt,
                }
            }
        };

        self.results[index].insert(result)
    }

    pub fn progress(&self) -> RunProgress {
        let succeeded = self.success_count();
        let failed = self
            .states
            .iter()
            .filter(|s| **s == SegmentState::Failed)
            .count();
        RunProgress {
            total: self.segments.len(),
            completed: succeeded + failed,
            succeeded,
            failed,
        }
    }

    /// No segment left `Pending` or `Generating`.
    pub fn is_fully_generated(&self) -> bool {
        self.states
            .iter()
            .all(|s| matches!(s, SegmentState::Succeeded | SegmentState::Failed))
    }

    pub fn success_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == SegmentState::Succeeded)
            .count()
    }

    pub fn states(&self) -> &[SegmentState] {
        &self.states
    }

    /// Results ordered by segment index. Segments that never reported
    /// appear as masked failures.
    fn collected_results(&self) -> Vec<GenerationResult> {
        self.results
            .iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.clone().unwrap_or_else(|| GenerationResult {
                    segment_index: index,
                    image: None,
                    error: Some(SEGMENT_FAILURE_MESSAGE.to_string()),
                    prompt: String::new(),
                })
            })
            .collect()
    }
}

fn raw_prompt(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        EMPTY_SCENE_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

async fn generate_with_timeout(
    provider: &dyn ImageProvider,
    prompt: &str,
    options: &OrchestratorOptions,
) -> Result<ImageResponse, MediaError> {
    let dimensions = match provider.dimension_format() {
        DimensionFormat::Size => ImageDimensions::default_size(),
        DimensionFormat::AspectRatio => options
            .aspect_ratio
            .clone()
            .map(ImageDimensions::AspectRatio)
            .unwrap_or_else(ImageDimensions::default_aspect_ratio),
    };

    let request = ImageRequest {
        prompt: prompt.to_string(),
        dimensions,
        seed: options.seed,
        disable_watermark: true,
    };

    match tokio::time::timeout(options.timeout, provider.generate(request)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(MediaError::Timeout {
            seconds: options.timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use media_client::MockImageProvider;

    const IMAGE: &str = "aGVsbG8=";

    fn segments(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_segments_succeed() {
        let provider = Arc::new(MockImageProvider::always_succeeds(IMAGE));
        let mut orchestrator = SegmentOrchestrator::new(
            Arc::clone(&provider) as Arc<dyn ImageProvider>,
            segments(&["a street", "a door", "a river"]),
            OrchestratorOptions::default(),
        );

        let results = orchestrator.run(|_| {}).await;

        assert_eq!(results.len(), 3);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.segment_index, i);
            assert_eq!(result.image.as_deref(), Some(IMAGE));
            assert!(result.error.is_none());
        }
        assert!(orchestrator.is_fully_generated());
        assert_eq!(orchestrator.success_count(), 3);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_positional_integrity_with_one_failure() {
        let provider = Arc::new(
            MockImageProvider::always_succeeds(IMAGE).failing_on_prompt("the broken mill"),
        );
        let mut orchestrator = SegmentOrchestrator::new(
            Arc::clone(&provider) as Arc<dyn ImageProvider>,
            segments(&["a street", "a door", "the broken mill", "a river", "a field"]),
            OrchestratorOptions::default(),
        );

        let results = orchestrator.run(|_| {}).await;

        assert_eq!(results.len(), 5);
        for (i, result) in results.iter().enumerate() {
            assert_eq!(result.segment_index, i);
            if i == 2 {
                assert!(result.image.is_none());
                assert_eq!(result.error.as_deref(), Some(SEGMENT_FAILURE_MESSAGE));
            } else {
                assert!(result.image.is_some());
                assert!(result.error.is_none());
            }
        }
        assert_eq!(orchestrator.success_count(), 4);
        assert_eq!(orchestrator.states()[2], SegmentState::Failed);
    }

    #[tokio::test]
    async fn test_provider_error_is_masked() {
        let provider = Arc::new(MockImageProvider::always_fails(MediaError::ApiError {
            message: "secret internal detail".to_string(),
            status_code: Some(500),
        }));
        let mut orchestrator = SegmentOrchestrator::new(
            provider,
            segments(&["a street"]),
            OrchestratorOptions::default(),
        );

        let results = orchestrator.run(|_| {}).await;

        assert_eq!(results[0].error.as_deref(), Some(SEGMENT_FAILURE_MESSAGE));
        assert!(!results[0].error.as_deref().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn test_progress_callback_counts_completions() {
        let provider = Arc::new(MockImageProvider::always_succeeds(IMAGE));
        let mut orchestrator = SegmentOrchestrator::new(
            provider,
            segments(&["a", "b", "c", "d"]),
            OrchestratorOptions::default(),
        );

        let mut snapshots = Vec::new();
        orchestrator.run(|p| snapshots.push(p)).await;

        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots.last().map(|p| p.completed), Some(4));
        assert!(snapshots.iter().all(|p| p.total == 4));
    }

    #[tokio::test]
    async fn test_raw_prompts_bypass_builder() {
        let provider = Arc::new(MockImageProvider::always_succeeds(IMAGE));
        let mut orchestrator = SegmentOrchestrator::new(
            Arc::clone(&provider) as Arc<dyn ImageProvider>,
            segments(&["  literal prompt  "]),
            OrchestratorOptions::default(),
        )
        .with_raw_prompts(true);

        let results = orchestrator.run(|_| {}).await;

        assert_eq!(results[0].prompt, "literal prompt");
        assert_eq!(provider.prompts(), vec!["literal prompt".to_string()]);
    }

    #[tokio::test]
    async fn test_edit_uses_literal_prompt_each_time() {
        let provider = Arc::new(MockImageProvider::always_succeeds(IMAGE));
        let mut orchestrator = SegmentOrchestrator::new(
            Arc::clone(&provider) as Arc<dyn ImageProvider>,
            segments(&["first scene", "second scene"]),
            OrchestratorOptions::default(),
        );
        orchestrator.run(|_| {}).await;

        let first = orchestrator.edit(1, "a red lighthouse").await.unwrap();
        let second = orchestrator.edit(1, "a red lighthouse").await.unwrap();

        assert_eq!(first.prompt, "a red lighthouse");
        assert_eq!(second.prompt, "a red lighthouse");
        assert_eq!(first.segment_index, 1);

        // Two independent generation calls, both with the literal text.
        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 4);
        assert_eq!(prompts[2], "a red lighthouse");
        assert_eq!(prompts[3], "a red lighthouse");
        assert_eq!(orchestrator.states()[1], SegmentState::Succeeded);
    }

    #[tokio::test]
    async fn test_edit_without_prior_run() {
        // Single-segment regeneration from the CLI builds a fresh
        // orchestrator and calls edit directly; only that slot moves.
        let provider = Arc::new(MockImageProvider::always_succeeds(IMAGE));
        let mut orchestrator = SegmentOrchestrator::new(
            Arc::clone(&provider) as Arc<dyn ImageProvider>,
            segments(&["one", "two", "three"]),
            OrchestratorOptions::default(),
        );

        let result = orchestrator.edit(1, "a literal prompt").await.unwrap();

        assert_eq!(result.segment_index, 1);
        assert_eq!(result.prompt, "a literal prompt");
        assert_eq!(result.image.as_deref(), Some(IMAGE));
        assert_eq!(provider.prompts(), vec!["a literal prompt".to_string()]);
        assert_eq!(
            orchestrator.states(),
            &[
                SegmentState::Pending,
                SegmentState::Succeeded,
                SegmentState::Pending
            ]
        );
        assert!(!orchestrator.is_fully_generated());
    }

    #[tokio::test]
    async fn test_edit_out_of_range() {
        let provider = Arc::new(MockImageProvider::always_succeeds(IMAGE));
        let mut orchestrator = SegmentOrchestrator::new(
            provider,
            segments(&["only one"]),
            OrchestratorOptions::default(),
        );
        orchestrator.run(|_| {}).await;

        let err = orchestrator.edit(5, "new prompt").await.unwrap_err();
        assert!(matches!(
            err,
            RequestError::SegmentOutOfRange { index: 5, total: 1 }
        ));
    }

    #[tokio::test]
    async fn test_edit_empty_prompt_uses_placeholder() {
        let provider = Arc::new(MockImageProvider::always_succeeds(IMAGE));
        let mut orchestrator = SegmentOrchestrator::new(
            Arc::clone(&provider) as Arc<dyn ImageProvider>,
            segments(&["scene"]),
            OrchestratorOptions::default(),
        );
        orchestrator.run(|_| {}).await;

        let result = orchestrator.edit(0, "   ").await.unwrap();
        assert_eq!(result.prompt, EMPTY_SCENE_PLACEHOLDER);
    }

    struct SlowProvider {
        delay: Duration,
    }

    #[async_trait]
    impl ImageProvider for SlowProvider {
        async fn generate(&self, _request: ImageRequest) -> media_client::Result<ImageResponse> {
            tokio::time::sleep(self.delay).await;
            Ok(ImageResponse {
                image_base64: IMAGE.to_string(),
                warnings: Vec::new(),
            })
        }

        fn name(&self) -> &'static str {
            "slow"
        }

        fn dimension_format(&self) -> DimensionFormat {
            DimensionFormat::AspectRatio
        }

        fn is_available(&self) -> media_client::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_only_that_segment() {
        let provider = Arc::new(SlowProvider {
            delay: Duration::from_secs(120),
        });
        let mut orchestrator = SegmentOrchestrator::new(
            provider,
            segments(&["too slow"]),
            OrchestratorOptions::default(),
        );

        let results = orchestrator.run(|_| {}).await;

        assert_eq!(results[0].error.as_deref(), Some(SEGMENT_FAILURE_MESSAGE));
        assert_eq!(orchestrator.states()[0], SegmentState::Failed);
    }

    #[tokio::test]
    async fn test_seed_and_watermark_forwarded() {
        struct Capturing {
            seen: std::sync::Mutex<Vec<ImageRequest>>,
        }

        #[async_trait]
        impl ImageProvider for Capturing {
            async fn generate(&self, request: ImageRequest) -> media_client::Result<ImageResponse> {
                self.seen.lock().unwrap().push(request);
                Ok(ImageResponse {
                    image_base64: IMAGE.to_string(),
                    warnings: Vec::new(),
                })
            }

            fn name(&self) -> &'static str {
                "capturing"
            }

            fn dimension_format(&self) -> DimensionFormat {
                DimensionFormat::AspectRatio
            }

            fn is_available(&self) -> media_client::Result<()> {
                Ok(())
            }
        }

        let provider = Arc::new(Capturing {
            seen: std::sync::Mutex::new(Vec::new()),
        });
        let options = OrchestratorOptions {
            seed: Some(1234),
            aspect_ratio: Some("16:9".to_string()),
            ..OrchestratorOptions::default()
        };
        let mut orchestrator = SegmentOrchestrator::new(
            Arc::clone(&provider) as Arc<dyn ImageProvider>,
            segments(&["scene"]),
            options,
        );
        orchestrator.run(|_| {}).await;

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].seed, Some(1234));
        assert!(seen[0].disable_watermark);
        assert_eq!(
            seen[0].dimensions,
            ImageDimensions::AspectRatio("16:9".to_string())
        );
    }
}
