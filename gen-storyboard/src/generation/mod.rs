//! Generation run orchestration and boundary types.

pub mod orchestrator;
pub mod request;

pub use orchestrator::{
    GENERATION_TIMEOUT_SECS, OrchestratorOptions, RunProgress, SEGMENT_FAILURE_MESSAGE,
    SegmentOrchestrator, SegmentState,
};
pub use request::{
    GenerateRequest, GenerateResponse, GenerationResult, RequestError, SUPPORTED_ASPECT_RATIOS,
};
