//! Shared data models for the StoryForge pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Generation requests and their validation
//! - Script styles and synthesized scripts
//! - Narration tracks, visual segments and rendered artifacts
//! - Publication outcomes and worker responses
//! - The process-wide capability snapshot

pub mod artifact;
pub mod capability;
pub mod encoding;
pub mod narration;
pub mod request;
pub mod response;
pub mod run;
pub mod script;
pub mod style;
pub mod visual;

// Re-export common types
pub use artifact::{UploadResult, VideoArtifact};
pub use capability::{Capabilities, Capability, FeatureFlags};
pub use encoding::{EncodingConfig, OUTPUT_FPS, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use narration::{NarrationTrack, ProviderAttempt};
pub use request::{GenerationRequest, RequestEnvelope, RequestError, ScriptSource};
pub use response::{
    Diagnostics, ErrorKind, ErrorResponse, HealthResponse, StageTiming, SuccessResponse,
    WorkerResponse,
};
pub use run::{PipelineStage, RunId};
pub use script::{Script, ScriptOrigin};
pub use style::Style;
pub use visual::{partition_duration, TimeSlice, VisualAsset};
