//! Worker response schemas.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{
    Capabilities, FeatureFlags, PipelineStage, ProviderAttempt, Script, ScriptOrigin, UploadResult,
};

/// Version reported by the health check.
pub const HEALTH_VERSION: &str = "2.0";

/// Error taxonomy surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ErrorKind {
    /// Missing or contradictory request fields
    InputError,
    /// Every narration provider failed
    SynthesisError,
    /// Compositing or encoding failed
    RenderError,
    /// Storage unavailable or upload failed (non-fatal)
    PublishError,
    /// A stage exceeded its allotted time
    TimeoutError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputError => "InputError",
            ErrorKind::SynthesisError => "SynthesisError",
            ErrorKind::RenderError => "RenderError",
            ErrorKind::PublishError => "PublishError",
            ErrorKind::TimeoutError => "TimeoutError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StageTiming {
    pub stage: PipelineStage,
    pub elapsed_ms: u64,
}

/// Non-fatal run details attached to a success response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostics {
    pub run_id: String,
    /// Where the narrated script came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_origin: Option<ScriptOrigin>,
    /// Provider that produced the narration
    pub narration_provider: Option<String>,
    /// Every narration provider attempt, in chain order
    pub attempts: Vec<ProviderAttempt>,
    /// Indices of segments that fell back to a solid placeholder
    pub placeholders: Vec<usize>,
    /// Human-readable non-fatal issues (publish degradation, duration drift)
    pub warnings: Vec<String>,
    pub stages: Vec<StageTiming>,
}

impl Diagnostics {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            ..Default::default()
        }
    }

    /// Record a non-fatal error.
    pub fn warn(&mut self, kind: ErrorKind, message: impl AsRef<str>) {
        self.warnings.push(format!("{}: {}", kind, message.as_ref()));
    }
}

/// Successful generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SuccessResponse {
    pub status: ResponseStatus,
    pub title: String,
    pub script: String,
    pub hashtags: Vec<String>,
    pub cta: String,
    pub video_url: Option<String>,
    pub local_path: Option<String>,
    pub degraded: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub num_images: u32,
    pub diagnostics: Diagnostics,
}

impl SuccessResponse {
    pub fn new(
        script: &Script,
        upload: &UploadResult,
        duration_seconds: f64,
        num_images: u32,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            status: ResponseStatus::Success,
            title: script.title.clone(),
            script: script.body.clone(),
            hashtags: script.hashtags.clone(),
            cta: script.cta.clone(),
            video_url: upload.video_url().map(str::to_string),
            local_path: upload
                .local_path()
                .map(|p| p.to_string_lossy().to_string()),
            degraded: upload.is_degraded(),
            expires_at: upload.expires_at(),
            duration_seconds,
            num_images,
            diagnostics,
        }
    }
}

/// `mode=test` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: ResponseStatus,
    pub message: String,
    pub version: String,
    pub features: FeatureFlags,
}

impl HealthResponse {
    pub fn from_capabilities(capabilities: &Capabilities) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: "StoryForge worker is ready".to_string(),
            version: HEALTH_VERSION.to_string(),
            features: capabilities.features(),
        }
    }
}

/// Fatal failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub status: ResponseStatus,
    pub error: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
}

impl ErrorResponse {
    pub fn new(error: ErrorKind, message: impl Into<String>, stage: Option<PipelineStage>) -> Self {
        Self {
            status: ResponseStatus::Error,
            error,
            message: message.into(),
            stage,
        }
    }
}

/// Any response the worker can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum WorkerResponse {
    Success(SuccessResponse),
    Health(HealthResponse),
    Error(ErrorResponse),
}

impl WorkerResponse {
    pub fn is_success(&self) -> bool {
        !matches!(self, WorkerResponse::Error(_))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
