//! Narration track model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Synthesized speech audio for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationTrack {
    /// Audio file inside the run's temp area
    pub audio_path: PathBuf,
    /// Measured duration of the synthesized audio, in seconds rounded to whole milliseconds
    pub duration_secs: f64,
    /// Provider that produced the audio
    pub provider: String,
    /// Voice used
    pub voice: String,
}

impl NarrationTrack {
    /// Duration in whole milliseconds (rounded).
    pub fn duration_ms(&self) -> u64 {
        (self.duration_secs * 1000.0).round().max(0.0) as u64
    }
}

/// Outcome of a single provider attempt in the narration chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProviderAttempt {
    pub provider: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderAttempt {
    pub fn succeeded(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ok: true,
            error: None,
        }
    }

    pub fn failed(provider: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ok: false,
            error: Some(error.into()),
        }
    }
}
