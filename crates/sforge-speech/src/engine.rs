//! The contract every narration provider implements.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::SpeechResult;

/// Audio written by an engine, with its measured length.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub path: PathBuf,
    pub duration_secs: f64,
}

/// Text-to-speech engine.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Synthesize `text` with `voice` into `output`.
    ///
    /// The returned duration must be measured from the written file.
    async fn synthesize(&self, text: &str, voice: &str, output: &Path)
        -> SpeechResult<SynthesizedAudio>;

    /// Provider name reported in diagnostics.
    fn name(&self) -> &'static str;
}
