//! Concrete providers the production chain is built from.

use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

use crate::edge::EdgeTtsEngine;
use crate::engine::{SpeechEngine, SynthesizedAudio};
use crate::error::SpeechResult;
use crate::google::GoogleTtsEngine;

#[derive(Debug, Clone)]
pub enum NarrationProvider {
    /// Premium neural voices
    EdgeTts(EdgeTtsEngine),
    /// Baseline voice over HTTP
    GoogleTts(GoogleTtsEngine),
}

impl NarrationProvider {
    /// Premium first, then baseline, keeping only the available ones.
    pub fn chain(premium_available: bool, baseline_available: bool) -> Vec<Self> {
        let mut chain = Vec::with_capacity(2);
        if premium_available {
            chain.push(Self::EdgeTts(EdgeTtsEngine::new()));
        }
        if baseline_available {
            match GoogleTtsEngine::new() {
                Ok(engine) => chain.push(Self::GoogleTts(engine)),
                Err(e) => warn!(error = %e, "Baseline speech engine disabled: HTTP client setup failed"),
            }
        }
        chain
    }
}

#[async_trait]
impl SpeechEngine for NarrationProvider {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> SpeechResult<SynthesizedAudio> {
        match self {
            Self::EdgeTts(engine) => engine.synthesize(text, voice, output).await,
            Self::GoogleTts(engine) => engine.synthesize(text, voice, output).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::EdgeTts(engine) => engine.name(),
            Self::GoogleTts(engine) => engine.name(),
        }
    }
}
