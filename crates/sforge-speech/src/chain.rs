//! Ordered provider chain.
//!
//! Providers are tried strictly in order. Each attempt gets its own output
//! file and timeout; the first attempt that yields audio with a positive,
//! finite measured duration wins.

use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use sforge_models::{NarrationTrack, ProviderAttempt};

use crate::engine::SpeechEngine;
use crate::error::{SpeechError, SpeechResult};
use crate::provider::NarrationProvider;

/// Successful chain run.
#[derive(Debug, Clone)]
pub struct Narration {
    pub track: NarrationTrack,
    /// Every attempt in chain order, the last one successful
    pub attempts: Vec<ProviderAttempt>,
}

pub struct NarrationChain<E: SpeechEngine = NarrationProvider> {
    engines: Vec<E>,
    attempt_timeout: Duration,
}

impl<E: SpeechEngine> NarrationChain<E> {
    pub fn new(engines: Vec<E>, attempt_timeout: Duration) -> Self {
        Self {
            engines,
            attempt_timeout,
        }
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    /// Narrate `text`, writing attempt files into `work_dir`.
    pub async fn synthesize(&self, text: &str, voice: &str, work_dir: &Path) -> SpeechResult<Narration> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }

        let mut attempts = Vec::with_capacity(self.engines.len());

        for engine in &self.engines {
            let name = engine.name();
            let output = work_dir.join(format!("narration_{}.mp3", name));

            let result =
                match tokio::time::timeout(self.attempt_timeout, engine.synthesize(text, voice, &output))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(SpeechError::Timeout(self.attempt_timeout.as_secs())),
                };

            // Timing downstream is in whole milliseconds, so the track is too.
            let result = result.and_then(|mut audio| {
                let rounded = round_to_millis(audio.duration_secs);
                if rounded.is_finite() && rounded > 0.0 {
                    audio.duration_secs = rounded;
                    Ok(audio)
                } else {
                    Err(SpeechError::InvalidDuration(audio.duration_secs))
                }
            });

            match result {
                Ok(audio) => {
                    info!(
                        provider = name,
                        duration_secs = audio.duration_secs,
                        "Narration synthesized"
                    );
                    attempts.push(ProviderAttempt::succeeded(name));
                    return Ok(Narration {
                        track: NarrationTrack {
                            audio_path: audio.path,
                            duration_secs: audio.duration_secs,
                            provider: name.to_string(),
                            voice: voice.to_string(),
                        },
                        attempts,
                    });
                }
                Err(e) => {
                    warn!(provider = name, error = %e, "Narration provider failed");
                    attempts.push(ProviderAttempt::failed(name, e.to_string()));
                    let _ = tokio::fs::remove_file(&output).await;
                }
            }
        }

        Err(SpeechError::Exhausted { attempts })
    }
}

fn round_to_millis(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
