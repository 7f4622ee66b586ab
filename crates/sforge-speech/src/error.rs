//! Speech synthesis errors.

use sforge_media::MediaError;
use sforge_models::ProviderAttempt;
use thiserror::Error;

pub type SpeechResult<T> = Result<T, SpeechError>;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Nothing to narrate")]
    EmptyText,

    #[error("{engine} failed: {message}")]
    EngineFailed { engine: String, message: String },

    #[error("Synthesized audio has unusable duration {0}")]
    InvalidDuration(f64),

    #[error("Synthesis timed out after {0} seconds")]
    Timeout(u64),

    #[error("All narration providers failed ({} attempted)", attempts.len())]
    Exhausted { attempts: Vec<ProviderAttempt> },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    pub fn engine_failed(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EngineFailed {
            engine: engine.into(),
            message: message.into(),
        }
    }

    /// Attempts recorded before the chain gave up, if any.
    pub fn attempts(&self) -> &[ProviderAttempt] {
        match self {
            Self::Exhausted { attempts } => attempts,
            _ => &[],
        }
    }
}
