//! Pipeline error types.

use thiserror::Error;

use sforge_media::MediaError;
use sforge_models::{ErrorKind, ErrorResponse, PipelineStage, RequestError};
use sforge_speech::SpeechError;
use sforge_storage::StorageError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Fatal run failure, tagged with where it happened.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}{}: {message}", stage_suffix(.stage))]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub stage: Option<PipelineStage>,
    pub message: String,
}

impl PipelineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: None,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InputError, message)
    }

    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SynthesisError, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RenderError, message)
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PublishError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TimeoutError, message)
    }

    /// Attach the stage unless one is already recorded.
    pub fn at(mut self, stage: PipelineStage) -> Self {
        self.stage.get_or_insert(stage);
        self
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse::new(self.kind, self.message.clone(), self.stage)
    }
}

fn stage_suffix(stage: &Option<PipelineStage>) -> String {
    stage
        .map(|s| format!(" during {}", s))
        .unwrap_or_default()
}

impl From<RequestError> for PipelineError {
    fn from(e: RequestError) -> Self {
        Self::input(e.to_string())
    }
}

impl From<SpeechError> for PipelineError {
    fn from(e: SpeechError) -> Self {
        match e {
            SpeechError::Timeout(_) => Self::timeout(e.to_string()),
            SpeechError::Exhausted { ref attempts } => {
                let detail: Vec<String> = attempts
                    .iter()
                    .map(|a| {
                        format!(
                            "{}: {}",
                            a.provider,
                            a.error.as_deref().unwrap_or("unknown error")
                        )
                    })
                    .collect();
                if detail.is_empty() {
                    Self::synthesis("no narration provider is available")
                } else {
                    Self::synthesis(format!("{} ({})", e, detail.join("; ")))
                }
            }
            other => Self::synthesis(other.to_string()),
        }
    }
}

impl From<MediaError> for PipelineError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Timeout(_) => Self::timeout(e.to_string()),
            other => Self::render(other.to_string()),
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(e: StorageError) -> Self {
        Self::publish(e.to_string())
    }
}
