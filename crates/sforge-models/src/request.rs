//! Generation request definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::Style;

/// Default target duration hint in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 60;
/// Default number of visual segments.
pub const DEFAULT_NUM_IMAGES: u32 = 3;
/// Default narration voice (Edge TTS voice name; its locale prefix drives the baseline engine).
pub const DEFAULT_VOICE: &str = "en-US-GuyNeural";

/// Errors raised while parsing or validating a request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Malformed request: {0}")]
    Malformed(String),

    #[error("Either 'topic' or 'script' must be provided")]
    MissingSource,

    #[error("Provide only one of 'topic' or 'script', not both")]
    ConflictingSource,

    #[error("Invalid request: {0}")]
    Invalid(String),
}

/// Outer envelope delivered by the invocation transport.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RequestEnvelope {
    pub input: GenerationRequest,
}

impl RequestEnvelope {
    /// Parse an envelope from raw JSON.
    ///
    /// A health-check envelope is recognized before the typed parse, so
    /// malformed generation fields cannot fail it.
    pub fn from_json(raw: &str) -> Result<Self, RequestError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| RequestError::Malformed(e.to_string()))?;

        if value["input"]["mode"].as_str().is_some_and(is_test_mode) {
            return Ok(Self {
                input: GenerationRequest::health_check(),
            });
        }

        serde_json::from_value(value).map_err(|e| RequestError::Malformed(e.to_string()))
    }
}

/// One invocation's input.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct GenerationRequest {
    /// `"test"` requests the health response
    #[serde(default)]
    pub mode: Option<String>,

    /// Topic to write a script about (XOR with `script`)
    #[serde(default)]
    pub topic: Option<String>,

    /// Caller-supplied narration text (XOR with `topic`)
    #[serde(default)]
    pub script: Option<String>,

    /// Explicit title; derived from the script when absent
    #[serde(default)]
    pub title: Option<String>,

    /// Unknown, null or non-string values fall back to the default style
    #[serde(default, deserialize_with = "lenient_style")]
    pub style: Style,

    /// Target duration in seconds. Advisory: the final length follows the narration.
    #[serde(default = "default_duration")]
    #[validate(range(min = 5, max = 300))]
    pub duration: u32,

    /// Number of visual segments
    #[serde(default = "default_num_images")]
    #[validate(range(min = 1, max = 20))]
    pub num_images: u32,

    /// Voice name / locale hint for narration
    #[serde(default)]
    pub voice: Option<String>,
}

fn lenient_style<'de, D>(deserializer: D) -> Result<Style, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .map(Style::parse_lossy)
        .unwrap_or_default())
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_SECS
}

fn default_num_images() -> u32 {
    DEFAULT_NUM_IMAGES
}

/// Where the narration text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Topic(String),
    Script(String),
}

impl GenerationRequest {
    /// Create a topic request with default settings.
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::empty()
        }
    }

    /// Create a script request with default settings.
    pub fn for_script(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            ..Self::empty()
        }
    }

    /// Create a health-check request.
    pub fn health_check() -> Self {
        Self {
            mode: Some("test".to_string()),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            mode: None,
            topic: None,
            script: None,
            title: None,
            style: Style::default(),
            duration: DEFAULT_DURATION_SECS,
            num_images: DEFAULT_NUM_IMAGES,
            voice: None,
        }
    }

    /// Whether this is a health-check invocation.
    pub fn is_test_mode(&self) -> bool {
        self.mode.as_deref().is_some_and(is_test_mode)
    }

    /// Voice hint, or the default voice.
    pub fn voice(&self) -> &str {
        self.voice
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_VOICE)
    }

    /// Explicit title if non-blank.
    pub fn title(&self) -> Option<&str> {
        non_blank(&self.title)
    }

    /// Resolve the script source. Blank strings count as absent.
    pub fn source(&self) -> Result<ScriptSource, RequestError> {
        match (non_blank(&self.topic), non_blank(&self.script)) {
            (Some(topic), None) => Ok(ScriptSource::Topic(topic.to_string())),
            (None, Some(script)) => Ok(ScriptSource::Script(script.to_string())),
            (Some(_), Some(_)) => Err(RequestError::ConflictingSource),
            (None, None) => Err(RequestError::MissingSource),
        }
    }

    /// Full validation for a generation run (not called for test mode).
    pub fn validate_for_generation(&self) -> Result<ScriptSource, RequestError> {
        let source = self.source()?;
        self.validate()
            .map_err(|e| RequestError::Invalid(e.to_string()))?;
        Ok(source)
    }
}

fn is_test_mode(mode: &str) -> bool {
    mode.trim().eq_ignore_ascii_case("test")
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
