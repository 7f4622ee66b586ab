//! Synthesized script model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Style;

/// Where the body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScriptOrigin {
    /// Style template filled in with the topic
    Topic,
    /// Written by the script model from the topic
    Model,
    /// Supplied by the caller
    User,
}

/// Structured narrative driving one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Script {
    /// On-screen title
    pub title: String,
    /// Narration text
    pub body: String,
    /// Opening line of the narration
    pub hook: String,
    /// Ordered hashtags, each starting with `#`
    pub hashtags: Vec<String>,
    /// Call-to-action line
    pub cta: String,
    pub style: Style,
    pub origin: ScriptOrigin,
}

impl Script {
    /// Number of whitespace-separated words in the body.
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }
}
