//! Script style definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Narrative style of a generated video.
///
/// Unknown style names deserialize to [`Style::Viral`] instead of failing the
/// request.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Style {
    /// Punchy hook-first short with engagement CTA
    #[default]
    Viral,
    /// Explainer with numbered points
    Educational,
    /// Narrative arc with a twist ending
    Story,
}

impl Style {
    /// All available styles.
    pub const ALL: &'static [Style] = &[Style::Viral, Style::Educational, Style::Story];

    /// Style name as used in filenames and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Viral => "viral",
            Style::Educational => "educational",
            Style::Story => "story",
        }
    }

    /// Parse a style name, falling back to `Viral` for anything unrecognized.
    pub fn parse_lossy(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Style {
    type Err = StyleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "viral" => Ok(Style::Viral),
            "educational" => Ok(Style::Educational),
            "story" => Ok(Style::Story),
            _ => Err(StyleParseError(s.to_string())),
        }
    }
}

impl From<String> for Style {
    fn from(s: String) -> Self {
        Style::parse_lossy(&s)
    }
}

#[derive(Debug, Error)]
#[error("Unknown style: {0}")]
pub struct StyleParseError(String);
