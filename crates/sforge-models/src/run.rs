//! Run identity and pipeline stages.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RunId(pub String);

impl RunId {
    /// Generate a new random run ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orchestrator states. `Failed` is reachable from every other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    Scripting,
    Narrating,
    GeneratingVisuals,
    Composing,
    Publishing,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Scripting => "scripting",
            PipelineStage::Narrating => "narrating",
            PipelineStage::GeneratingVisuals => "generating_visuals",
            PipelineStage::Composing => "composing",
            PipelineStage::Publishing => "publishing",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }

    /// The state that follows on success. Terminal states return `None`.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Validating => Some(PipelineStage::Scripting),
            PipelineStage::Scripting => Some(PipelineStage::Narrating),
            PipelineStage::Narrating => Some(PipelineStage::GeneratingVisuals),
            PipelineStage::GeneratingVisuals => Some(PipelineStage::Composing),
            PipelineStage::Composing => Some(PipelineStage::Publishing),
            PipelineStage::Publishing => Some(PipelineStage::Done),
            PipelineStage::Done | PipelineStage::Failed => None,
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_is_strictly_forward() {
        let mut stage = PipelineStage::Validating;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(
            visited,
            vec![
                PipelineStage::Validating,
                PipelineStage::Scripting,
                PipelineStage::Narrating,
                PipelineStage::GeneratingVisuals,
                PipelineStage::Composing,
                PipelineStage::Publishing,
                PipelineStage::Done,
            ]
        );
        assert!(PipelineStage::Failed.next().is_none());
    }

    #[test]
    fn test_run_id_unique() {
        assert_ne!(RunId::new(), RunId::new());
    }
}
