//! Rendered artifact and publication outcome.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rendered output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VideoArtifact {
    /// Final location in the output directory
    pub path: PathBuf,
    /// Total duration in seconds (equals the narration duration)
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub video_codec: String,
    pub audio_codec: String,
    /// File size in bytes
    pub size_bytes: u64,
}

impl VideoArtifact {
    /// File name component of the artifact path.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "video.mp4".to_string())
    }
}

/// Publication outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UploadResult {
    /// Uploaded and signed
    Remote {
        url: String,
        expires_at: DateTime<Utc>,
        key: String,
    },
    /// Storage unavailable or upload failed; artifact kept locally
    Local { local_path: PathBuf },
}

impl UploadResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self, UploadResult::Local { .. })
    }

    pub fn video_url(&self) -> Option<&str> {
        match self {
            UploadResult::Remote { url, .. } => Some(url),
            UploadResult::Local { .. } => None,
        }
    }

    pub fn local_path(&self) -> Option<&PathBuf> {
        match self {
            UploadResult::Remote { .. } => None,
            UploadResult::Local { local_path } => Some(local_path),
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            UploadResult::Remote { expires_at, .. } => Some(*expires_at),
            UploadResult::Local { .. } => None,
        }
    }
}
