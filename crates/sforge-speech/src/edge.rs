//! Edge TTS engine (the `edge-tts` command line tool).

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use sforge_media::probe_duration;

use crate::engine::{SpeechEngine, SynthesizedAudio};
use crate::error::{SpeechError, SpeechResult};
use crate::voice::edge_voice;

/// Environment variable overriding the edge-tts binary.
pub const EDGE_TTS_BINARY_ENV: &str = "EDGE_TTS_BINARY";

/// Bytes of stderr kept in error messages.
const STDERR_LIMIT: usize = 500;

/// Configured edge-tts binary (name or absolute path).
pub fn edge_tts_binary() -> PathBuf {
    std::env::var(EDGE_TTS_BINARY_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("edge-tts"))
}

#[derive(Debug, Clone)]
pub struct EdgeTtsEngine {
    binary: PathBuf,
}

impl Default for EdgeTtsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeTtsEngine {
    pub fn new() -> Self {
        Self {
            binary: edge_tts_binary(),
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Whether the binary resolves.
    pub fn is_available(&self) -> bool {
        which::which(&self.binary).is_ok()
    }

    fn args(text: &str, voice: &str, output: &Path) -> Vec<String> {
        vec![
            "--voice".to_string(),
            edge_voice(voice),
            // Joined so text starting with '-' is never read as an option.
            format!("--text={}", text),
            "--write-media".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

#[async_trait]
impl SpeechEngine for EdgeTtsEngine {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        output: &Path,
    ) -> SpeechResult<SynthesizedAudio> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        let binary = which::which(&self.binary)
            .map_err(|_| SpeechError::EngineUnavailable(self.binary.display().to_string()))?;

        debug!(voice = %edge_voice(voice), chars = text.len(), "Running edge-tts");

        let result = Command::new(binary)
            .args(Self::args(text, voice, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stderr: String = stderr.trim().chars().take(STDERR_LIMIT).collect();
            return Err(SpeechError::engine_failed(
                self.name(),
                format!("exit {:?}: {}", result.status.code(), stderr),
            ));
        }
        if !output.exists() {
            return Err(SpeechError::engine_failed(self.name(), "no audio written"));
        }

        let duration_secs = probe_duration(output).await?;
        Ok(SynthesizedAudio {
            path: output.to_path_buf(),
            duration_secs,
        })
    }

    fn name(&self) -> &'static str {
        "edge_tts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = EdgeTtsEngine::args("Hello there.", "pt-BR", Path::new("/tmp/n.mp3"));
        assert_eq!(
            args,
            vec![
                "--voice",
                "pt-BR-AntonioNeural",
                "--text=Hello there.",
                "--write-media",
                "/tmp/n.mp3"
            ]
        );
    }

    #[test]
    fn test_args_keep_dash_prefixed_text_as_value() {
        let args = EdgeTtsEngine::args("-40 degrees", "en-US-GuyNeural", Path::new("/tmp/n.mp3"));
        assert_eq!(args[2], "--text=-40 degrees");
        assert!(!args.iter().any(|a| a == "-40 degrees"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let engine = EdgeTtsEngine::with_binary("/nonexistent/edge-tts");
        assert!(!engine.is_available());
        let err = engine
            .synthesize("Hello.", "en-US-GuyNeural", Path::new("/tmp/unused.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::EngineUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let engine = EdgeTtsEngine::with_binary("/nonexistent/edge-tts");
        let err = engine
            .synthesize("  ", "en-US-GuyNeural", Path::new("/tmp/unused.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::EmptyText));
    }
}
