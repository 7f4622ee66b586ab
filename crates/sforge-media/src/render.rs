//! Rendering backends.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use sforge_models::VideoArtifact;

use crate::command::FfmpegRunner;
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::move_into_dir;
use crate::probe::probe_media;
use crate::timeline::Timeline;

/// Rendered duration may differ from the narration by this much before we warn.
pub const DURATION_DRIFT_TOLERANCE_SECS: f64 = 0.1;

/// Turns a planned timeline into a finished video file.
#[async_trait]
pub trait VideoRenderer: Send + Sync {
    /// Render `timeline` inside `work_dir`, then move the result into
    /// `output_dir` as `file_name`.
    async fn render(
        &self,
        timeline: &Timeline,
        work_dir: &Path,
        output_dir: &Path,
        file_name: &str,
    ) -> MediaResult<VideoArtifact>;

    fn name(&self) -> &'static str;
}

/// Renderer backed by the ffmpeg CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRenderer {
    timeout_secs: Option<u64>,
}

impl FfmpegRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn runner(&self) -> FfmpegRunner {
        let runner = FfmpegRunner::new();
        match self.timeout_secs {
            Some(secs) => runner.with_timeout(secs),
            None => runner,
        }
    }
}

#[async_trait]
impl VideoRenderer for FfmpegRenderer {
    async fn render(
        &self,
        timeline: &Timeline,
        work_dir: &Path,
        output_dir: &Path,
        file_name: &str,
    ) -> MediaResult<VideoArtifact> {
        for segment in &timeline.segments {
            if !segment.asset.image_path.exists() {
                return Err(MediaError::FileNotFound(segment.asset.image_path.clone()));
            }
        }
        if !timeline.audio_path.exists() {
            return Err(MediaError::FileNotFound(timeline.audio_path.clone()));
        }

        let staged = work_dir.join(file_name);
        let cmd = timeline.to_command(&staged);

        info!(
            segments = timeline.segments.len(),
            duration_secs = timeline.duration_secs,
            crossfade_secs = timeline.crossfade_secs,
            "Rendering timeline"
        );

        let total = timeline.duration_secs;
        let last_decile = Arc::new(AtomicU32::new(0));
        self.runner()
            .run_with_progress(&cmd, move |progress| {
                let decile = u32::from(progress.percent_of(total)) / 10;
                if decile > last_decile.swap(decile, Ordering::Relaxed) {
                    debug!("Render progress: {}%", decile * 10);
                }
            })
            .await?;

        if !staged.exists() {
            return Err(MediaError::ffmpeg_failed(
                "FFmpeg reported success but produced no output",
                None,
                None,
            ));
        }

        let info = probe_media(&staged).await?;
        let drift = (info.duration - timeline.duration_secs).abs();
        if drift > DURATION_DRIFT_TOLERANCE_SECS {
            warn!(
                rendered = info.duration,
                narration = timeline.duration_secs,
                "Rendered duration drifts from narration by {:.3}s",
                drift
            );
        }

        let path = move_into_dir(&staged, output_dir).await?;

        Ok(VideoArtifact {
            path,
            duration_secs: timeline.duration_secs,
            width: if info.width > 0 { info.width } else { timeline.width },
            height: if info.height > 0 { info.height } else { timeline.height },
            fps: timeline.fps,
            video_codec: info
                .video_codec
                .unwrap_or_else(|| timeline.encoding.codec.clone()),
            audio_codec: info
                .audio_codec
                .unwrap_or_else(|| timeline.encoding.audio_codec.clone()),
            size_bytes: info.size,
        })
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
