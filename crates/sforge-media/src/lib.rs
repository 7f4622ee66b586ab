//! FFmpeg CLI wrapper and rendering backends for the StoryForge pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - Progress parsing from `-progress pipe:2`
//! - Timeouts, with the encoder killed when a render is dropped
//! - FFprobe media inspection
//! - Gradient segment images rendered in-process
//! - Timeline planning (crossfades, title overlay) and rendering

pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod gradient;
pub mod probe;
pub mod progress;
pub mod render;
pub mod timeline;

pub use command::{
    check_ffmpeg, check_ffprobe, ffmpeg_binary, ffprobe_binary, FfmpegCommand, FfmpegRunner,
};
pub use error::{MediaError, MediaResult};
pub use gradient::{
    render_gradient, render_placeholder, write_gradient, write_placeholder, GradientSpec, Rgb8,
};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::{FfmpegProgress, ProgressCallback};
pub use render::{FfmpegRenderer, VideoRenderer};
pub use timeline::{Timeline, TimelineSegment, TitleOverlay, Transition};
