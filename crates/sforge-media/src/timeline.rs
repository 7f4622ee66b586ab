//! Composition plan: segment order, transitions, title overlay and the
//! filter graph that realizes them.
//!
//! Every segment except the last is looped for `duration + crossfade`. With
//! that padding each `xfade` offset lands exactly on the next segment's start
//! time and the chained output is as long as the narration.

use std::path::{Path, PathBuf};

use sforge_models::encoding::DEFAULT_CROSSFADE_SECS;
use sforge_models::{
    EncodingConfig, NarrationTrack, VisualAsset, OUTPUT_FPS, OUTPUT_HEIGHT, OUTPUT_WIDTH,
};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filters::{
    filter_drawtext_title, filter_fade_in, filter_fade_out, filter_portrait_fit, filter_xfade,
};

/// Output label of the finished video chain.
const VIDEO_OUT: &str = "vout";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    Cut,
    FadeFromBlack { duration: f64 },
    FadeToBlack { duration: f64 },
    Crossfade { duration: f64 },
}

impl Transition {
    pub fn duration(&self) -> f64 {
        match self {
            Transition::Cut => 0.0,
            Transition::FadeFromBlack { duration }
            | Transition::FadeToBlack { duration }
            | Transition::Crossfade { duration } => *duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSegment {
    pub asset: VisualAsset,
    pub transition_in: Transition,
    pub transition_out: Transition,
    /// Length of the looped input stream
    pub input_secs: f64,
}

/// Stroked title text.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleOverlay {
    pub text: String,
    pub font_size: u32,
    pub border_width: u32,
    /// Show only for the first `lead_secs`; `None` shows it throughout.
    pub lead_secs: Option<f64>,
    pub font_path: Option<PathBuf>,
}

impl TitleOverlay {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 72,
            border_width: 5,
            lead_secs: None,
            font_path: None,
        }
    }

    pub fn with_lead(mut self, secs: Option<f64>) -> Self {
        self.lead_secs = secs.filter(|s| s.is_finite() && *s > 0.0);
        self
    }

    pub fn with_font(mut self, path: Option<PathBuf>) -> Self {
        self.font_path = path;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Timeline {
    pub segments: Vec<TimelineSegment>,
    pub title: Option<TitleOverlay>,
    pub audio_path: PathBuf,
    pub duration_secs: f64,
    pub crossfade_secs: f64,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub encoding: EncodingConfig,
}

impl Timeline {
    /// Plan a timeline over `assets`, which must partition the narration in
    /// index order.
    pub fn plan(
        mut assets: Vec<VisualAsset>,
        narration: &NarrationTrack,
        title: Option<TitleOverlay>,
    ) -> MediaResult<Self> {
        if assets.is_empty() {
            return Err(MediaError::invalid_timeline("no visual segments"));
        }
        assets.sort_by_key(|a| a.index);

        let total_ms = narration.duration_ms();
        if total_ms == 0 {
            return Err(MediaError::invalid_timeline("narration has zero duration"));
        }

        let mut expected_start = 0;
        for asset in &assets {
            if asset.slice.start_ms != expected_start || asset.slice.duration_ms() == 0 {
                return Err(MediaError::invalid_timeline(format!(
                    "segment {} does not continue the timeline at {}ms",
                    asset.index, expected_start
                )));
            }
            expected_start = asset.slice.end_ms;
        }
        if expected_start != total_ms {
            return Err(MediaError::invalid_timeline(format!(
                "segments cover {}ms but narration is {}ms",
                expected_start, total_ms
            )));
        }

        let shortest = assets
            .iter()
            .map(VisualAsset::duration)
            .fold(f64::INFINITY, f64::min);
        let crossfade_secs = clamp_crossfade(DEFAULT_CROSSFADE_SECS, shortest);

        let count = assets.len();
        let segments = assets
            .into_iter()
            .enumerate()
            .map(|(i, asset)| {
                let transition_in = if i == 0 {
                    Transition::FadeFromBlack { duration: crossfade_secs }
                } else {
                    Transition::Crossfade { duration: crossfade_secs }
                };
                let (transition_out, input_secs) = if i + 1 == count {
                    (
                        Transition::FadeToBlack { duration: crossfade_secs },
                        asset.duration(),
                    )
                } else {
                    (
                        Transition::Crossfade { duration: crossfade_secs },
                        asset.duration() + crossfade_secs,
                    )
                };
                TimelineSegment {
                    asset,
                    transition_in,
                    transition_out,
                    input_secs,
                }
            })
            .collect();

        Ok(Self {
            segments,
            title,
            audio_path: narration.audio_path.clone(),
            duration_secs: total_ms as f64 / 1000.0,
            crossfade_secs,
            width: OUTPUT_WIDTH,
            height: OUTPUT_HEIGHT,
            fps: OUTPUT_FPS,
            encoding: EncodingConfig::default(),
        })
    }

    /// Offsets of each `xfade` stage, one per internal boundary.
    pub fn xfade_offsets(&self) -> Vec<f64> {
        self.segments
            .iter()
            .skip(1)
            .map(|s| s.asset.start_time())
            .collect()
    }

    /// Build the `-filter_complex` graph. Inputs `0..n` are the images.
    pub fn filter_graph(&self) -> String {
        let fit = filter_portrait_fit(self.width, self.height, self.fps);
        let mut chains: Vec<String> = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, _)| format!("[{}:v]{}[v{}]", i, fit, i))
            .collect();

        let mut last = "v0".to_string();
        for (k, offset) in self.xfade_offsets().into_iter().enumerate() {
            let out = format!("x{}", k + 1);
            chains.push(filter_xfade(
                &last,
                &format!("v{}", k + 1),
                self.crossfade_secs,
                offset,
                &out,
            ));
            last = out;
        }

        let mut finish = vec![
            filter_fade_in(self.crossfade_secs),
            filter_fade_out(self.duration_secs - self.crossfade_secs, self.crossfade_secs),
        ];
        if let Some(title) = self.title.as_ref().filter(|t| !t.text.trim().is_empty()) {
            finish.push(filter_drawtext_title(
                &title.text,
                title.font_size,
                title.border_width,
                title.lead_secs.map(|lead| lead.min(self.duration_secs)),
                title.font_path.as_deref(),
            ));
        }
        chains.push(format!("[{}]{}[{}]", last, finish.join(","), VIDEO_OUT));

        chains.join(";")
    }

    /// Full ffmpeg invocation writing to `output`.
    pub fn to_command(&self, output: impl AsRef<Path>) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::with_output(output);
        for segment in &self.segments {
            cmd = cmd.looped_image(&segment.asset.image_path, segment.input_secs, self.fps);
        }
        let audio_index = cmd.input_count();

        cmd.input(&self.audio_path)
            .filter_complex(self.filter_graph())
            .map(format!("[{}]", VIDEO_OUT))
            .map(format!("{}:a", audio_index))
            .output_args(self.encoding.to_ffmpeg_args())
            .frame_rate(self.fps)
            .duration(self.duration_secs)
            .faststart()
    }
}

/// Crossfade may take at most half of the shortest segment.
fn clamp_crossfade(requested: f64, shortest_segment: f64) -> f64 {
    requested.min(shortest_segment / 2.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sforge_models::partition_duration;

    fn narration(secs: f64) -> NarrationTrack {
        NarrationTrack {
            audio_path: PathBuf::from("/tmp/run/narration.mp3"),
            duration_secs: secs,
            provider: "edge_tts".into(),
            voice: "en-US-GuyNeural".into(),
        }
    }

    fn assets(total_ms: u64, n: usize) -> Vec<VisualAsset> {
        partition_duration(total_ms, n)
            .into_iter()
            .enumerate()
            .map(|(index, slice)| VisualAsset {
                index,
                image_path: PathBuf::from(format!("/tmp/run/segment_{:03}.png", index)),
                slice,
                caption: format!("{}/{}", index + 1, n),
                placeholder: false,
            })
            .collect()
    }

    #[test]
    fn test_three_segment_graph() {
        let timeline = Timeline::plan(
            assets(12_000, 3),
            &narration(12.0),
            Some(TitleOverlay::new("Deep Sea Secrets")),
        )
        .unwrap();

        let graph = timeline.filter_graph();
        assert_eq!(graph.matches("xfade=").count(), 2);
        assert!(graph.contains("offset=4.000"));
        assert!(graph.contains("offset=8.000"));
        assert!(graph.contains("fade=t=in:st=0"));
        assert!(graph.contains("fade=t=out:st=11.500:d=0.500"));
        assert!(graph.contains("drawtext="));
        assert!(graph.contains("borderw=5"));
        assert!(graph.contains("scale=1080:1920"));
        assert!(graph.ends_with("[vout]"));
    }

    #[test]
    fn test_offsets_equal_segment_starts() {
        let timeline = Timeline::plan(assets(10_000, 3), &narration(10.0), None).unwrap();
        let starts: Vec<f64> = timeline.segments[1..]
            .iter()
            .map(|s| s.asset.start_time())
            .collect();
        assert_eq!(timeline.xfade_offsets(), starts);
        assert_eq!(starts, vec![3.333, 6.666]);
    }

    #[test]
    fn test_chained_length_matches_narration() {
        let timeline = Timeline::plan(assets(10_000, 4), &narration(10.0), None).unwrap();
        let inputs: f64 = timeline.segments.iter().map(|s| s.input_secs).sum();
        let overlaps = timeline.crossfade_secs * (timeline.segments.len() - 1) as f64;
        assert!((inputs - overlaps - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_transitions() {
        let timeline = Timeline::plan(assets(9_000, 3), &narration(9.0), None).unwrap();
        assert!(matches!(
            timeline.segments[0].transition_in,
            Transition::FadeFromBlack { .. }
        ));
        assert!(matches!(
            timeline.segments[1].transition_in,
            Transition::Crossfade { .. }
        ));
        assert!(matches!(
            timeline.segments[2].transition_out,
            Transition::FadeToBlack { .. }
        ));
        assert_eq!(timeline.segments[2].input_secs, 3.0);
        assert_eq!(timeline.segments[0].input_secs, 3.5);
    }

    #[test]
    fn test_single_segment_has_no_xfade() {
        let timeline = Timeline::plan(assets(5_000, 1), &narration(5.0), None).unwrap();
        let graph = timeline.filter_graph();
        assert!(!graph.contains("xfade"));
        assert!(graph.contains("[v0]fade=t=in"));
        assert!(!graph.contains("drawtext"));
    }

    #[test]
    fn test_crossfade_clamped_for_short_segments() {
        let timeline = Timeline::plan(assets(1_200, 4), &narration(1.2), None).unwrap();
        assert!((timeline.crossfade_secs - 0.15).abs() < 1e-9);
        assert_eq!(Transition::Cut.duration(), 0.0);
    }

    #[test]
    fn test_title_lead_window() {
        let title = TitleOverlay::new("Hook").with_lead(Some(3.0));
        let timeline = Timeline::plan(assets(6_000, 2), &narration(6.0), Some(title)).unwrap();
        assert!(timeline
            .filter_graph()
            .contains("enable='between(t,0,3.000)'"));
    }

    #[test]
    fn test_rejects_mismatched_partition() {
        let err = Timeline::plan(assets(9_000, 3), &narration(10.0), None).unwrap_err();
        assert!(matches!(err, MediaError::InvalidTimeline(_)));

        let err = Timeline::plan(Vec::new(), &narration(10.0), None).unwrap_err();
        assert!(matches!(err, MediaError::InvalidTimeline(_)));
    }

    #[test]
    fn test_command_maps_audio_after_images() {
        let timeline = Timeline::plan(assets(6_000, 2), &narration(6.0), None).unwrap();
        let args = timeline.to_command("/tmp/run/final.mp4").build_args();

        assert_eq!(args.iter().filter(|a| *a == "-i").count(), 3);
        assert!(args.contains(&"2:a".to_string()));
        assert!(args.contains(&"[vout]".to_string()));
        assert!(args.contains(&"+faststart".to_string()));
        assert!(args.contains(&"libx264".to_string()));
        let t = args.iter().rposition(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "6.000");
    }
}
