//! Visual segment model and time partitioning.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Half-open time range `[start_ms, end_ms)` of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimeSlice {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TimeSlice {
    pub fn duration_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }

    pub fn start_secs(&self) -> f64 {
        self.start_ms as f64 / 1000.0
    }

    pub fn end_secs(&self) -> f64 {
        self.end_ms as f64 / 1000.0
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_ms() as f64 / 1000.0
    }
}

/// Split `total_ms` into `count` contiguous equal slices.
///
/// Every slice gets `total_ms / count`; the last one also takes the remainder,
/// so the slices always sum to `total_ms`.
pub fn partition_duration(total_ms: u64, count: usize) -> Vec<TimeSlice> {
    if count == 0 {
        return Vec::new();
    }

    let slice = total_ms / count as u64;
    (0..count)
        .map(|i| {
            let start_ms = slice * i as u64;
            let end_ms = if i + 1 == count {
                total_ms
            } else {
                start_ms + slice
            };
            TimeSlice { start_ms, end_ms }
        })
        .collect()
}

/// One generated image segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VisualAsset {
    /// Position in the timeline (0-based)
    pub index: usize,
    /// PNG inside the run's temp area
    pub image_path: PathBuf,
    pub slice: TimeSlice,
    /// Overlay caption rendered on the image
    pub caption: String,
    /// True when the gradient failed and a solid placeholder was used
    pub placeholder: bool,
}

impl VisualAsset {
    pub fn start_time(&self) -> f64 {
        self.slice.start_secs()
    }

    pub fn end_time(&self) -> f64 {
        self.slice.end_secs()
    }

    pub fn duration(&self) -> f64 {
        self.slice.duration_secs()
    }
}
