//! Run metrics.
//!
//! Recorded through the `metrics` facade; without an installed recorder the
//! calls are no-ops.

use metrics::{counter, histogram};

use sforge_models::PipelineStage;

/// Metric names as constants for consistency.
pub mod names {
    pub const STAGE_DURATION_SECONDS: &str = "sforge_stage_duration_seconds";
    pub const RUNS_TOTAL: &str = "sforge_runs_total";
    pub const NARRATION_ATTEMPTS_TOTAL: &str = "sforge_narration_attempts_total";
}

/// Record how long a stage took.
pub fn record_stage_duration(stage: PipelineStage, duration_secs: f64) {
    let labels = [("stage", stage.as_str().to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a finished run. `outcome` is `success`, `degraded`, `health` or an error kind.
pub fn record_run(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::RUNS_TOTAL, &labels).increment(1);
}

/// Record one narration provider attempt.
pub fn record_narration_attempt(provider: &str, ok: bool) {
    let labels = [
        ("provider", provider.to_string()),
        ("ok", ok.to_string()),
    ];
    counter!(names::NARRATION_ATTEMPTS_TOTAL, &labels).increment(1);
}
