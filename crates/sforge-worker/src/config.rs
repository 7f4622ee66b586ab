//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT_DIR: &str = "/app/output";
pub const DEFAULT_TEMP_DIR: &str = "/app/temp";
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";
pub const DEFAULT_SCRIPT_MODEL: &str = "llama3.1:8b";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Finished artifacts
    pub output_dir: PathBuf,
    /// Parent of the per-run temp areas
    pub temp_dir: PathBuf,
    /// Title font; the overlay falls back to the ffmpeg default if missing
    pub font_path: Option<PathBuf>,
    /// Show the title only for the first N seconds
    pub title_lead_secs: Option<f64>,
    /// Drop the baseline speech engine from the chain
    pub disable_gtts: bool,
    /// Ollama server writing topic scripts; templates only when unset
    pub ollama_url: Option<String>,
    pub ollama_model: String,
    /// Whole-invocation timeout
    pub run_timeout: Duration,
    /// Script model, all attempts together
    pub script_timeout: Duration,
    /// Per narration provider attempt
    pub narration_timeout: Duration,
    pub visuals_timeout: Duration,
    pub compose_timeout: Duration,
    pub publish_timeout: Duration,
    /// Upload retries after the first attempt
    pub upload_retries: u32,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            font_path: Some(PathBuf::from(DEFAULT_FONT_PATH)),
            title_lead_secs: None,
            disable_gtts: false,
            ollama_url: None,
            ollama_model: DEFAULT_SCRIPT_MODEL.to_string(),
            run_timeout: Duration::from_secs(900),
            script_timeout: Duration::from_secs(180),
            narration_timeout: Duration::from_secs(120),
            visuals_timeout: Duration::from_secs(60),
            compose_timeout: Duration::from_secs(600),
            publish_timeout: Duration::from_secs(120),
            upload_retries: 2,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let secs = |name: &str, default: Duration| {
            var(name)
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        Self {
            output_dir: var("SFORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            temp_dir: var("SFORGE_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            font_path: var("SFORGE_FONT_PATH")
                .map(PathBuf::from)
                .or(defaults.font_path),
            title_lead_secs: var("SFORGE_TITLE_LEAD_SECS")
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|s| s.is_finite() && *s > 0.0),
            disable_gtts: var("SFORGE_DISABLE_GTTS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            ollama_url: var("SFORGE_OLLAMA_URL").or_else(|| var("OLLAMA_HOST")),
            ollama_model: var("SFORGE_OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            run_timeout: secs("SFORGE_RUN_TIMEOUT_SECS", defaults.run_timeout),
            script_timeout: secs("SFORGE_SCRIPT_TIMEOUT_SECS", defaults.script_timeout),
            narration_timeout: secs("SFORGE_NARRATION_TIMEOUT_SECS", defaults.narration_timeout),
            visuals_timeout: secs("SFORGE_VISUALS_TIMEOUT_SECS", defaults.visuals_timeout),
            compose_timeout: secs("SFORGE_COMPOSE_TIMEOUT_SECS", defaults.compose_timeout),
            publish_timeout: secs("SFORGE_PUBLISH_TIMEOUT_SECS", defaults.publish_timeout),
            upload_retries: defaults.upload_retries,
        }
    }

    /// Create the output and temp directories.
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::create_dir_all(&self.temp_dir).await?;
        Ok(())
    }
}
