//! Startup capability probe.

use tracing::{info, warn};

use sforge_media::{check_ffmpeg, check_ffprobe};
use sforge_models::{Capabilities, Capability};
use sforge_speech::EdgeTtsEngine;
use sforge_storage::B2Config;

use crate::config::WorkerConfig;

/// Probe optional subsystems once. The result is never re-probed.
pub fn probe_capabilities(config: &WorkerConfig) -> Capabilities {
    let compositing = match check_ffmpeg().and_then(|_| check_ffprobe()) {
        Ok(_) => true,
        Err(e) => {
            warn!("Compositing engine unavailable: {}", e);
            false
        }
    };

    let caps = Capabilities::none()
        .with(Capability::CompositingEngine, compositing)
        .with(Capability::ImageLibrary, true)
        .with(
            Capability::PremiumSpeechEngine,
            EdgeTtsEngine::new().is_available(),
        )
        .with(Capability::FallbackSpeechEngine, !config.disable_gtts)
        .with(Capability::StorageSink, B2Config::is_configured())
        .with(Capability::ScriptModel, config.ollama_url.is_some());

    let summary: Vec<String> = caps
        .entries()
        .into_iter()
        .map(|(cap, available)| format!("{}={}", cap, available))
        .collect();
    info!("Capabilities: {}", summary.join(", "));

    caps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_library_always_present() {
        let caps = probe_capabilities(&WorkerConfig::default());
        assert!(caps.is_available(Capability::ImageLibrary));
    }

    #[test]
    fn test_disabled_baseline_engine() {
        let config = WorkerConfig {
            disable_gtts: true,
            ..WorkerConfig::default()
        };
        let caps = probe_capabilities(&config);
        assert!(!caps.is_available(Capability::FallbackSpeechEngine));
    }

    #[test]
    fn test_script_model_follows_config() {
        assert!(!probe_capabilities(&WorkerConfig::default()).is_available(Capability::ScriptModel));

        let config = WorkerConfig {
            ollama_url: Some("http://localhost:11434".into()),
            ..WorkerConfig::default()
        };
        assert!(probe_capabilities(&config).is_available(Capability::ScriptModel));
    }
}
