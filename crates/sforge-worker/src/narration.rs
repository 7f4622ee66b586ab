//! Narration stage wiring.

use std::path::Path;
use tracing::info;

use sforge_models::{Capabilities, Capability, Script};
use sforge_speech::{Narration, NarrationChain, NarrationProvider, SpeechEngine};

use crate::config::WorkerConfig;
use crate::error::PipelineResult;
use crate::metrics;

/// Production chain: premium engine first when present, then the baseline.
pub fn build_chain(caps: &Capabilities, config: &WorkerConfig) -> NarrationChain<NarrationProvider> {
    let engines = NarrationProvider::chain(
        caps.is_available(Capability::PremiumSpeechEngine),
        caps.is_available(Capability::FallbackSpeechEngine),
    );
    let chain = NarrationChain::new(engines, config.narration_timeout);
    info!("Narration chain: [{}]", chain.provider_names().join(", "));
    chain
}

/// Narrate the script body and record every provider attempt.
pub async fn narrate<E: SpeechEngine>(
    chain: &NarrationChain<E>,
    script: &Script,
    voice: &str,
    work_dir: &Path,
) -> PipelineResult<Narration> {
    match chain.synthesize(&script.body, voice, work_dir).await {
        Ok(narration) => {
            for attempt in &narration.attempts {
                metrics::record_narration_attempt(&attempt.provider, attempt.ok);
            }
            Ok(narration)
        }
        Err(e) => {
            for attempt in e.attempts() {
                metrics::record_narration_attempt(&attempt.provider, attempt.ok);
            }
            Err(e.into())
        }
    }
}
