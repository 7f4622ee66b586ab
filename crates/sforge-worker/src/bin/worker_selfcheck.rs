//! Deployment self-check: directories, compositing tools, speech engines, storage.

use anyhow::Context;

use sforge_media::{check_ffmpeg, check_ffprobe};
use sforge_models::Capability;
use sforge_storage::{B2Client, B2Config};
use sforge_worker::{probe_capabilities, WorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls crypto provider"))?;
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env();
    println!(
        "worker-selfcheck: starting with output_dir={} temp_dir={}",
        config.output_dir.display(),
        config.temp_dir.display()
    );

    config
        .ensure_dirs()
        .await
        .context("failed to create output/temp directories")?;

    let ffmpeg = check_ffmpeg().context("ffmpeg not available")?;
    let ffprobe = check_ffprobe().context("ffprobe not available")?;
    println!("worker-selfcheck: ffmpeg={} ffprobe={}", ffmpeg.display(), ffprobe.display());

    let caps = probe_capabilities(&config);
    for (capability, available) in caps.entries() {
        println!(
            "worker-selfcheck: {:<24} {}",
            capability.to_string(),
            if available { "available" } else { "missing" }
        );
    }

    if !caps.is_available(Capability::PremiumSpeechEngine)
        && !caps.is_available(Capability::FallbackSpeechEngine)
    {
        anyhow::bail!("no narration provider is available");
    }

    if caps.is_available(Capability::StorageSink) {
        let client = B2Client::new(B2Config::from_env()?);
        client
            .check_connectivity()
            .await
            .with_context(|| format!("bucket {} unreachable", client.bucket()))?;
        println!("worker-selfcheck: bucket {} reachable", client.bucket());
    } else {
        println!("worker-selfcheck: storage not configured, results will be local only");
    }

    println!("worker-selfcheck: ok");
    Ok(())
}
