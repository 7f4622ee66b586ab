//! StoryForge worker binary.
//!
//! Reads one request envelope (`{"input": {...}}`) from the file given as the
//! first argument, or from stdin, and prints exactly one JSON response on stdout.

use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use sforge_models::{ErrorKind, ErrorResponse, PipelineStage, RequestEnvelope, WorkerResponse};
use sforge_worker::{init_tracing, probe_capabilities, Pipeline, WorkerConfig};

#[tokio::main]
async fn main() -> ExitCode {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    dotenvy::dotenv().ok();
    init_tracing();

    let response = match read_input(std::env::args().nth(1)).await {
        Ok(raw) => handle(&raw).await,
        Err(e) => input_error(format!("failed to read request: {}", e)),
    };

    let json = response.to_json().unwrap_or_else(|e| {
        format!(
            r#"{{"status":"error","error":"RenderError","message":"failed to encode response: {}"}}"#,
            e.to_string().replace('"', "'")
        )
    });
    println!("{}", json);

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn handle(raw: &str) -> WorkerResponse {
    let envelope = match RequestEnvelope::from_json(raw) {
        Ok(envelope) => envelope,
        Err(e) => return input_error(e.to_string()),
    };

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);
    if let Err(e) = config.ensure_dirs().await {
        warn!("Failed to create output/temp directories: {}", e);
    }

    let caps = probe_capabilities(&config);
    Pipeline::new(config, caps).run(&envelope.input).await
}

async fn read_input(path: Option<String>) -> std::io::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path).await,
        None => {
            let mut raw = String::new();
            tokio::io::stdin().read_to_string(&mut raw).await?;
            Ok(raw)
        }
    }
}

fn input_error(message: String) -> WorkerResponse {
    WorkerResponse::Error(ErrorResponse::new(
        ErrorKind::InputError,
        message,
        Some(PipelineStage::Validating),
    ))
}
