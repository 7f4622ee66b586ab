//! Artifact publication.
//!
//! Publication never fails a run: any storage problem degrades the result to
//! the local artifact path plus a warning.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use sforge_models::{Capabilities, Capability, RunId, UploadResult, VideoArtifact};
use sforge_storage::{
    output_key, B2Client, PresignedUrl, StorageError, StorageResult, DEFAULT_PRESIGN_EXPIRY,
};

use crate::config::WorkerConfig;
use crate::retry::{retry_async, RetryConfig};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Object storage the publisher writes to.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn upload(&self, path: &Path, key: &str) -> StorageResult<u64>;

    async fn sign(&self, key: &str, expires_in: Duration) -> StorageResult<PresignedUrl>;

    async fn remove(&self, key: &str) -> StorageResult<()>;

    fn name(&self) -> &'static str;
}

#[async_trait]
impl PublishSink for B2Client {
    async fn upload(&self, path: &Path, key: &str) -> StorageResult<u64> {
        self.upload_file(path, key, VIDEO_CONTENT_TYPE).await
    }

    async fn sign(&self, key: &str, expires_in: Duration) -> StorageResult<PresignedUrl> {
        self.presign_get(key, expires_in).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.delete_object(key).await
    }

    fn name(&self) -> &'static str {
        "b2"
    }
}

/// Publication outcome plus the non-fatal problem that caused degradation.
#[derive(Debug, Clone)]
pub struct Publication {
    pub result: UploadResult,
    pub warning: Option<String>,
}

impl Publication {
    pub fn degraded(local_path: &Path, reason: impl Into<String>) -> Self {
        Self {
            result: UploadResult::Local {
                local_path: local_path.to_path_buf(),
            },
            warning: Some(reason.into()),
        }
    }
}

#[derive(Clone)]
pub struct Publisher {
    sink: Option<Arc<dyn PublishSink>>,
    retry: RetryConfig,
    expiry: Duration,
}

impl Publisher {
    pub fn new(sink: Option<Arc<dyn PublishSink>>) -> Self {
        Self {
            sink,
            retry: RetryConfig::new("artifact upload"),
            expiry: DEFAULT_PRESIGN_EXPIRY,
        }
    }

    /// Storage-backed publisher when the sink capability is present.
    pub fn from_capabilities(caps: &Capabilities, config: &WorkerConfig) -> Self {
        let sink: Option<Arc<dyn PublishSink>> = if caps.is_available(Capability::StorageSink) {
            match B2Client::from_env() {
                Ok(client) => Some(Arc::new(client) as Arc<dyn PublishSink>),
                Err(e) => {
                    warn!("Storage sink configured but unusable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self::new(sink).with_retry(RetryConfig::new("artifact upload").with_max_retries(config.upload_retries))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    /// Upload and sign, or fall back to the local path.
    pub async fn publish(&self, artifact: &VideoArtifact, run_id: &RunId) -> Publication {
        let Some(sink) = &self.sink else {
            return Publication::degraded(&artifact.path, "storage sink unavailable");
        };

        let key = match output_key(run_id.as_str(), &artifact.file_name()) {
            Ok(key) => key,
            Err(e) => return Publication::degraded(&artifact.path, e.to_string()),
        };

        let uploaded = retry_async(&self.retry, StorageError::is_retryable, || {
            sink.upload(&artifact.path, &key)
        })
        .await;
        let attempts = uploaded.attempts();
        if let Err(e) = uploaded.into_result() {
            return Publication::degraded(
                &artifact.path,
                format!("upload to {} failed after {} attempt(s): {}", sink.name(), attempts, e),
            );
        }

        match sink.sign(&key, self.expiry).await {
            Ok(signed) => {
                info!(key = %key, expires_at = %signed.expires_at, "Artifact published");
                Publication {
                    result: UploadResult::Remote {
                        url: signed.url,
                        expires_at: signed.expires_at,
                        key,
                    },
                    warning: None,
                }
            }
            Err(e) => {
                if let Err(cleanup) = sink.remove(&key).await {
                    warn!(key = %key, "Failed to remove unsigned object: {}", cleanup);
                }
                Publication::degraded(&artifact.path, format!("signing failed: {}", e))
            }
        }
    }
}
