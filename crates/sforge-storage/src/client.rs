//! B2 client over the S3-compatible API.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Region used when neither `B2_REGION` nor the endpoint names one.
pub const DEFAULT_REGION: &str = "us-west-004";

/// Lifetime of presigned download URLs.
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

const ENV_KEY_ID: &str = "B2_KEY_ID";
const ENV_APPLICATION_KEY: &str = "B2_APPLICATION_KEY";
const ENV_BUCKET_NAME: &str = "B2_BUCKET_NAME";
const ENV_ENDPOINT_URL: &str = "B2_ENDPOINT_URL";
const ENV_REGION: &str = "B2_REGION";

/// Configuration for the B2 client.
#[derive(Clone)]
pub struct B2Config {
    /// S3 API endpoint, e.g. `https://s3.us-west-004.backblazeb2.com`
    pub endpoint_url: String,
    /// Application key ID
    pub key_id: String,
    /// Application key
    pub application_key: String,
    pub bucket_name: String,
    pub region: String,
}

impl std::fmt::Debug for B2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("B2Config")
            .field("endpoint_url", &self.endpoint_url)
            .field("key_id", &self.key_id)
            .field("application_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .field("region", &self.region)
            .finish()
    }
}

impl B2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Whether every required variable is set and non-empty.
    pub fn is_configured() -> bool {
        Self::from_env().is_ok()
    }

    /// Build config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StorageResult<Self> {
        let require = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| StorageError::config_error(format!("{} not set", name)))
        };

        let endpoint_url = normalize_endpoint(&require(ENV_ENDPOINT_URL)?);
        let region = lookup(ENV_REGION)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| region_from_endpoint(&endpoint_url))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            key_id: require(ENV_KEY_ID)?,
            application_key: require(ENV_APPLICATION_KEY)?,
            bucket_name: require(ENV_BUCKET_NAME)?,
            endpoint_url,
            region,
        })
    }
}

fn normalize_endpoint(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

/// `https://s3.<region>.backblazeb2.com` -> `<region>`
fn region_from_endpoint(endpoint: &str) -> Option<String> {
    let host = endpoint.split("://").nth(1)?.split('/').next()?;
    let rest = host.strip_prefix("s3.")?;
    let region = rest.strip_suffix(".backblazeb2.com")?;
    (!region.is_empty()).then(|| region.to_string())
}

/// A presigned GET URL and the moment it stops working.
#[derive(Debug, Clone)]
pub struct PresignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Backblaze B2 storage client.
#[derive(Clone)]
pub struct B2Client {
    client: Client,
    bucket: String,
}

impl B2Client {
    /// Create a new client from configuration.
    pub fn new(config: B2Config) -> Self {
        let credentials = Credentials::new(
            &config.key_id,
            &config.application_key,
            None,
            None,
            "b2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(B2Config::from_env()?))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a file. Returns the number of bytes sent.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<u64> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path).await?.len();
        debug!("Uploading {} ({} bytes) to {}", path.display(), size, key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(size)
    }

    /// Generate a presigned URL for GET.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<PresignedUrl> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::presign_failed(e.to_string()))?;
        let expires_at = Utc::now()
            + chrono::Duration::from_std(expires_in)
                .map_err(|e| StorageError::presign_failed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::presign_failed(e.to_string()))?;

        Ok(PresignedUrl {
            url: presigned.uri().to_string(),
            expires_at,
        })
    }

    /// Delete an object.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("B2 connectivity check failed: {}", e)))?;
        Ok(())
    }
}
