//! Backblaze B2 storage client (S3-compatible API).
//!
//! This crate provides:
//! - File upload to a private bucket
//! - Presigned GET URLs with an expiry timestamp
//! - Object key layout for rendered outputs

pub mod client;
pub mod error;
pub mod keys;

pub use client::{B2Client, B2Config, PresignedUrl, DEFAULT_PRESIGN_EXPIRY};
pub use error::{StorageError, StorageResult};
pub use keys::{output_key, OUTPUT_PREFIX};
