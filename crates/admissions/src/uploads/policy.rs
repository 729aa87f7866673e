use std::collections::BTreeSet;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mime::Mime;
use serde::Deserialize;

use super::signer::SignerError;
use crate::config::{StorageConfig, UploadConfig};

const SHA256_DIGEST_LEN: usize = 32;

/// What the client intends to upload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub filename: String,
    pub mime_type: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Base64 SHA-256 of the file bytes.
    pub checksum: String,
}

/// Reasons an upload credential is refused.
#[derive(Debug, thiserror::Error)]
pub enum UploadRejection {
    #[error("content type {0} is not accepted")]
    UnsupportedType(String),
    #[error("file is empty")]
    EmptyFile,
    #[error("file is {size} bytes, the limit is {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("checksum must be a base64-encoded SHA-256 digest")]
    InvalidChecksum,
    #[error("upload could not be authorized: {0}")]
    Signing(#[from] SignerError),
}

impl UploadRejection {
    /// Stable machine-readable reason for API clients.
    pub fn reason(&self) -> &'static str {
        match self {
            UploadRejection::UnsupportedType(_) => "unsupported_type",
            UploadRejection::EmptyFile => "empty_file",
            UploadRejection::TooLarge { .. } => "too_large",
            UploadRejection::InvalidChecksum => "invalid_checksum",
            UploadRejection::Signing(_) => "signing_failed",
        }
    }
}

/// Request fields after the policy accepted them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedUpload {
    pub content_type: String,
    pub size: u64,
    pub checksum: String,
}

/// Limits applied before any credential is signed.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_types: BTreeSet<String>,
    pub credential_ttl: Duration,
    pub bucket: String,
}

impl UploadPolicy {
    pub fn from_config(uploads: &UploadConfig, storage: &StorageConfig) -> Self {
        Self {
            max_bytes: uploads.max_bytes,
            allowed_types: uploads.allowed_types.clone(),
            credential_ttl: uploads.credential_ttl,
            bucket: storage.bucket.clone(),
        }
    }

    /// Checks type, then size, then checksum; the first failure wins.
    pub fn check(&self, request: &UploadRequest) -> Result<CheckedUpload, UploadRejection> {
        let content_type = request
            .mime_type
            .trim()
            .parse::<Mime>()
            .map(|mime| mime.essence_str().to_ascii_lowercase())
            .map_err(|_| UploadRejection::UnsupportedType(request.mime_type.clone()))?;
        if !self.allowed_types.contains(&content_type) {
            return Err(UploadRejection::UnsupportedType(content_type));
        }

        if request.size == 0 {
            return Err(UploadRejection::EmptyFile);
        }
        if request.size > self.max_bytes {
            return Err(UploadRejection::TooLarge {
                size: request.size,
                max: self.max_bytes,
            });
        }

        let digest = STANDARD
            .decode(request.checksum.trim())
            .map_err(|_| UploadRejection::InvalidChecksum)?;
        if digest.len() != SHA256_DIGEST_LEN {
            return Err(UploadRejection::InvalidChecksum);
        }

        Ok(CheckedUpload {
            content_type,
            size: request.size,
            checksum: STANDARD.encode(digest),
        })
    }
}
