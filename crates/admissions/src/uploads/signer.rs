//! Presigning seam. The S3 implementation never talks to the bucket: it
//! only signs a request the client will send itself.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use secrecy::ExposeSecret;
use tracing::info;

use crate::config::StorageConfig;

/// Metadata key binding an uploaded object to its applicant.
pub const APPLICANT_METADATA_KEY: &str = "applicant-id";

/// Everything a single-object write capability is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadGrant {
    pub bucket: String,
    pub object_key: String,
    pub content_type: String,
    pub content_length: u64,
    pub checksum_sha256: String,
    pub applicant_id: String,
    pub expires_in: Duration,
}

/// A signed request the client replays verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUpload {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("invalid expiry: {0}")]
    Expiry(String),
    #[error("presigning failed: {0}")]
    Presign(String),
}

#[async_trait]
pub trait UploadSigner: Send + Sync {
    async fn presign_put(&self, grant: &UploadGrant) -> Result<PresignedUpload, SignerError>;
}

/// Presigns `PUT` requests against S3 or an S3-compatible store.
#[derive(Clone)]
pub struct S3UploadSigner {
    client: Client,
}

impl S3UploadSigner {
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            config.secret_key.expose_secret(),
            None,
            None,
            "admissions",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            bucket = %config.bucket,
            region = %config.region,
            custom_endpoint = config.endpoint.is_some(),
            "upload signer configured"
        );
        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl UploadSigner for S3UploadSigner {
    async fn presign_put(&self, grant: &UploadGrant) -> Result<PresignedUpload, SignerError> {
        let presigning = PresigningConfig::expires_in(grant.expires_in)
            .map_err(|err| SignerError::Expiry(err.to_string()))?;
        let content_length = i64::try_from(grant.content_length)
            .map_err(|_| SignerError::Presign("content length out of range".to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&grant.bucket)
            .key(&grant.object_key)
            .content_type(&grant.content_type)
            .content_length(content_length)
            .checksum_sha256(&grant.checksum_sha256)
            .metadata(APPLICANT_METADATA_KEY, &grant.applicant_id)
            .presigned(presigning)
            .await
            .map_err(|err| SignerError::Presign(err.to_string()))?;

        Ok(PresignedUpload {
            method: request.method().to_string(),
            url: request.uri().to_string(),
            headers: request
                .headers()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        })
    }
}
