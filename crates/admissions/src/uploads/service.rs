use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::policy::{UploadPolicy, UploadRejection, UploadRequest};
use super::signer::{UploadGrant, UploadSigner};
use crate::identity::ApplicantId;

const FALLBACK_FILENAME: &str = "upload";

/// Write-once capability handed to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCredential {
    pub url: String,
    pub method: String,
    pub object_key: String,
    /// Headers the client must send unchanged with the upload.
    pub headers: BTreeMap<String, String>,
    pub expires_at: DateTime<Utc>,
}

/// Issues short-lived upload credentials. Stateless; never confirms that an
/// upload actually happened.
pub struct UploadAuthorizationService<G> {
    policy: UploadPolicy,
    signer: Arc<G>,
}

impl<G> UploadAuthorizationService<G>
where
    G: UploadSigner + 'static,
{
    pub fn new(policy: UploadPolicy, signer: Arc<G>) -> Self {
        Self { policy, signer }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub async fn authorize(
        &self,
        applicant: &ApplicantId,
        request: UploadRequest,
    ) -> Result<UploadCredential, UploadRejection> {
        let checked = match self.policy.check(&request) {
            Ok(checked) => checked,
            Err(rejection) => {
                warn!(
                    applicant_id = %applicant,
                    mime_type = %request.mime_type,
                    size = request.size,
                    reason = rejection.reason(),
                    "upload rejected"
                );
                return Err(rejection);
            }
        };

        let grant = UploadGrant {
            bucket: self.policy.bucket.clone(),
            object_key: object_key(applicant, &request.filename),
            content_type: checked.content_type,
            content_length: checked.size,
            checksum_sha256: checked.checksum,
            applicant_id: applicant.to_string(),
            expires_in: self.policy.credential_ttl,
        };

        let issued_at = Utc::now();
        let presigned = self.signer.presign_put(&grant).await.map_err(|err| {
            warn!(applicant_id = %applicant, error = %err, "upload signing failed");
            UploadRejection::Signing(err)
        })?;
        let ttl = chrono::Duration::from_std(grant.expires_in).unwrap_or(chrono::Duration::zero());

        info!(
            applicant_id = %applicant,
            object_key = %grant.object_key,
            content_type = %grant.content_type,
            size = grant.content_length,
            "upload credential issued"
        );
        Ok(UploadCredential {
            url: presigned.url,
            method: presigned.method,
            object_key: grant.object_key,
            headers: presigned.headers,
            expires_at: issued_at + ttl,
        })
    }
}

/// `<applicant-id>/<uuid>-<filename>`, so keys never collide and always
/// carry their owner.
pub fn object_key(applicant: &ApplicantId, filename: &str) -> String {
    format!("{applicant}/{}-{}", Uuid::new_v4(), sanitize_filename(filename))
}

pub(crate) fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uploads::signer::{PresignedUpload, SignerError};
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use sha2::{Digest, Sha256};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSigner {
        grants: Mutex<Vec<UploadGrant>>,
    }

    #[async_trait]
    impl UploadSigner for RecordingSigner {
        async fn presign_put(&self, grant: &UploadGrant) -> Result<PresignedUpload, SignerError> {
            self.grants
                .lock()
                .expect("grant mutex poisoned")
                .push(grant.clone());
            Ok(PresignedUpload {
                method: "PUT".to_string(),
                url: format!("https://storage.test/{}/{}", grant.bucket, grant.object_key),
                headers: BTreeMap::from([(
                    "content-type".to_string(),
                    grant.content_type.clone(),
                )]),
            })
        }
    }

    struct FailingSigner;

    #[async_trait]
    impl UploadSigner for FailingSigner {
        async fn presign_put(&self, _grant: &UploadGrant) -> Result<PresignedUpload, SignerError> {
            Err(SignerError::Presign("credentials expired".to_string()))
        }
    }

    fn policy() -> UploadPolicy {
        UploadPolicy {
            max_bytes: 3 * 1024 * 1024,
            allowed_types: ["image/jpeg", "image/png", "application/pdf"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            credential_ttl: Duration::from_secs(60),
            bucket: "admissions-documents".to_string(),
        }
    }

    fn request(mime_type: &str, size: u64) -> UploadRequest {
        UploadRequest {
            filename: "bulletin scolaire (T1).pdf".to_string(),
            mime_type: mime_type.to_string(),
            size,
            checksum: STANDARD.encode(Sha256::digest(b"%PDF-1.7 grades")),
        }
    }

    #[tokio::test]
    async fn issues_credential_scoped_to_applicant() {
        let signer = Arc::new(RecordingSigner::default());
        let service = UploadAuthorizationService::new(policy(), signer.clone());
        let applicant = ApplicantId::generate();

        let before = Utc::now();
        let credential = service
            .authorize(&applicant, request("application/pdf", 2 * 1024 * 1024))
            .await
            .expect("credential issued");

        assert_eq!(credential.method, "PUT");
        assert!(credential
            .object_key
            .starts_with(&format!("{applicant}/")));
        assert!(credential
            .object_key
            .ends_with("-bulletin_scolaire__T1_.pdf"));
        let ttl = credential.expires_at - before;
        assert!(ttl <= chrono::Duration::seconds(61) && ttl >= chrono::Duration::seconds(59));

        let grants = signer.grants.lock().expect("grant mutex poisoned");
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].applicant_id, applicant.to_string());
        assert_eq!(grants[0].content_length, 2 * 1024 * 1024);
        assert_eq!(grants[0].expires_in, Duration::from_secs(60));
        assert_eq!(grants[0].object_key, credential.object_key);
    }

    #[tokio::test]
    async fn rejected_requests_never_reach_the_signer() {
        let signer = Arc::new(RecordingSigner::default());
        let service = UploadAuthorizationService::new(policy(), signer.clone());
        let applicant = ApplicantId::generate();

        let oversized = service
            .authorize(&applicant, request("image/jpeg", 5 * 1024 * 1024))
            .await;
        assert!(matches!(oversized, Err(UploadRejection::TooLarge { .. })));

        let wrong_type = service
            .authorize(&applicant, request("application/x-msdownload", 1024))
            .await;
        assert!(matches!(wrong_type, Err(UploadRejection::UnsupportedType(_))));

        assert!(signer.grants.lock().expect("grant mutex poisoned").is_empty());
    }

    #[tokio::test]
    async fn signing_failures_become_rejections() {
        let service = UploadAuthorizationService::new(policy(), Arc::new(FailingSigner));
        let rejection = service
            .authorize(&ApplicantId::generate(), request("image/png", 1024))
            .await
            .expect_err("signing fails");
        assert_eq!(rejection.reason(), "signing_failed");
    }

    #[test]
    fn keys_are_unique_per_call() {
        let applicant = ApplicantId::generate();
        assert_ne!(
            object_key(&applicant, "id.png"),
            object_key(&applicant, "id.png")
        );
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\scans\\carte identité.jpg"), "carte_identit_.jpg");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename("   "), "upload");
    }
}
