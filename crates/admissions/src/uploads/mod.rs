//! Upload authorization: validates what a client intends to upload and
//! hands back a presigned, single-object write credential. The resulting
//! object key is written into an application by the application update path.

pub mod policy;
pub mod router;
pub mod service;
pub mod signer;

pub use policy::{CheckedUpload, UploadPolicy, UploadRejection, UploadRequest};
pub use router::upload_router;
pub use service::{object_key, UploadAuthorizationService, UploadCredential};
pub use signer::{
    PresignedUpload, S3UploadSigner, SignerError, UploadGrant, UploadSigner,
    APPLICANT_METADATA_KEY,
};
