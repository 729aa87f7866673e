//! Application intake, the lifecycle and document-verification state
//! machines, and the staff review surface.
//!
//! Records and status rows are plain data; the rules live in free functions
//! (`status::applicant_edit_transition`, `validation::validate_form`) and in
//! [`AdmissionService`], which composes them over an [`ApplicationRepository`].

pub mod domain;
pub mod edit;
pub mod progress;
pub mod repository;
pub mod router;
pub mod service;
pub mod status;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationForm, ApplicationId, ApplicationPatch, ApplicationSubmission, DocumentKind,
    DocumentReferences, DocumentRound,
};
pub use edit::{ApplicantEdit, AppliedEdit, EditError, EditRejection};
pub use progress::{ApplicationProgress, DocumentProgress, RequiredDocument};
pub use repository::{ApplicationRecord, ApplicationRepository, ApplicationView};
pub use router::application_router;
pub use service::{AdmissionService, ApplicationServiceError};
pub use status::{
    ApplicationStatus, DocumentStatus, DocumentStatuses, GlobalStatus, StatusPatch, Transition,
};
pub use validation::{FieldError, ValidationErrors};
